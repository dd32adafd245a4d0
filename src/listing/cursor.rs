/// Page/limit pair sent to a read endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// The request every replace load starts from.
    pub fn first(limit: u32) -> Self {
        Self { page: 1, limit }
    }
}

/// Tracks the last page consumed by a list and the fixed page size.
///
/// The page number only moves forward during a sequence: `advance` after a
/// successful continuation, `reset` back to 1 after a successful replace.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page: u32,
    limit: u32,
}

impl PageCursor {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Request for the page after the last consumed one.
    pub fn next(&self) -> PageRequest {
        PageRequest {
            page: self.page.saturating_add(1),
            limit: self.limit,
        }
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn advance(&mut self) {
        self.page = self.page.saturating_add(1);
    }
}
