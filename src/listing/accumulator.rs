/// Items loaded so far, in arrival order, plus the derived end-of-data flag.
///
/// Records are not deduplicated: if the server's pages overlap, so does the list.
#[derive(Debug, Clone)]
pub struct ListSnapshot<R> {
    items: Vec<R>,
    has_more: bool,
}

impl<R> Default for ListSnapshot<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            has_more: true,
        }
    }
}

impl<R> ListSnapshot<R> {
    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn apply_replace(&mut self, records: Vec<R>, limit: u32) {
        self.has_more = is_full_page(records.len(), limit);
        self.items = records;
    }

    pub fn apply_append(&mut self, records: Vec<R>, limit: u32) {
        self.has_more = is_full_page(records.len(), limit);
        self.items.extend(records);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.has_more = true;
    }
}

/// A page shorter than the limit is the only end-of-data signal.
fn is_full_page(received: usize, limit: u32) -> bool {
    received == limit as usize
}
