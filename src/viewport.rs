use crate::listing::ScrollMetrics;

/// Selection and scroll window of a list region.
///
/// The window follows the selection when it moves; mouse-wheel scrolling
/// moves the window and drags the selection along only when it falls out
/// of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListView {
    pub selected: usize,
    pub offset: usize,
    pub height: usize,
}

impl ListView {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    pub fn set_height(&mut self, height: usize, len: usize) {
        self.height = height;
        self.clamp(len);
    }

    pub fn up(&mut self, by: usize, len: usize) {
        self.selected = self.selected.saturating_sub(by);
        self.follow(len);
    }

    pub fn down(&mut self, by: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + by).min(len - 1);
        self.follow(len);
    }

    pub fn top(&mut self, len: usize) {
        self.selected = 0;
        self.follow(len);
    }

    pub fn bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
        self.follow(len);
    }

    /// Move the window by `delta` rows.
    pub fn scroll(&mut self, delta: i16, len: usize) {
        let step = usize::from(delta.unsigned_abs());
        self.offset = if delta < 0 {
            self.offset.saturating_sub(step)
        } else {
            self.offset + step
        };
        self.offset = self.offset.min(self.max_offset(len));
        if self.height > 0 {
            self.selected = self
                .selected
                .clamp(self.offset, self.offset + self.height - 1);
        }
        self.clamp(len);
    }

    pub fn reset(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    pub fn metrics(&self, len: usize) -> ScrollMetrics {
        ScrollMetrics {
            content_len: len,
            offset: self.offset,
            viewport_len: self.height,
        }
    }

    fn max_offset(&self, len: usize) -> usize {
        len.saturating_sub(self.height)
    }

    fn follow(&mut self, len: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.height > 0 && self.selected >= self.offset + self.height {
            self.offset = self.selected + 1 - self.height;
        }
        self.clamp(len);
    }

    fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.offset = self.offset.min(self.max_offset(len));
    }
}
