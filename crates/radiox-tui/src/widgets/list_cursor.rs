//! Selection + scroll offset over a list of rows the caller renders.

#[derive(Debug, Default, Clone)]
pub struct ListCursor {
    len: usize,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl ListCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// New row count.  Keeps the selection where it was if it still fits.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        if self.scroll_offset > self.selected {
            self.scroll_offset = self.selected;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn selected(&self) -> Option<usize> {
        (self.selected < self.len).then_some(self.selected)
    }

    pub fn reset(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.len == 0 {
            return;
        }
        self.selected = (self.selected + n).min(self.len - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.len.saturating_sub(1);
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// Row indices drawn in a viewport of `height` rows.
    pub fn visible_range(&self, height: usize) -> std::ops::Range<usize> {
        let end = (self.scroll_offset + height).min(self.len);
        self.scroll_offset.min(end)..end
    }

    /// Select the row at viewport line `row`.  Returns true if it exists.
    pub fn click(&mut self, row: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < self.len {
            self.selected = target;
            return true;
        }
        false
    }
}
