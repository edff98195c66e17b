pub const DEFAULT_PAGE_SIZE: usize = 10;

pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

pub fn window<T>(items: &[T], page_size: usize, page_index: usize) -> &[T] {
    if page_size == 0 || page_index == 0 {
        return &[];
    }
    let start = (page_index - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    page_index: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page_index: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn reset(&mut self) {
        self.page_index = 1;
    }

    pub fn prev(&mut self) {
        self.page_index = self.page_index.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, len: usize) {
        let last = total_pages(len, self.page_size).max(1);
        self.page_index = (self.page_index + 1).min(last);
    }

    pub fn effective_page(&self, len: usize) -> usize {
        let last = total_pages(len, self.page_size).max(1);
        self.page_index.clamp(1, last)
    }

    pub fn view<T: Clone>(&self, items: &[T]) -> PageView<T> {
        let page_index = self.effective_page(items.len());
        PageView {
            rows: window(items, self.page_size, page_index).to_vec(),
            page_index,
            page_size: self.page_size,
            total_pages: total_pages(items.len(), self.page_size),
            total_len: items.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T> {
    pub rows: Vec<T>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_len: usize,
}

impl<T> PageView<T> {
    pub fn is_empty_state(&self) -> bool {
        self.total_len == 0
    }

    pub fn has_pagination(&self) -> bool {
        self.total_len > self.page_size
    }

    pub fn has_prev(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }

    pub fn range_label(&self) -> Option<String> {
        if self.is_empty_state() {
            return None;
        }
        let first = (self.page_index - 1) * self.page_size + 1;
        let last = (self.page_index * self.page_size).min(self.total_len);
        Some(format!(
            "Showing {first} to {last} of {} entries",
            self.total_len
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(len: usize) -> Vec<usize> {
        (1..=len).collect()
    }

    #[test]
    fn twenty_five_items_split_into_three_pages() {
        let items = numbers(25);
        assert_eq!(total_pages(items.len(), 10), 3);
        assert_eq!(window(&items, 10, 1), &numbers(10)[..]);
        assert_eq!(window(&items, 10, 2), &(11..=20).collect::<Vec<_>>()[..]);
        assert_eq!(window(&items, 10, 3), &[21, 22, 23, 24, 25]);
        assert!(window(&items, 10, 4).is_empty());
    }

    #[test]
    fn window_never_leaves_bounds() {
        for len in [0usize, 1, 9, 10, 11, 37] {
            let items = numbers(len);
            for page_size in 1..=12 {
                assert_eq!(total_pages(len, page_size), len.div_ceil(page_size));
                let mut seen = 0;
                for page in 0..=total_pages(len, page_size) + 2 {
                    let slice = window(&items, page_size, page);
                    assert!(slice.len() <= page_size);
                    assert!(slice.iter().all(|item| (1..=len).contains(item)));
                    seen += slice.len();
                }
                assert_eq!(seen, len);
            }
        }
    }

    #[test]
    fn empty_result_set_renders_empty_state() {
        let view = Pagination::default().view::<usize>(&[]);
        assert_eq!(view.total_pages, 0);
        assert!(view.is_empty_state());
        assert!(view.rows.is_empty());
        assert_eq!(view.range_label(), None);
        assert!(!view.has_next());
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let items = numbers(25);
        let mut pagination = Pagination::new(10);
        pagination.prev();
        assert_eq!(pagination.page_index(), 1);
        for _ in 0..5 {
            pagination.next(items.len());
        }
        assert_eq!(pagination.page_index(), 3);

        let view = pagination.view(&items);
        assert_eq!(view.range_label().as_deref(), Some("Showing 21 to 25 of 25 entries"));
        assert!(view.has_pagination());
        assert!(view.has_prev());
        assert!(!view.has_next());
    }

    #[test]
    fn stale_page_index_is_clipped_when_rendering() {
        let mut pagination = Pagination::new(10);
        pagination.next(30);
        pagination.next(30);
        assert_eq!(pagination.page_index(), 3);

        let view = pagination.view(&numbers(4));
        assert_eq!(view.page_index, 1);
        assert_eq!(view.rows, numbers(4));
        assert!(!view.has_pagination());
    }
}
