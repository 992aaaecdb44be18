//! Page-number pagination over the post listing.

/// Number of posts fetched per listing page.
pub const PAGE_SIZE: u32 = 6;

/// Total pages needed for `total_count` records.
pub fn total_pages(total_count: u64) -> u32 {
    let pages = total_count.div_ceil(u64::from(PAGE_SIZE));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Zero-based inclusive row range for a 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub offset: u64,
    pub limit: u64,
}

impl RowRange {
    pub fn for_page(page: u32) -> Self {
        let page = u64::from(page.max(1));
        let limit = u64::from(PAGE_SIZE);
        Self {
            offset: (page - 1) * limit,
            limit,
        }
    }

    /// Inclusive last row index, as used by `Range` headers.
    pub fn last(&self) -> u64 {
        self.offset + self.limit.saturating_sub(1)
    }
}

/// Current page and page count for a listing.
///
/// Page changes outside `[1, total_pages]` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current: u32,
    total_pages: u32,
}

impl PageCursor {
    pub fn new(total_count: u64) -> Self {
        Self {
            current: 1,
            total_pages: total_pages(total_count),
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn contains(&self, page: u32) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    /// Move to `page` when it is in range. Returns whether the request was accepted.
    pub fn request(&mut self, page: u32) -> bool {
        if !self.contains(page) {
            return false;
        }
        self.current = page;
        true
    }

    /// Recompute the page count, keeping the current page within bounds.
    pub fn set_total(&mut self, total_count: u64) {
        self.total_pages = total_pages(total_count);
        self.current = self.current.clamp(1, self.total_pages.max(1));
    }

    pub fn previous(&self) -> Option<u32> {
        (self.current > 1).then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<u32> {
        (self.current < self.total_pages).then(|| self.current + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_records_make_three_pages() {
        assert_eq!(total_pages(13), 3);
        assert_eq!(total_pages(12), 2);
        assert_eq!(total_pages(0), 0);
    }

    #[test]
    fn row_ranges_follow_page_size() {
        let first = RowRange::for_page(1);
        assert_eq!((first.offset, first.last()), (0, 5));
        let third = RowRange::for_page(3);
        assert_eq!((third.offset, third.last()), (12, 17));
        assert_eq!(RowRange::for_page(0), first);
    }

    #[test]
    fn out_of_range_requests_are_noops() {
        let mut cursor = PageCursor::new(13);
        assert!(cursor.request(3));
        assert!(!cursor.request(4));
        assert_eq!(cursor.current(), 3);
        assert!(!cursor.request(0));
        assert_eq!(cursor.current(), 3);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.previous(), Some(2));
    }

    #[test]
    fn empty_listing_stays_on_first_page() {
        let mut cursor = PageCursor::new(0);
        assert!(!cursor.request(1));
        assert_eq!(cursor.current(), 1);
        assert_eq!(cursor.total_pages(), 0);
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn shrinking_total_clamps_current_page() {
        let mut cursor = PageCursor::new(13);
        cursor.request(3);
        cursor.set_total(12);
        assert_eq!(cursor.current(), 2);
        assert_eq!(cursor.total_pages(), 2);
    }
}
