/// Page bookkeeping shared by the listing scrapers.
///
/// The ceiling starts at a configured value and is raised when pagination
/// links advertise higher page numbers, up to a hard cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub page_num: u32,
    pub max_pages: u32,
    cap: u32,
    last_page_count: Option<usize>,
}

/// What a listing page's job count says about the end of the listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingCheck {
    Fresh,
    Empty,
    /// Same count as the previous page: the board is serving the last page again.
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAdvance {
    Next,
    LastPage,
}

impl Pagination {
    pub fn new(initial_max_pages: u32, cap: u32) -> Self {
        let cap = cap.max(1);
        Self {
            page_num: 1,
            max_pages: initial_max_pages.clamp(1, cap),
            cap,
            last_page_count: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page_num <= self.max_pages
    }

    pub fn check_listing(&mut self, job_count: usize) -> ListingCheck {
        if job_count == 0 {
            return ListingCheck::Empty;
        }
        if self.page_num > 1 && self.last_page_count == Some(job_count) {
            return ListingCheck::Repeated;
        }
        self.last_page_count = Some(job_count);
        ListingCheck::Fresh
    }

    /// Raises the ceiling from the advertised page numbers, then either moves
    /// to the next page or reports that the current one was the last.
    pub fn advance(&mut self, advertised: &[u32]) -> PageAdvance {
        let highest = advertised.iter().copied().max().unwrap_or(0).min(self.cap);
        let raised = highest > self.max_pages;
        if raised {
            self.max_pages = highest;
        }
        if !raised && self.page_num >= self.max_pages {
            return PageAdvance::LastPage;
        }
        self.page_num += 1;
        PageAdvance::Next
    }

    /// Back to page 1 for a different URL template. The ceiling is kept.
    pub fn restart(&mut self) {
        self.page_num = 1;
        self.last_page_count = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_grows_from_advertised_pages() {
        let mut pages = Pagination::new(5, 50);
        assert_eq!(pages.advance(&[1, 2, 3, 7]), PageAdvance::Next);
        assert_eq!(pages.max_pages, 7);
        assert_eq!(pages.page_num, 2);
    }

    #[test]
    fn test_ceiling_growth_is_capped() {
        let mut pages = Pagination::new(5, 5);
        assert_eq!(pages.advance(&[40]), PageAdvance::Next);
        assert_eq!(pages.max_pages, 5);
    }

    #[test]
    fn test_last_page_when_ceiling_reached() {
        let mut pages = Pagination::new(2, 50);
        assert_eq!(pages.advance(&[]), PageAdvance::Next);
        assert_eq!(pages.advance(&[1, 2]), PageAdvance::LastPage);
        assert_eq!(pages.page_num, 2);
    }

    #[test]
    fn test_repeated_count_ends_listings() {
        let mut pages = Pagination::new(10, 50);
        assert_eq!(pages.check_listing(20), ListingCheck::Fresh);
        pages.advance(&[]);
        assert_eq!(pages.check_listing(20), ListingCheck::Repeated);
        assert_eq!(pages.check_listing(0), ListingCheck::Empty);
    }

    #[test]
    fn test_restart_forgets_previous_count() {
        let mut pages = Pagination::new(10, 50);
        pages.check_listing(20);
        pages.advance(&[]);
        pages.restart();
        assert_eq!(pages.page_num, 1);
        assert_eq!(pages.check_listing(20), ListingCheck::Fresh);
    }
}
