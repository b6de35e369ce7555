//! Paginated institution listing.
//!
//! [`InstitutionPager`] keeps page and limit state for the institutions
//! list, issues one fetch per request and remembers the last successful
//! page and the last error.

use crate::api::{ApiClient, ApiError};
use crate::models::{Institution, InstitutionPage, PaginationMeta};
use std::future::Future;
use tracing::{debug, warn};

/// Anything that can serve pages of institutions.
pub trait InstitutionSource {
    fn fetch_page(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<InstitutionPage, ApiError>>;
}

impl InstitutionSource for ApiClient {
    fn fetch_page(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<InstitutionPage, ApiError>> {
        self.get_my_institutions(page, limit)
    }
}

impl<S: InstitutionSource> InstitutionSource for &S {
    fn fetch_page(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<InstitutionPage, ApiError>> {
        (**self).fetch_page(page, limit)
    }
}

/// Page/limit state plus the last fetched page.
pub struct InstitutionPager<S> {
    source: S,
    page: u32,
    limit: u32,
    enabled: bool,
    institutions: Vec<Institution>,
    meta: PaginationMeta,
    error: Option<String>,
}

impl<S: InstitutionSource> InstitutionPager<S> {
    /// Create an enabled pager. Nothing is fetched until [`Self::fetch`].
    pub fn new(source: S, page: u32, limit: u32) -> Self {
        Self {
            source,
            page,
            limit,
            enabled: true,
            institutions: Vec::new(),
            meta: PaginationMeta::empty(page, limit),
            error: None,
        }
    }

    /// Enable or disable fetching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[cfg(test)]
    pub fn institutions(&self) -> &[Institution] {
        &self.institutions
    }

    /// Message of the last failed fetch, cleared by a successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pagination of the last fetch, always reporting the pager's own limit.
    pub fn pagination(&self) -> PaginationMeta {
        PaginationMeta {
            limit: self.limit,
            ..self.meta
        }
    }

    /// Move to another page. Returns whether the page changed.
    pub fn set_page(&mut self, page: u32) -> bool {
        if self.page == page {
            return false;
        }
        self.page = page;
        true
    }

    /// Change the page size. Returns whether the limit changed.
    pub fn set_limit(&mut self, limit: u32) -> bool {
        if self.limit == limit {
            return false;
        }
        self.limit = limit;
        true
    }

    /// Whether a page after the current one exists.
    pub fn has_next_page(&self) -> bool {
        self.page < self.meta.total_pages
    }

    /// Advance one page if possible.
    pub fn next_page(&mut self) -> bool {
        self.has_next_page() && self.set_page(self.page + 1)
    }

    /// Go back one page if possible.
    pub fn previous_page(&mut self) -> bool {
        self.page > 1 && self.set_page(self.page - 1)
    }

    /// Fetch the current page.
    ///
    /// On failure the previous institutions are kept and the error message
    /// is recorded. A disabled pager does nothing.
    pub async fn fetch(&mut self) -> Result<&[Institution], ApiError> {
        if !self.enabled {
            debug!("Pager disabled, skipping fetch");
            return Ok(self.institutions.as_slice());
        }

        match self.source.fetch_page(self.page, self.limit).await {
            Ok(page) => {
                debug!(
                    "Fetched {} institutions (page {}/{})",
                    page.data.len(),
                    page.meta.page,
                    page.meta.total_pages
                );
                self.institutions = page.data;
                self.meta = page.meta;
                self.error = None;
                Ok(self.institutions.as_slice())
            }
            Err(e) => {
                warn!("Failed to fetch institutions: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch again and return a copy of the result.
    ///
    /// When disabled, clears all state instead and returns nothing.
    pub async fn refetch(&mut self) -> Result<Vec<Institution>, ApiError> {
        if !self.enabled {
            self.institutions.clear();
            self.meta = PaginationMeta::empty(self.page, self.limit);
            self.error = None;
            return Ok(Vec::new());
        }

        self.fetch().await.map(|items| items.to_vec())
    }

    /// Walk every page from the first and collect all institutions.
    ///
    /// A failure on a later page stops the walk, keeps what was gathered
    /// and leaves the pager on the last page that loaded. A failure on the
    /// first page is returned.
    pub async fn fetch_all(&mut self) -> Result<Vec<Institution>, ApiError> {
        self.set_page(1);
        let mut all = self.refetch().await?;

        while self.next_page() {
            let fetched = self.fetch().await.map(|items| items.to_vec());
            match fetched {
                Ok(items) => all.extend(items),
                Err(e) => {
                    warn!("Stopped after page {}: {}", self.page - 1, e);
                    self.previous_page();
                    break;
                }
            }
        }

        debug!("Collected {} institutions", all.len());
        Ok(all)
    }

}

/// Institutions whose name or email contains `term`, ignoring case.
pub fn search<'a>(institutions: &'a [Institution], term: &str) -> Vec<&'a Institution> {
    let needle = term.to_lowercase();
    institutions
        .iter()
        .filter(|i| {
            i.name.to_lowercase().contains(&needle) || i.email.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn institution(id: &str, name: &str, email: &str) -> Institution {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "email": email
        }))
        .unwrap()
    }

    /// Serves `total` institutions in pages, optionally failing.
    struct FakeSource {
        total: u32,
        fail: Cell<bool>,
        fail_from: Cell<Option<u32>>,
        calls: RefCell<Vec<(u32, u32)>>,
    }

    impl FakeSource {
        fn new(total: u32) -> Self {
            Self {
                total,
                fail: Cell::new(false),
                fail_from: Cell::new(None),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl InstitutionSource for FakeSource {
        async fn fetch_page(&self, page: u32, limit: u32) -> Result<InstitutionPage, ApiError> {
            self.calls.borrow_mut().push((page, limit));
            let failing_page = self.fail_from.get().is_some_and(|from| page >= from);
            if self.fail.get() || failing_page {
                return Err(ApiError::Http {
                    status: 500,
                    message: "Internal server error".to_string(),
                });
            }

            let start = (page - 1) * limit;
            let end = (start + limit).min(self.total);
            let data = (start..end)
                .map(|i| {
                    let name = format!("School {}", i);
                    institution(&format!("i{}", i), &name, "info@school.edu")
                })
                .collect();
            Ok(InstitutionPage {
                data,
                meta: PaginationMeta {
                    page,
                    limit,
                    total: self.total as u64,
                    total_pages: self.total.div_ceil(limit),
                },
            })
        }
    }

    #[test]
    fn test_fetch_stores_page() {
        let source = FakeSource::new(25);
        let mut pager = InstitutionPager::new(&source, 1, 10);

        let count = tokio_test::block_on(pager.fetch()).unwrap().len();
        assert_eq!(count, 10);
        assert_eq!(pager.pagination().total_pages, 3);
        assert_eq!(pager.error(), None);
        assert_eq!(*source.calls.borrow(), vec![(1, 10)]);
    }

    #[test]
    fn test_page_navigation_bounds() {
        let source = FakeSource::new(25);
        let mut pager = InstitutionPager::new(&source, 1, 10);

        assert!(!pager.previous_page());
        assert!(!pager.next_page(), "no meta before the first fetch");

        tokio_test::block_on(pager.fetch()).unwrap();
        assert!(pager.next_page());
        assert!(pager.next_page());
        assert_eq!(pager.page(), 3);
        assert!(!pager.next_page());

        let last = tokio_test::block_on(pager.fetch()).unwrap().len();
        assert_eq!(last, 5);
        assert!(pager.previous_page());
        assert_eq!(pager.page(), 2);
    }

    #[test]
    fn test_setters_report_changes() {
        let source = FakeSource::new(0);
        let mut pager = InstitutionPager::new(&source, 1, 10);

        assert!(!pager.set_page(1));
        assert!(pager.set_page(2));
        assert!(!pager.set_limit(10));
        assert!(pager.set_limit(50));
        assert_eq!(pager.pagination().limit, 50);
    }

    #[test]
    fn test_failure_keeps_previous_items() {
        let source = FakeSource::new(3);
        let mut pager = InstitutionPager::new(&source, 1, 10);
        tokio_test::block_on(pager.fetch()).unwrap();

        source.fail.set(true);
        assert!(tokio_test::block_on(pager.fetch()).is_err());
        assert_eq!(pager.institutions().len(), 3);
        assert!(pager.error().unwrap().contains("Internal server error"));

        source.fail.set(false);
        tokio_test::block_on(pager.fetch()).unwrap();
        assert_eq!(pager.error(), None);
    }

    #[test]
    fn test_disabled_refetch_clears() {
        let source = FakeSource::new(3);
        let mut pager = InstitutionPager::new(&source, 2, 10).with_enabled(false);

        let items = tokio_test::block_on(pager.refetch()).unwrap();
        assert!(items.is_empty());
        assert_eq!(pager.pagination(), PaginationMeta::empty(2, 10));
        assert!(source.calls.borrow().is_empty());
    }

    #[test]
    fn test_search_matches_name_or_email() {
        let source = FakeSource::new(12);
        let mut pager = InstitutionPager::new(&source, 1, 12);
        tokio_test::block_on(pager.fetch()).unwrap();

        assert_eq!(search(pager.institutions(), "school 1").len(), 3); // 1, 10, 11
        assert_eq!(search(pager.institutions(), "INFO@").len(), 12);
        assert!(search(pager.institutions(), "greenwood").is_empty());
    }

    #[test]
    fn test_fetch_all_walks_every_page() {
        let source = FakeSource::new(25);
        let mut pager = InstitutionPager::new(&source, 2, 10);

        let all = tokio_test::block_on(pager.fetch_all()).unwrap();
        assert_eq!(all.len(), 25);
        assert_eq!(all[24].id, "i24");
        assert_eq!(pager.page(), 3);
        assert_eq!(*source.calls.borrow(), vec![(1, 10), (2, 10), (3, 10)]);
        assert_eq!(search(&all, "school 2").len(), 6); // 2, 20..=24
    }

    #[test]
    fn test_fetch_all_keeps_pages_before_a_failure() {
        let source = FakeSource::new(25);
        source.fail_from.set(Some(3));
        let mut pager = InstitutionPager::new(&source, 1, 10);

        let all = tokio_test::block_on(pager.fetch_all()).unwrap();
        assert_eq!(all.len(), 20);
        assert_eq!(pager.page(), 2);
        assert!(pager.error().is_some());
    }

    #[test]
    fn test_fetch_all_disabled_is_empty() {
        let source = FakeSource::new(25);
        let mut pager = InstitutionPager::new(&source, 1, 10).with_enabled(false);

        let all = tokio_test::block_on(pager.fetch_all()).unwrap();
        assert!(all.is_empty());
        assert!(source.calls.borrow().is_empty());
    }
}
