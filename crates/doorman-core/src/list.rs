//! Paginated list view.
//!
//! Holds two copies of one fetched page: `all`, exactly as returned, and
//! `displayed`, the searched and sorted projection the operator sees.
//! Search is always re-derived from `all`, so repeating a search or clearing
//! it never compounds. Sorting reorders `displayed` only, in a fixed
//! direction per field.

use crate::cache::SelectionCache;
use crate::client::ResourceApi;
use crate::entity::{self, Entity};
use crate::error::{ConsoleError, Result};
use crate::route::Route;

/// Fetch state of a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// List view over one resource family.
#[derive(Debug, Clone)]
pub struct ListView<E: Entity> {
    state: ListState,
    all: Vec<E>,
    displayed: Vec<E>,
    page: u32,
    page_size: u32,
    search: Option<String>,
    sort: Option<&'static str>,
}

impl<E: Entity> ListView<E> {
    /// An idle view that will fetch the first page.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            state: ListState::Idle,
            all: Vec::new(),
            displayed: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            search: None,
            sort: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// The fetched page, unfiltered.
    #[must_use]
    pub fn all(&self) -> &[E] {
        &self.all
    }

    /// What the operator sees.
    #[must_use]
    pub fn displayed(&self) -> &[E] {
        &self.displayed
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Active search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Active sort field, if any.
    #[must_use]
    pub fn sort_field(&self) -> Option<&'static str> {
        self.sort
    }

    /// Choose the page fetched by the next [`ListView::load`]. Pages start
    /// at 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Fetch the current page, replacing both copies. Also used to refresh.
    ///
    /// # Errors
    ///
    /// Returns the fetch error. Both copies are emptied and the view moves
    /// to [`ListState::Errored`].
    pub async fn load(&mut self, api: &dyn ResourceApi<E>) -> Result<()> {
        self.state = ListState::Loading;
        self.search = None;
        self.sort = None;
        match api.list(self.page, self.page_size).await {
            Ok(records) => {
                self.displayed.clone_from(&records);
                self.all = records;
                self.state = ListState::Loaded;
                Ok(())
            }
            Err(e) => {
                self.all.clear();
                self.displayed.clear();
                self.state = ListState::Errored(e.to_string());
                Err(e)
            }
        }
    }

    /// Filter `all` by a case-insensitive substring over the entity's
    /// search fields. An empty term restores `all`. Clears any sort.
    pub fn search(&mut self, term: &str) {
        let term = term.trim();
        self.sort = None;
        if term.is_empty() {
            self.search = None;
            self.displayed.clone_from(&self.all);
            return;
        }
        let needle = term.to_lowercase();
        self.displayed = self
            .all
            .iter()
            .filter(|r| entity::matches_term(*r, &needle))
            .cloned()
            .collect();
        self.search = Some(term.to_owned());
    }

    /// Stable-sort the displayed rows by `field`. Text sorts ascending,
    /// counts descending; repeating a sort leaves the order unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] for a field the entity does not
    /// sort by.
    pub fn sort(&mut self, field: &str) -> Result<()> {
        let Some(field) = E::SORT_FIELDS.iter().copied().find(|f| *f == field) else {
            return Err(ConsoleError::Validation(format!(
                "cannot sort {} by '{field}' (sortable: {})",
                E::KIND.plural(),
                E::SORT_FIELDS.join(", ")
            )));
        };
        self.displayed.sort_by(|a, b| match (a.sort_key(field), b.sort_key(field)) {
            (Some(a), Some(b)) => a.compare(&b),
            _ => std::cmp::Ordering::Equal,
        });
        self.sort = Some(field);
        Ok(())
    }

    /// Remember the displayed row at `index` and return its detail route.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] for an out-of-range index, or
    /// the cache write error.
    pub async fn select(&self, index: usize, cache: &SelectionCache) -> Result<Route> {
        let record = self.displayed.get(index).ok_or_else(|| {
            ConsoleError::Validation(format!(
                "no row {index}, {} row(s) displayed",
                self.displayed.len()
            ))
        })?;
        cache.remember(record).await?;
        Ok(Route::Detail {
            kind: E::KIND,
            key: record.identifier(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entity::EntityKind;
    use crate::models::{Api, Group};
    use crate::store::MemoryStore;
    use crate::testing::{Call, FakeApi};

    fn api(name: &str, version: &str, description: &str, servers: usize) -> Api {
        Api {
            api_name: name.into(),
            api_version: version.into(),
            api_description: description.into(),
            api_servers: (0..servers).map(|i| format!("http://s{i}")).collect(),
            ..Api::default()
        }
    }

    fn fixture() -> Vec<Api> {
        vec![
            api("orders", "v1", "Order service", 1),
            api("billing", "v2", "Invoices", 3),
            api("Customers", "v1", "CRM for orders", 2),
            api("audit", "v1", "", 3),
        ]
    }

    async fn loaded() -> (ListView<Api>, FakeApi<Api>) {
        let fake = FakeApi::with(fixture());
        let mut view = ListView::new(10);
        view.load(&fake).await.unwrap();
        (view, fake)
    }

    fn names(view: &ListView<Api>) -> Vec<&str> {
        view.displayed().iter().map(|a| a.api_name.as_str()).collect()
    }

    #[tokio::test]
    async fn load_mirrors_all_into_displayed() {
        let (view, fake) = loaded().await;
        assert_eq!(view.state(), &ListState::Loaded);
        assert_eq!(view.displayed().len(), fixture().len());
        assert_eq!(view.displayed(), view.all());
        assert_eq!(view.all(), fixture().as_slice());
        assert_eq!(fake.calls(), vec![Call::List { page: 1, page_size: 10 }]);
    }

    #[tokio::test]
    async fn load_failure_clears_both_copies() {
        let (mut view, fake) = loaded().await;
        fake.fail_with("database unavailable");
        let err = view.load(&fake).await.unwrap_err();
        assert_eq!(err.to_string(), "database unavailable");
        assert_eq!(view.state(), &ListState::Errored("database unavailable".into()));
        assert!(view.all().is_empty());
        assert!(view.displayed().is_empty());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let (mut view, _) = loaded().await;
        view.search("ORDER");
        assert_eq!(names(&view), vec!["orders", "Customers"]);
        view.search("v2");
        assert_eq!(names(&view), vec!["billing"]);
    }

    #[tokio::test]
    async fn repeated_search_is_idempotent() {
        let (mut view, _) = loaded().await;
        view.search("orders");
        let once = view.displayed().to_vec();
        view.search("orders");
        assert_eq!(view.displayed(), once.as_slice());
    }

    #[tokio::test]
    async fn empty_search_restores_everything() {
        let (mut view, _) = loaded().await;
        view.search("billing");
        assert_eq!(view.displayed().len(), 1);
        view.search("");
        assert_eq!(view.displayed(), view.all());
        assert_eq!(view.search_term(), None);
    }

    #[tokio::test]
    async fn text_sort_is_ascending_and_stable_under_repeat() {
        let (mut view, _) = loaded().await;
        view.sort("name").unwrap();
        let once = names(&view).join(",");
        assert_eq!(once, "audit,billing,Customers,orders");
        view.sort("name").unwrap();
        assert_eq!(names(&view).join(","), once);
        assert_eq!(view.all(), fixture().as_slice());
    }

    #[tokio::test]
    async fn count_sort_is_descending_and_stable_for_ties() {
        let (mut view, _) = loaded().await;
        view.sort("servers").unwrap();
        assert_eq!(names(&view), vec!["billing", "audit", "Customers", "orders"]);
        view.sort("servers").unwrap();
        assert_eq!(names(&view), vec!["billing", "audit", "Customers", "orders"]);
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let (mut view, _) = loaded().await;
        let err = view.sort("owner").unwrap_err();
        assert!(err.to_string().contains("sortable: name, version, type, servers"));
    }

    #[tokio::test]
    async fn select_caches_record_and_routes_to_detail() {
        let (mut view, _) = loaded().await;
        let cache = SelectionCache::new(Arc::new(MemoryStore::new()));
        view.search("billing");
        let route = view.select(0, &cache).await.unwrap();
        assert_eq!(
            route,
            Route::Detail {
                kind: EntityKind::Api,
                key: "billing/v2".into()
            }
        );
        assert_eq!(cache.recall::<Api>().await.unwrap().api_name, "billing");
        assert!(view.select(7, &cache).await.is_err());
    }

    #[tokio::test]
    async fn page_is_passed_through() {
        let fake = FakeApi::<Group>::with(Vec::new());
        let mut view = ListView::new(25);
        view.set_page(3);
        view.load(&fake).await.unwrap();
        assert_eq!(fake.calls(), vec![Call::List { page: 3, page_size: 25 }]);
        assert!(view.displayed().is_empty());
    }
}
