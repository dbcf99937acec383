use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::dto::catalog::{CatalogQuery, ProductPage};
use crate::error::ClientResult;
use crate::http::ApiClient;

const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub page: Option<ProductPage>,
    pub loading: bool,
    pub last_error: Option<String>,
}

/// Paginated, filterable product listing.
///
/// Search-as-you-type is debounced, and every fetch carries a generation so a
/// stale response that resolves late never overwrites a newer page.
#[derive(Debug)]
pub struct CatalogBrowser {
    api: ApiClient,
    query: Mutex<CatalogQuery>,
    state: Mutex<CatalogState>,
    debouncer: Debouncer,
    generation: AtomicU64,
}

impl CatalogBrowser {
    pub fn new(api: ApiClient, page_size: i64) -> Self {
        Self {
            api,
            query: Mutex::new(CatalogQuery::new(page_size)),
            state: Mutex::new(CatalogState::default()),
            debouncer: Debouncer::new(SEARCH_DEBOUNCE),
            generation: AtomicU64::new(0),
        }
    }

    pub fn query(&self) -> CatalogQuery {
        self.lock_query().clone()
    }

    pub fn state(&self) -> CatalogState {
        self.lock_state().clone()
    }

    pub async fn set_page(&self, page: i64) -> ClientResult<()> {
        self.lock_query().page = page.max(1);
        self.fetch().await
    }

    pub async fn set_product_type(&self, product_type: Option<String>) -> ClientResult<()> {
        {
            let mut query = self.lock_query();
            query.product_type = product_type;
            query.page = 1;
        }
        self.fetch().await
    }

    /// Debounced search: records the text immediately, fetches only if no
    /// newer keystroke arrives within the quiet period. Returns whether this
    /// call was the one that fired.
    pub async fn search_as_you_type(&self, text: &str) -> ClientResult<bool> {
        {
            let mut query = self.lock_query();
            let text = text.trim();
            query.search = if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            };
            query.page = 1;
        }
        let ticket = self.debouncer.arm();
        if !self.debouncer.fire(ticket).await {
            return Ok(false);
        }
        self.fetch().await?;
        Ok(true)
    }

    /// Fetch the current page. A response is discarded when a newer fetch has
    /// started while it was in flight.
    pub async fn fetch(&self) -> ClientResult<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let params = {
            let query = self.lock_query();
            query.to_params()
        };
        self.lock_state().loading = true;

        let result = self.api.get_json::<ProductPage>("/products/", &params).await;

        let mut state = self.lock_state();
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer request owns the state now.
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(page) => {
                state.page = Some(page);
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                state.last_error = Some(err.user_message());
                tracing::warn!(error = %err, "catalog fetch failed");
                Err(err)
            }
        }
    }

    fn lock_query(&self) -> std::sync::MutexGuard<'_, CatalogQuery> {
        self.query.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
