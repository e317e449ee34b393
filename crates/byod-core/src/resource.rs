//! Fetch-on-mount data holder with manual refetch
//!
//! Views that show a list or a detail record hold a `Resource`: it loads
//! once when created and again whenever `refetch` is called. When two
//! refetches overlap, only the one started last lands.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Snapshot of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub loading: bool,
    /// Last successful value; kept while a refetch is loading or failed
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
        }
    }
}

struct Inner<T> {
    generation: u64,
    state: ResourceState<T>,
}

pub struct Resource<T> {
    fetcher: Fetcher<T>,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Clone + Send + 'static> Resource<T> {
    /// Create and perform the initial fetch
    pub async fn mount<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let resource = Self::deferred(fetch);
        resource.refetch().await;
        resource
    }

    /// Create without fetching
    pub fn deferred<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let fetcher: Fetcher<T> =
            Arc::new(move || -> BoxFuture<'static, Result<T>> { Box::pin(fetch()) });
        Self {
            fetcher,
            inner: Arc::new(Mutex::new(Inner {
                generation: 0,
                state: ResourceState::default(),
            })),
        }
    }

    /// Run the fetch again and return the resulting state
    pub async fn refetch(&self) -> ResourceState<T> {
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.state.loading = true;
            inner.state.error = None;
            inner.generation
        };

        let outcome = (self.fetcher)().await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!("Dropping superseded fetch (generation {})", generation);
            return inner.state.clone();
        }
        inner.state.loading = false;
        match outcome {
            Ok(data) => inner.state.data = Some(data),
            Err(e) => inner.state.error = Some(e.to_string()),
        }
        inner.state.clone()
    }

    pub fn state(&self) -> ResourceState<T> {
        self.inner.lock().state.clone()
    }

    pub fn data(&self) -> Option<T> {
        self.inner.lock().state.data.clone()
    }
}
