use std::{future::Future, sync::Arc, time::Duration};

use lnatprep_shared::{Clock, SystemClock};
use time::OffsetDateTime;

use crate::{Store, StoreError, User};

#[derive(Clone, Debug)]
pub struct Options {
    /// Upper bound for a single store call.
    pub store_timeout: Duration,
    /// Extra attempts after a timed out store call.
    pub store_retries: u32,
    /// Users processed at once by the sweep and the snapshot refresh.
    pub sweep_concurrency: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
            store_retries: 2,
            sweep_concurrency: 4,
        }
    }
}

/// Entitlement service. Stateless apart from its injected store and clock, so
/// it is cheap to clone into request handlers and background jobs.
#[derive(Clone)]
pub struct Command<S: Store> {
    pub store: S,
    pub clock: Arc<dyn Clock>,
    pub options: Options,
}

impl<S: Store> Command<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            options: Options::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub async fn load(&self, id: &str) -> lnatprep_shared::Result<Option<User>> {
        Ok(self.call("find_user", || self.store.find_user(id)).await?)
    }

    pub(crate) async fn load_user(&self, id: &str) -> lnatprep_shared::Result<User> {
        match self.load(id).await? {
            Some(user) => Ok(user),
            None => lnatprep_shared::not_found!("user {id}"),
        }
    }

    /// Run a store call under the configured timeout. Timeouts are retried
    /// with exponential backoff, any other failure is returned as is.
    pub(crate) async fn call<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;

        loop {
            let result = tokio::time::timeout(self.options.store_timeout, f())
                .await
                .unwrap_or(Err(StoreError::Timeout(self.options.store_timeout)));

            match result {
                Err(err) if err.is_retryable() && attempt < self.options.store_retries => {
                    let backoff = Duration::from_millis(50 * 2u64.pow(attempt));
                    tracing::warn!(
                        op,
                        attempt,
                        ?backoff,
                        err = %err,
                        "store call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(op, attempts = attempt + 1, err = %err, "store call failed");
                    return Err(err);
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}
