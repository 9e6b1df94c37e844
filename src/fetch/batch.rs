//! Fan a date range out to concurrent fetches and gather results in date order

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::http::Fetcher;
use super::{FetchError, FetchResult};
use crate::dates::DateRange;

/// Runs one fetch task per date on a shared connection pool
#[derive(Debug, Clone)]
pub struct BatchFetcher {
    fetcher: Fetcher,
}

impl BatchFetcher {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch every date concurrently.
    ///
    /// The i-th result belongs to the i-th date. The first permanent failure
    /// aborts all in-flight siblings and is returned; partial results are
    /// discarded.
    pub async fn fetch_range(
        &self,
        url_template: &str,
        date_range: &DateRange,
        initial_backoff: Duration,
        max_retries: u32,
    ) -> Result<Vec<FetchResult>, FetchError> {
        let template: Arc<str> = Arc::from(url_template);
        let mut tasks = JoinSet::new();

        for (index, date) in date_range.iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let template = Arc::clone(&template);
            tasks.spawn(async move {
                let result = fetcher
                    .fetch_one(&template, date, initial_backoff, max_retries)
                    .await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<FetchResult>> = vec![None; date_range.len()];

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = match joined {
                Ok(done) => done,
                Err(join_error) => {
                    tasks.abort_all();
                    // Panicked tasks lose their index; report against the range start
                    return Err(FetchError::TaskFailed {
                        date: date_range.first(),
                        message: join_error.to_string(),
                    });
                }
            };

            match result {
                Ok(fetched) => slots[index] = Some(fetched),
                Err(e) => {
                    warn!(error = %e, in_flight = tasks.len(), "Aborting batch after permanent failure");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        let results: Vec<FetchResult> = slots
            .into_iter()
            .zip(date_range.iter())
            .map(|(slot, date)| {
                slot.ok_or_else(|| FetchError::TaskFailed {
                    date,
                    message: "fetch task finished without a result".to_string(),
                })
            })
            .collect::<Result<_, _>>()?;

        info!(
            url = %url_template.replace("{api_key}", "***"),
            dates = %date_range,
            count = results.len(),
            "Finished fetching data for date range"
        );

        Ok(results)
    }
}
