use std::{
    any::Any, collections::BTreeSet, panic::AssertUnwindSafe, path::Path, sync::Arc,
    time::Duration,
};

use futures::FutureExt;
use itertools::iproduct;

use crate::{
    configuration::HarvestSettings,
    domain::{
        email::EmailExtractor,
        run_config::RunConfig,
        search_query::{PageRequest, SearchQuery},
    },
};

use super::{
    fetch_page, BrowsingSession, EmailStore, FetchError, PageSettings, SessionError,
    SessionGuard, SessionLauncher,
};

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("could not open a browsing session: {0}")]
    SessionUnavailable(#[source] SessionError),
    #[error("invalid email suffix `{suffix}`: {source}")]
    InvalidSuffix {
        suffix: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CombinationError {
    #[error("combination {query} failed on page {page_index}: {source}")]
    Fetch {
        query: SearchQuery,
        page_index: u32,
        #[source]
        source: FetchError,
    },
    #[error("combination {query} panicked: {message}")]
    Panicked { query: SearchQuery, message: String },
}

pub struct Harvester {
    launcher: Arc<dyn SessionLauncher>,
    extractor: EmailExtractor,
    store: EmailStore,
    page_settings: PageSettings,
    page_budget: u32,
    request_delay: Duration,
}

impl Harvester {
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        settings: &HarvestSettings,
    ) -> Result<Self, HarvestError> {
        let extractor = EmailExtractor::new(&settings.email_suffix).map_err(|source| {
            HarvestError::InvalidSuffix {
                suffix: settings.email_suffix.clone(),
                source,
            }
        })?;

        Ok(Harvester {
            launcher,
            extractor,
            store: EmailStore::new(settings.output_dir.clone()),
            page_settings: PageSettings::from(settings),
            page_budget: settings.page_budget,
            request_delay: settings.request_delay(),
        })
    }

    pub fn store(&self) -> &EmailStore {
        &self.store
    }

    /// Runs every identity x category combination through one browsing
    /// session and returns every address found. Only failing to open the
    /// session is an error, everything smaller is logged and skipped.
    pub async fn run(&self, config: &RunConfig) -> Result<BTreeSet<String>, HarvestError> {
        log::info!(
            "Starting harvest of {} combinations for {}",
            config.combinations(),
            config.target_domain
        );
        let session = self
            .launcher
            .open()
            .await
            .map_err(HarvestError::SessionUnavailable)?;
        // Dropping the guard (cancelled run) still disposes the session.
        let mut guard = SessionGuard::new(session);

        let mut all_emails = BTreeSet::new();
        for (identity, category) in iproduct!(config.identities.iter(), config.categories.iter()) {
            let Some(session) = guard.session() else {
                break;
            };
            let query = SearchQuery::build(identity, &config.target_domain, category);
            let mut collected_emails = BTreeSet::new();

            let outcome =
                AssertUnwindSafe(self.scrape_combination(session, &query, &mut collected_emails))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(CombinationError::Panicked {
                            query: query.clone(),
                            message: panic_message(payload.as_ref()),
                        })
                    });
            if let Err(e) = outcome {
                log::error!("Skipping rest of {}: {}", query, e);
            }

            log::info!(
                "Finished scraping for {}. Total emails collected: {}",
                query,
                collected_emails.len()
            );
            all_emails.append(&mut collected_emails);
        }

        guard.release().await;

        if let Err(e) = self
            .store
            .persist(&all_emails, &self.store.combined_path())
            .await
        {
            log::error!("{}", e);
        }
        log::info!(
            "Scraping process completed with {} unique emails",
            all_emails.len()
        );

        Ok(all_emails)
    }

    async fn scrape_combination(
        &self,
        session: &mut dyn BrowsingSession,
        query: &SearchQuery,
        collected_emails: &mut BTreeSet<String>,
    ) -> Result<(), CombinationError> {
        log::info!("Scraping emails for {}", query);
        let destination = self.store.combination_path(query);

        for page_index in 0..self.page_budget {
            let request = PageRequest::new(query, page_index);
            let fetched = fetch_page(session, &request, &self.page_settings).await;
            self.pause().await;

            match fetched {
                Ok(page_source) => {
                    let emails = self.extractor.extract(&page_source);
                    log::info!(
                        "Found {} emails on page {} for {}",
                        emails.len(),
                        page_index,
                        query
                    );
                    collected_emails.extend(emails);
                }
                Err(FetchError::NavigationTimeout { .. }) => {
                    log::warn!("No results on page {} for {}", page_index, query);
                }
                Err(source) => {
                    self.checkpoint(collected_emails, &destination, query, page_index)
                        .await;
                    return Err(CombinationError::Fetch {
                        query: query.clone(),
                        page_index,
                        source,
                    });
                }
            }

            self.checkpoint(collected_emails, &destination, query, page_index)
                .await;
        }

        Ok(())
    }

    async fn checkpoint(
        &self,
        collected_emails: &BTreeSet<String>,
        destination: &Path,
        query: &SearchQuery,
        page_index: u32,
    ) {
        if let Err(e) = self.store.persist(collected_emails, destination).await {
            log::error!("{} (page {} of {})", e, page_index, query);
        }
    }

    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
