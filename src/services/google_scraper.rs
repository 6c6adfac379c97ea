use std::time::Duration;

use crate::{configuration::HarvestSettings, domain::search_query::PageRequest};

use super::{BrowsingSession, Locator, SessionError};

const CONSENT_BUTTON_XPATH: &str = "//button[contains(., 'Accept all')]";
const RESULTS_CONTAINER_ID: &str = "search";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("results for page {page_index} did not render within {timeout:?}")]
    NavigationTimeout { page_index: u32, timeout: Duration },
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFetchState {
    NotStarted,
    Navigated,
    ConsentResolved,
    ResultsReady,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct PageSettings {
    pub search_url: String,
    pub consent_locator: Locator,
    pub consent_timeout: Duration,
    pub results_locator: Locator,
    pub results_timeout: Duration,
}

impl From<&HarvestSettings> for PageSettings {
    fn from(settings: &HarvestSettings) -> Self {
        PageSettings {
            search_url: settings.search_url.clone(),
            consent_locator: Locator::XPath(CONSENT_BUTTON_XPATH.to_string()),
            consent_timeout: settings.consent_timeout(),
            results_locator: Locator::Id(RESULTS_CONTAINER_ID.to_string()),
            results_timeout: settings.results_timeout(),
        }
    }
}

/// Loads one results page and returns its rendered source.
///
/// A consent dialog that never shows up is fine, a results container that
/// never shows up is a `NavigationTimeout`. Pacing between calls is up to the
/// caller.
pub async fn fetch_page(
    session: &mut dyn BrowsingSession,
    request: &PageRequest<'_>,
    settings: &PageSettings,
) -> Result<String, FetchError> {
    let url = request.url(&settings.search_url);

    log::info!("Searching URL: {}", url);
    session.navigate(&url).await?;
    transition(request, PageFetchState::NotStarted, PageFetchState::Navigated);

    match session
        .find_and_click(&settings.consent_locator, settings.consent_timeout)
        .await
    {
        Ok(()) => log::debug!("Dismissed consent dialog on page {}", request.page_index),
        Err(e) => log::debug!("No consent dialog on page {}: {}", request.page_index, e),
    }
    transition(request, PageFetchState::Navigated, PageFetchState::ConsentResolved);

    if let Err(e) = session
        .wait_for_presence(&settings.results_locator, settings.results_timeout)
        .await
    {
        transition(request, PageFetchState::ConsentResolved, PageFetchState::TimedOut);
        log::error!(
            "Timed out waiting for search results on page {} of {}: {}",
            request.page_index,
            request.query,
            e
        );
        return Err(FetchError::NavigationTimeout {
            page_index: request.page_index,
            timeout: settings.results_timeout,
        });
    }
    transition(request, PageFetchState::ConsentResolved, PageFetchState::ResultsReady);

    Ok(session.rendered_text().await?)
}

fn transition(request: &PageRequest<'_>, from: PageFetchState, to: PageFetchState) {
    log::debug!(
        "Page {} of {}: {:?} -> {:?}",
        request.page_index,
        request.query,
        from,
        to
    );
}
