use std::{fmt, time::Duration};

use async_trait::async_trait;
use thirtyfour::{error::WebDriverError, prelude::*, ChromiumLikeCapabilities};

use crate::configuration::WebDriverSettings;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    XPath(String),
    Id(String),
    Css(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(xpath) => write!(f, "xpath `{}`", xpath),
            Locator::Id(id) => write!(f, "id `{}`", id),
            Locator::Css(css) => write!(f, "css `{}`", css),
        }
    }
}

impl Locator {
    fn to_by(&self) -> By {
        match self {
            Locator::XPath(xpath) => By::XPath(xpath.as_str()),
            Locator::Id(id) => By::Id(id.as_str()),
            Locator::Css(css) => By::Css(css.as_str()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{locator} not found within {timeout:?}")]
    ElementTimeout { locator: Locator, timeout: Duration },
    #[error("browsing session was already disposed")]
    Disposed,
    #[error("webdriver failure: {0}")]
    WebDriver(#[from] WebDriverError),
    #[error("{0}")]
    Other(String),
}

/// One navigation context in a remote controlled browser. Not safe to share
/// between concurrent requests.
#[async_trait]
pub trait BrowsingSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Clicks the first clickable match, failing if none shows up in time.
    async fn find_and_click(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), SessionError>;

    async fn wait_for_presence(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), SessionError>;

    async fn rendered_text(&mut self) -> Result<String, SessionError>;

    async fn dispose(&mut self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowsingSession>, SessionError>;
}

/// Owns a session for one run. `release` disposes it; if the guard is dropped
/// first (cancelled future, unwinding) disposal is handed to the runtime.
pub struct SessionGuard {
    session: Option<Box<dyn BrowsingSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn BrowsingSession>) -> Self {
        SessionGuard {
            session: Some(session),
        }
    }

    pub fn session(&mut self) -> Option<&mut (dyn BrowsingSession + 'static)> {
        self.session.as_deref_mut()
    }

    pub async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.dispose().await {
                log::error!("Failed to close browsing session: {}", e);
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::warn!("Harvest interrupted, closing browsing session");
                handle.spawn(async move {
                    if let Err(e) = session.dispose().await {
                        log::error!("Failed to close browsing session: {}", e);
                    }
                });
            }
            Err(_) => log::error!("No runtime left to close the browsing session"),
        }
    }
}

pub struct Droid {
    driver: Option<WebDriver>,
}

impl Droid {
    pub async fn new(settings: &WebDriverSettings) -> Result<Self, SessionError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.add_arg("--headless")?;
        }
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg(&format!(
            "--window-size={},{}",
            settings.window_width, settings.window_height
        ))?;
        if let Some(ref user_agent) = settings.user_agent {
            caps.add_arg(&format!("user-agent={}", user_agent))?;
        }

        let driver = WebDriver::new(settings.server_url.as_str(), caps).await?;
        log::info!("Opened webdriver session on {}", settings.server_url);

        Ok(Droid {
            driver: Some(driver),
        })
    }

    fn driver(&self) -> Result<&WebDriver, SessionError> {
        self.driver.as_ref().ok_or(SessionError::Disposed)
    }
}

#[async_trait]
impl BrowsingSession for Droid {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.driver()?.goto(url).await?;
        Ok(())
    }

    async fn find_and_click(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        let element = self
            .driver()?
            .query(locator.to_by())
            .wait(timeout, POLL_INTERVAL)
            .and_clickable()
            .first()
            .await
            .map_err(|_| SessionError::ElementTimeout {
                locator: locator.clone(),
                timeout,
            })?;
        element.click().await?;
        Ok(())
    }

    async fn wait_for_presence(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        self.driver()?
            .query(locator.to_by())
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await
            .map_err(|_| SessionError::ElementTimeout {
                locator: locator.clone(),
                timeout,
            })?;
        Ok(())
    }

    async fn rendered_text(&mut self) -> Result<String, SessionError> {
        Ok(self.driver()?.source().await?)
    }

    async fn dispose(&mut self) -> Result<(), SessionError> {
        match self.driver.take() {
            Some(driver) => {
                driver.quit().await?;
                log::info!("Closed webdriver session");
                Ok(())
            }
            None => Err(SessionError::Disposed),
        }
    }
}

pub struct DroidLauncher {
    settings: WebDriverSettings,
}

impl DroidLauncher {
    pub fn new(settings: WebDriverSettings) -> Self {
        DroidLauncher { settings }
    }
}

#[async_trait]
impl SessionLauncher for DroidLauncher {
    async fn open(&self) -> Result<Box<dyn BrowsingSession>, SessionError> {
        let droid = Droid::new(&self.settings).await?;
        Ok(Box::new(droid))
    }
}
