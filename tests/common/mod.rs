#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use trawler::{
    configuration::HarvestSettings,
    services::{BrowsingSession, Locator, SessionError, SessionLauncher},
};

/// What a stub session does for a given url.
#[derive(Clone)]
pub enum PageBehaviour {
    Render(String),
    TimeOut,
    NavigationFails,
    Panic,
}

#[derive(Default)]
pub struct StubLog {
    pub visited: Vec<String>,
    pub opened: usize,
    pub disposed: usize,
}

type Script = Arc<dyn Fn(&str) -> PageBehaviour + Send + Sync>;

#[derive(Clone)]
pub struct StubLauncher {
    pub log: Arc<Mutex<StubLog>>,
    script: Script,
    refuse: bool,
}

impl StubLauncher {
    pub fn new(script: impl Fn(&str) -> PageBehaviour + Send + Sync + 'static) -> Self {
        StubLauncher {
            log: Arc::new(Mutex::new(StubLog::default())),
            script: Arc::new(script),
            refuse: false,
        }
    }

    pub fn rendering(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| PageBehaviour::Render(text.clone()))
    }

    pub fn refusing() -> Self {
        StubLauncher {
            refuse: true,
            ..Self::rendering("")
        }
    }

    pub fn visited(&self) -> Vec<String> {
        self.log.lock().unwrap().visited.clone()
    }

    pub fn disposed(&self) -> usize {
        self.log.lock().unwrap().disposed
    }

    pub fn opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }
}

#[async_trait]
impl SessionLauncher for StubLauncher {
    async fn open(&self) -> Result<Box<dyn BrowsingSession>, SessionError> {
        if self.refuse {
            return Err(SessionError::Other("no webdriver listening".to_string()));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(StubSession {
            log: self.log.clone(),
            script: self.script.clone(),
            current: None,
        }))
    }
}

pub struct StubSession {
    log: Arc<Mutex<StubLog>>,
    script: Script,
    current: Option<PageBehaviour>,
}

#[async_trait]
impl BrowsingSession for StubSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.log.lock().unwrap().visited.push(url.to_string());
        let behaviour = (self.script)(url);
        match behaviour {
            PageBehaviour::NavigationFails => {
                return Err(SessionError::Other(format!("could not load {}", url)))
            }
            PageBehaviour::Panic => panic!("driver crashed on {}", url),
            _ => {}
        }
        self.current = Some(behaviour);
        Ok(())
    }

    async fn find_and_click(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        Err(SessionError::ElementTimeout {
            locator: locator.clone(),
            timeout,
        })
    }

    async fn wait_for_presence(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        match self.current {
            Some(PageBehaviour::Render(_)) => Ok(()),
            _ => Err(SessionError::ElementTimeout {
                locator: locator.clone(),
                timeout,
            }),
        }
    }

    async fn rendered_text(&mut self) -> Result<String, SessionError> {
        match self.current {
            Some(PageBehaviour::Render(ref text)) => Ok(text.clone()),
            _ => Err(SessionError::Other("nothing rendered".to_string())),
        }
    }

    async fn dispose(&mut self) -> Result<(), SessionError> {
        self.log.lock().unwrap().disposed += 1;
        Ok(())
    }
}

pub fn test_settings(output_dir: &std::path::Path, page_budget: u32) -> HarvestSettings {
    HarvestSettings {
        page_budget,
        request_delay_millis: 0,
        consent_timeout_millis: 0,
        results_timeout_millis: 0,
        output_dir: output_dir.to_path_buf(),
        ..HarvestSettings::default()
    }
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
