use std::{collections::BTreeSet, time::Duration};

use reqwest::Client;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    record_id: &'a serde_json::Value,
    emails: Vec<&'a str>,
}

pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(WebhookNotifier { client })
    }

    pub async fn deliver(
        &self,
        webhook: &str,
        record_id: &serde_json::Value,
        emails: &BTreeSet<String>,
    ) -> Result<(), reqwest::Error> {
        let payload = WebhookPayload {
            record_id,
            emails: emails.iter().map(String::as_str).collect(),
        };

        self.client
            .post(webhook)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        log::info!("Webhook sent successfully to {}", webhook);
        Ok(())
    }
}
