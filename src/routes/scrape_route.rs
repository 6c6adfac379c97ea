use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use url::Url;

use crate::{
    domain::run_config::RunConfig,
    services::{Harvester, WebhookNotifier},
    startup::RunLock,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeEmailsBody {
    #[serde(default)]
    record_id: serde_json::Value,
    names: String,
    domain: String,
    niche: String,
    webhook: String,
}

#[post("/scrape-emails")]
pub async fn scrape_emails(
    body: web::Json<ScrapeEmailsBody>,
    harvester: web::Data<Harvester>,
    notifier: web::Data<WebhookNotifier>,
    run_lock: web::Data<RunLock>,
) -> HttpResponse {
    let config = match RunConfig::parse(&body.names, &body.niche, &body.domain) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Rejected scrape request {}: {}", body.record_id, e);
            return HttpResponse::BadRequest().body(e.to_string());
        }
    };
    if let Err(e) = Url::parse(&body.webhook) {
        log::error!("Rejected scrape request {}: bad webhook: {}", body.record_id, e);
        return HttpResponse::BadRequest().body(format!("Invalid webhook url: {}", e));
    }

    log::info!("Starting email scraping process for {}", body.record_id);
    // The harvest outlives a dropped client connection, so its session is
    // always released by the harvest itself.
    let harvest = tokio::spawn({
        let harvester = harvester.clone();
        let run_lock = run_lock.clone();
        async move {
            let _guard = run_lock.0.lock().await;
            harvester.run(&config).await
        }
    });
    let emails = match harvest.await {
        Ok(Ok(emails)) => emails,
        Ok(Err(e)) => {
            log::error!("Error during scraping process: {}", e);
            return HttpResponse::InternalServerError().body("Error during scraping process");
        }
        Err(e) => {
            log::error!("Scraping task for {} did not finish: {}", body.record_id, e);
            return HttpResponse::InternalServerError().body("Error during scraping process");
        }
    };

    match notifier
        .deliver(&body.webhook, &body.record_id, &emails)
        .await
    {
        Ok(()) => HttpResponse::Ok().body("Emails scraped and webhook sent"),
        Err(e) => {
            log::error!("Error sending webhook: {:?}", e);
            HttpResponse::InternalServerError().body("Error sending webhook")
        }
    }
}
