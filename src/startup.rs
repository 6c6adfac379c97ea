use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use tokio::sync::Mutex;

use crate::{
    routes::{default_route, scrape_route},
    services::{Harvester, WebhookNotifier},
};

const JSON_LIMIT_BYTES: usize = 100 * 1024 * 1024;

/// Serialises harvests so only one browser session is driven at a time.
#[derive(Default)]
pub struct RunLock(pub Mutex<()>);

pub fn run(
    listener: TcpListener,
    harvester: Harvester,
    notifier: WebhookNotifier,
) -> Result<Server, std::io::Error> {
    let harvester = web::Data::new(harvester);
    let notifier = web::Data::new(notifier);
    let run_lock = web::Data::new(RunLock::default());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
            .service(default_route::default)
            .service(scrape_route::scrape_emails)
            .app_data(harvester.clone())
            .app_data(notifier.clone())
            .app_data(run_lock.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
