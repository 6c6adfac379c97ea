pub mod data_persistance;
pub mod droid;
pub mod google_scraper;
pub mod harvester;
pub mod webhook;

pub use data_persistance::*;
pub use droid::*;
pub use google_scraper::*;
pub use harvester::*;
pub use webhook::*;
