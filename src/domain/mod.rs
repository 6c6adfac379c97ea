pub mod email;
pub mod run_config;
pub mod search_query;
