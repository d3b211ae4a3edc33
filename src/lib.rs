use config::Config;
use proxy::Proxy;
use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod router;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<Proxy>,
    pub config: Config,
}
