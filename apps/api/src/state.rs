use std::sync::Arc;

use crate::config::Config;
use crate::screenplay::ScreenplayFormatter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Page setup and staging location for every export. Cloned into blocking tasks.
    pub formatter: Arc<ScreenplayFormatter>,
}

impl AppState {
    pub fn new(config: Config, formatter: ScreenplayFormatter) -> Self {
        Self {
            config,
            formatter: Arc::new(formatter),
        }
    }
}
