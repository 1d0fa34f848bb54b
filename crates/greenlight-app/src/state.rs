use std::{sync::Arc, time::Duration};

use greenlight_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner { app_config, pool }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub default_page_size: u32,
    pub query_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            default_page_size: greenlight_dal::filters::DEFAULT_PAGE_SIZE,
            query_timeout: greenlight_dal::DEFAULT_QUERY_TIMEOUT,
        }
    }
}
