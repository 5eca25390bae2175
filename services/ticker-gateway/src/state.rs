use crate::auth::UserStore;
use crate::config::SessionConfig;
use price_feed::TickerService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TickerService>,
    pub users: Arc<UserStore>,
    pub session: SessionConfig,
}

impl AppState {
    pub fn new(service: Arc<TickerService>, users: Arc<UserStore>, session: SessionConfig) -> Self {
        Self {
            service,
            users,
            session,
        }
    }
}
