use std::sync::Arc;

use crate::{auth::SessionProvider, config::Settings, service::ServiceContext};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub session_provider: Arc<dyn SessionProvider>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        session_provider: Arc<dyn SessionProvider>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            service_context,
            session_provider,
            settings,
        }
    }
}
