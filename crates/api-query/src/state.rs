use crate::config::WebConfig;
use core_executor::service::ExecutionService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub execution_svc: Arc<dyn ExecutionService>,
    pub config: Arc<WebConfig>,
}

impl AppState {
    pub fn new(execution_svc: Arc<dyn ExecutionService>, config: Arc<WebConfig>) -> Self {
        Self {
            execution_svc,
            config,
        }
    }
}
