//! A cheaply-cloneable handle to a shared event handler, passed down into
//! parallel workers.

use std::sync::Arc;

use super::handler::{AnalysisEventHandler, NoOpEventHandler};

#[derive(Clone)]
pub struct EventDispatcher {
    handler: Arc<dyn AnalysisEventHandler>,
}

impl EventDispatcher {
    pub fn new(handler: Arc<dyn AnalysisEventHandler>) -> Self {
        Self { handler }
    }

    pub fn noop() -> Self {
        Self::new(Arc::new(NoOpEventHandler))
    }

    pub fn handler(&self) -> &dyn AnalysisEventHandler {
        self.handler.as_ref()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::noop()
    }
}
