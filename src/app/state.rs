use std::sync::Arc;

use crate::llm::TextGenerator;

/// State shared by every request handler.
#[derive(Clone, Default)]
pub struct AppState {
    /// `None` when the service runs without a model.
    pub generator: Option<Arc<dyn TextGenerator>>,
}

impl AppState {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> Option<&dyn TextGenerator> {
        self.generator.as_deref()
    }
}
