use std::sync::Arc;

use shorty_core::Repository;
use shorty_generator::Generator;

/// Everything a request handler needs, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn Repository>,
    generator: Arc<dyn Generator>,
    base_url: String,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn Repository>,
        generator: Arc<dyn Generator>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            generator,
            base_url: public_base_url.into(),
        }
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    /// The public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/s/{}", self.base_url.trim_end_matches('/'), code)
    }
}
