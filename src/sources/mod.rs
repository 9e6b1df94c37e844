//! Built-in data sources and the registry that resolves them by name

pub mod normalize;
pub mod solar;
pub mod wind;

pub use solar::SolarTransformer;
pub use wind::WindTransformer;

use std::sync::Arc;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::pipeline::Transformer;

pub const WIND: &str = "wind";
pub const SOLAR: &str = "solar";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown source: {0}")]
    NotFound(String),
}

/// A named source: where to fetch it and how to normalize it
#[derive(Clone)]
pub struct Source {
    pub name: String,
    pub url_template: String,
    pub transformer: Arc<dyn Transformer>,
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("url_template", &self.url_template)
            .finish_non_exhaustive()
    }
}

/// Sources in registration order
#[derive(Clone, Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any previous one with the same name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        url_template: impl Into<String>,
        transformer: Arc<dyn Transformer>,
    ) {
        let source = Source {
            name: name.into(),
            url_template: url_template.into(),
            transformer,
        };

        match self.sources.iter_mut().find(|s| s.name == source.name) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Source, RegistryError> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Wind and solar against the configured API
    pub fn with_defaults(api: &ApiConfig) -> Self {
        let mut registry = Self::new();
        registry.register(WIND, api.url_template(&api.wind_path), Arc::new(WindTransformer::new()));
        registry.register(SOLAR, api.url_template(&api.solar_path), Arc::new(SolarTransformer::new()));
        registry
    }
}
