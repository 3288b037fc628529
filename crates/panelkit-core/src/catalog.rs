use crate::config::ConfigError;
use crate::{Technology, TechnologyId};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Read-only lookup of technology records by identifier.
pub trait TechnologyCatalog {
    fn technology(&self, id: &TechnologyId) -> Option<&Technology>;
}

impl<T: TechnologyCatalog + ?Sized> TechnologyCatalog for &T {
    fn technology(&self, id: &TechnologyId) -> Option<&Technology> {
        (**self).technology(id)
    }
}

impl<T: TechnologyCatalog + ?Sized> TechnologyCatalog for Rc<T> {
    fn technology(&self, id: &TechnologyId) -> Option<&Technology> {
        (**self).technology(id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    by_id: HashMap<TechnologyId, Technology>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    technology: Vec<Technology>,
}

impl StaticCatalog {
    pub fn from_technologies(technologies: impl IntoIterator<Item = Technology>) -> Self {
        let by_id = technologies
            .into_iter()
            .map(|tech| (tech.id.clone(), tech))
            .collect();
        Self { by_id }
    }

    /// Parses `[[technology]]` tables. Later entries replace earlier ones
    /// with the same id.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(contents)?;
        Ok(Self::from_technologies(file.technology))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl TechnologyCatalog for StaticCatalog {
    fn technology(&self, id: &TechnologyId) -> Option<&Technology> {
        self.by_id.get(id)
    }
}
