//! Resource Catalog - Built-in resource declarations
//!
//! The Rakuten resource types are declared in JSON files compiled into the
//! crate, so adding an endpoint is a data change.

use super::registry::{path_parser, ResourceRegistry, ResourceTypeBuilder};
use crate::error::Result;
use serde::Deserialize;

/// Embedded resource JSON files, declared in this order
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/ichiba.json"),
    include_str!("../resources/books.json"),
];

/// Where the records sit in a response
#[derive(Debug, Clone, Deserialize)]
pub struct ParserDef {
    /// Dot-separated path to the record array
    pub path: String,
    /// Key each record is wrapped in, if any
    #[serde(default)]
    pub unwrap: Option<String>,
}

/// Resource declaration from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub name: String,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub parser: Option<ParserDef>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl ResourceDef {
    pub fn into_builder(self) -> ResourceTypeBuilder {
        let mut builder = ResourceTypeBuilder::new(&self.name).attributes(&self.attributes);

        if let Some(ref resource_name) = self.resource_name {
            builder = builder.resource_name(resource_name);
        }
        if let Some(ref endpoint) = self.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(parser) = self.parser {
            builder = builder.parser_fn(path_parser(&parser.path, parser.unwrap.as_deref()));
        }

        builder
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
}

impl ResourceRegistry {
    /// Registry holding every built-in resource type
    pub fn with_catalog() -> Result<Self> {
        let mut registry = Self::new();
        for content in RESOURCE_FILES {
            registry.declare_catalog(content)?;
        }
        Ok(registry)
    }

    /// Declare every resource in a catalog JSON document, in file order
    pub fn declare_catalog(&mut self, content: &str) -> Result<()> {
        let catalog: CatalogFile = serde_json::from_str(content)?;
        for def in catalog.resources {
            self.declare(def.into_builder())?;
        }
        Ok(())
    }
}
