//! Resource Registry - Declared resource types
//!
//! A [`ResourceType`] is declared once through a [`ResourceTypeBuilder`] and
//! recorded in a [`ResourceRegistry`], which keeps every type exactly once in
//! declaration order. The registry is an explicit value: build one at
//! startup and hand it to whatever needs to enumerate types.

use super::accessor::{Accessor, AccessorTable};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// One raw record as produced by a response parser
pub type Record = Map<String, Value>;

/// Response parser: turns a decoded response body into raw records
pub type ParserFn = Arc<dyn Fn(&Value) -> Vec<Record> + Send + Sync>;

/// Parser used when a type installs none.
///
/// An array yields its object elements, an object is a single record, and
/// anything else yields nothing.
pub fn default_parser(response: &Value) -> Vec<Record> {
    match response {
        Value::Array(items) => collect_records(items, None),
        Value::Object(map) => vec![map.clone()],
        _ => vec![],
    }
}

/// Build a parser that reads the record array at a dot-separated `path`,
/// optionally unwrapping each element from a single wrapper key
/// (`{"Items": [{"Item": {...}}]}` -> path `Items`, unwrap `Item`).
pub fn path_parser(path: &str, unwrap: Option<&str>) -> ParserFn {
    let parts: Vec<String> = path
        .split('.')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let unwrap = unwrap.map(str::to_string);

    Arc::new(move |response: &Value| {
        let mut current = response;
        for part in &parts {
            current = match current.get(part) {
                Some(v) => v,
                None => return vec![],
            };
        }

        match current.as_array() {
            Some(items) => collect_records(items, unwrap.as_deref()),
            None => vec![],
        }
    })
}

fn collect_records(items: &[Value], unwrap: Option<&str>) -> Vec<Record> {
    items
        .iter()
        .filter_map(|item| {
            let item = match unwrap {
                // formatVersion=2 responses are not wrapped
                Some(key) => item.get(key).unwrap_or(item),
                None => item,
            };
            match item {
                Value::Object(map) => Some(map.clone()),
                other => {
                    tracing::warn!("Skipping non-object record: {}", other);
                    None
                },
            }
        })
        .collect()
}

/// A declared API resource type
pub struct ResourceType {
    name: String,
    resource_name: String,
    attributes: Vec<String>,
    accessors: AccessorTable,
    endpoint: OnceLock<String>,
    parser: OnceLock<ParserFn>,
}

impl ResourceType {
    /// Start declaring a type. `name` may be a `::` path; its last segment,
    /// lowercased, is the default resource name.
    pub fn builder(name: &str) -> ResourceTypeBuilder {
        ResourceTypeBuilder::new(name)
    }

    /// Declared type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix stripped from attribute names when deriving accessors
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Raw attribute names in declaration order
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn accessors(&self) -> &AccessorTable {
        &self.accessors
    }

    pub fn accessor(&self, name: &str) -> Option<&Accessor> {
        self.accessors.get(name)
    }

    /// The configured endpoint, or `None` before one is set
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.get().map(String::as_str)
    }

    /// Configure the endpoint.
    ///
    /// The endpoint is set once, either here or through
    /// [`ResourceTypeBuilder::endpoint`]. Any later call fails with
    /// [`Error::AlreadyConfigured`] and leaves the first URL in place, so
    /// [`endpoint`](Self::endpoint) always returns the URL from the first
    /// successful set.
    pub fn set_endpoint(&self, url: &str) -> Result<()> {
        self.endpoint
            .set(url.to_string())
            .map_err(|_| self.already_configured("endpoint"))
    }

    /// Install a type-specific response parser.
    ///
    /// Like the endpoint, the parser is set once. A second call (or a call on
    /// a type built with [`ResourceTypeBuilder::parser`]) fails with
    /// [`Error::AlreadyConfigured`] and the first parser stays installed.
    pub fn set_parser<F>(&self, parser: F) -> Result<()>
    where
        F: Fn(&Value) -> Vec<Record> + Send + Sync + 'static,
    {
        self.set_parser_fn(Arc::new(parser))
    }

    fn set_parser_fn(&self, parser: ParserFn) -> Result<()> {
        self.parser
            .set(parser)
            .map_err(|_| self.already_configured("parser"))
    }

    pub fn has_custom_parser(&self) -> bool {
        self.parser.get().is_some()
    }

    /// Split a decoded response into raw records, using the installed
    /// parser or [`default_parser`].
    pub fn parse_response(&self, response: &Value) -> Vec<Record> {
        match self.parser.get() {
            Some(parser) => parser(response),
            None => default_parser(response),
        }
    }

    fn already_configured(&self, setting: &'static str) -> Error {
        Error::AlreadyConfigured {
            resource_type: self.name.clone(),
            setting,
        }
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("name", &self.name)
            .field("resource_name", &self.resource_name)
            .field("attributes", &self.attributes)
            .field("endpoint", &self.endpoint.get())
            .field("custom_parser", &self.has_custom_parser())
            .finish()
    }
}

/// Declaration of a resource type
#[derive(Default)]
pub struct ResourceTypeBuilder {
    name: String,
    resource_name: Option<String>,
    attributes: Vec<String>,
    endpoint: Option<String>,
    parser: Option<ParserFn>,
}

impl ResourceTypeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Override the derived resource name
    pub fn resource_name(mut self, resource_name: &str) -> Self {
        self.resource_name = Some(resource_name.to_string());
        self
    }

    pub fn attribute(mut self, raw: &str) -> Self {
        self.attributes.push(raw.to_string());
        self
    }

    pub fn attributes<I, S>(mut self, raws: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.attributes
            .extend(raws.into_iter().map(|raw| raw.as_ref().to_string()));
        self
    }

    pub fn endpoint(mut self, url: &str) -> Self {
        self.endpoint = Some(url.to_string());
        self
    }

    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&Value) -> Vec<Record> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub(crate) fn parser_fn(mut self, parser: ParserFn) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Derive accessors and produce the type
    pub fn build(self) -> Result<ResourceType> {
        let resource_name = self
            .resource_name
            .unwrap_or_else(|| simple_name(&self.name).to_lowercase());

        let mut attributes: Vec<String> = Vec::with_capacity(self.attributes.len());
        let mut accessors = AccessorTable::new();
        for raw in self.attributes {
            accessors.declare(&self.name, &resource_name, &raw)?;
            if !attributes.contains(&raw) {
                attributes.push(raw);
            }
        }

        let resource_type = ResourceType {
            name: self.name,
            resource_name,
            attributes,
            accessors,
            endpoint: OnceLock::new(),
            parser: OnceLock::new(),
        };

        if let Some(url) = self.endpoint {
            resource_type.set_endpoint(&url)?;
        }
        if let Some(parser) = self.parser {
            resource_type.set_parser_fn(parser)?;
        }

        Ok(resource_type)
    }
}

/// Last `::` segment of a type name
fn simple_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Every declared resource type, in declaration order
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    types: Vec<Arc<ResourceType>>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and record a type. Each type name can be declared once.
    pub fn declare(&mut self, builder: ResourceTypeBuilder) -> Result<Arc<ResourceType>> {
        if self.get(&builder.name).is_some() {
            return Err(Error::AlreadyDeclared(builder.name));
        }

        let resource_type = Arc::new(builder.build()?);
        tracing::debug!(
            "Declared resource type {} (resource name: {}, {} attributes)",
            resource_type.name(),
            resource_type.resource_name(),
            resource_type.attributes().len()
        );

        self.types.push(Arc::clone(&resource_type));
        Ok(resource_type)
    }

    /// All declared types, in declaration order
    pub fn all_declared_types(&self) -> &[Arc<ResourceType>] {
        &self.types
    }

    /// Look up a type by its declared name
    pub fn get(&self, name: &str) -> Option<&Arc<ResourceType>> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Like [`get`](Self::get), failing for unknown names
    pub fn require(&self, name: &str) -> Result<Arc<ResourceType>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownResourceType(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceType>> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
