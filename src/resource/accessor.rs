//! Accessor derivation
//!
//! Maps raw attribute names to the accessor names a resource type exposes.
//! `itemName` on resource `item` reads as `name`; attributes ending in `Flag`
//! additionally answer a `?` predicate (`itemAvailableFlag` -> `available?`).

use crate::error::{Error, Result};
use crate::naming::to_snake;
use serde_json::Value;
use std::collections::HashMap;

/// Suffix marking a 0/1 flag attribute on the wire
const FLAG_SUFFIX: &str = "Flag";

/// What an accessor returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// The raw value, looked up by exact key
    Plain,
    /// `true` iff the raw value is the integer `1`
    Predicate,
}

/// One derived accessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Public name; predicates end with `?`
    pub name: String,
    /// Raw attribute the accessor reads
    pub raw: String,
    pub kind: AccessorKind,
}

/// Snake name of a raw attribute with the `{resource_name}_` prefix removed
pub fn accessor_name(resource_name: &str, raw: &str) -> String {
    let snake = to_snake(raw);
    match snake
        .strip_prefix(resource_name)
        .and_then(|rest| rest.strip_prefix('_'))
        .filter(|rest| !rest.is_empty())
    {
        Some(rest) => rest.to_string(),
        None => snake,
    }
}

/// Predicate name for a flag attribute, or `None` if `raw` is not a flag
pub fn predicate_name(resource_name: &str, raw: &str) -> Option<String> {
    if !raw.ends_with(FLAG_SUFFIX) {
        return None;
    }

    let name = accessor_name(resource_name, raw);
    let base = name
        .strip_suffix("_flag")
        .filter(|base| !base.is_empty())
        .unwrap_or(&name);
    Some(format!("{}?", base))
}

/// Derive every accessor a raw attribute contributes (one or two)
pub fn derive_accessors(resource_name: &str, raw: &str) -> Vec<Accessor> {
    let mut accessors = vec![Accessor {
        name: accessor_name(resource_name, raw),
        raw: raw.to_string(),
        kind: AccessorKind::Plain,
    }];

    if let Some(name) = predicate_name(resource_name, raw) {
        accessors.push(Accessor {
            name,
            raw: raw.to_string(),
            kind: AccessorKind::Predicate,
        });
    }

    accessors
}

/// Flag semantics: only the JSON integer `1` counts as set
pub fn is_flag_set(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Number(n)) if n.as_i64() == Some(1))
}

/// Per-type lookup table from accessor name to raw attribute
#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    accessors: Vec<Accessor>,
    index: HashMap<String, usize>,
}

impl AccessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the accessors for `raw`, rejecting a name already derived from
    /// a different raw attribute.
    pub fn declare(&mut self, resource_type: &str, resource_name: &str, raw: &str) -> Result<()> {
        let derived = derive_accessors(resource_name, raw);

        for accessor in &derived {
            if let Some(existing) = self.get(&accessor.name) {
                if existing.raw != accessor.raw {
                    return Err(Error::AccessorCollision {
                        resource_type: resource_type.to_string(),
                        accessor: accessor.name.clone(),
                        first: existing.raw.clone(),
                        second: accessor.raw.clone(),
                    });
                }
            }
        }

        for accessor in derived {
            if self.index.contains_key(&accessor.name) {
                continue;
            }
            self.index.insert(accessor.name.clone(), self.accessors.len());
            self.accessors.push(accessor);
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.index.get(name).map(|&i| &self.accessors[i])
    }

    /// Accessors in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.iter()
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}
