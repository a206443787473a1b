//! Resource instances
//!
//! A [`Resource`] is one API record: the raw key/value payload plus the type
//! it belongs to, which supplies the accessor table.

use super::accessor::{is_flag_set, AccessorKind};
use super::registry::{Record, ResourceType};
use crate::error::{Error, Result};
use crate::naming::to_camel;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// One record of a declared resource type
#[derive(Clone)]
pub struct Resource {
    resource_type: Arc<ResourceType>,
    params: Map<String, Value>,
}

impl Resource {
    /// Build an instance from any key/value pairs. Keys are stored in their
    /// string form.
    pub fn new<I, K, V>(resource_type: Arc<ResourceType>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: Into<Value>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.into()))
            .collect();
        Self {
            resource_type,
            params,
        }
    }

    /// Build an instance from a parsed record
    pub fn from_record(resource_type: Arc<ResourceType>, record: Record) -> Self {
        Self {
            resource_type,
            params: record,
        }
    }

    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    /// Raw payload
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn into_params(self) -> Map<String, Value> {
        self.params
    }

    /// Look up `key`, falling back to its camelCase form.
    ///
    /// `get("item_code")` finds a stored `itemCode`; a stored `item_code` is
    /// not found through `get("itemCode")`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params
            .get(key)
            .or_else(|| self.params.get(&to_camel(key)))
    }

    /// Exact-key lookup
    pub fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Raw keys present in this record
    pub fn attributes(&self) -> Vec<&str> {
        self.params.keys().map(String::as_str).collect()
    }

    /// Read a plain accessor, e.g. `read("name")` for `itemName` on an item.
    ///
    /// `Ok(None)` means the accessor exists but the record lacks the field.
    pub fn read(&self, accessor: &str) -> Result<Option<&Value>> {
        match self.resource_type.accessor(accessor) {
            Some(a) if a.kind == AccessorKind::Plain => Ok(self.get_attribute(&a.raw)),
            _ => Err(self.unknown_accessor(accessor)),
        }
    }

    /// Evaluate a flag predicate, e.g. `ask("available?")`. The trailing
    /// `?` is optional.
    pub fn ask(&self, predicate: &str) -> Result<bool> {
        let name = if predicate.ends_with('?') {
            predicate.to_string()
        } else {
            format!("{}?", predicate)
        };

        match self.resource_type.accessor(&name) {
            Some(a) if a.kind == AccessorKind::Predicate => {
                Ok(is_flag_set(self.get_attribute(&a.raw)))
            },
            _ => Err(self.unknown_accessor(predicate)),
        }
    }

    /// Accessor names this record answers to
    pub fn accessors(&self) -> Vec<&str> {
        self.resource_type
            .accessors()
            .iter()
            .map(|a| a.name.as_str())
            .collect()
    }

    /// Directional equality: every key of `self` maps to an equal value in
    /// `other`. Keys only present in `other` are ignored, so
    /// `a.matches(&b)` does not imply `b.matches(&a)`. The types of the two
    /// records are not compared.
    ///
    /// A key missing from `other` reads as `null`, so `{"x": null}` matches
    /// `{}`. Numbers compare by value: `1` and `1.0` are equal.
    pub fn matches(&self, other: &Resource) -> bool {
        self.params
            .iter()
            .all(|(k, v)| same_value(v, other.params.get(k).unwrap_or(&Value::Null)))
    }

    /// [`matches`](Self::matches) for a value of unknown type. Fails unless
    /// `other` is a [`Resource`].
    pub fn equals(&self, other: &dyn Any) -> Result<bool> {
        match other.downcast_ref::<Resource>() {
            Some(other) => Ok(self.matches(other)),
            None => Err(Error::NotAResource(type_name_of(other))),
        }
    }

    fn unknown_accessor(&self, accessor: &str) -> Error {
        Error::UnknownAccessor {
            resource_type: self.resource_type.name().to_string(),
            accessor: accessor.to_string(),
        }
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| same_value(x, y))
        },
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map_or(false, |w| same_value(v, w)))
        },
        _ => a == b,
    }
}

fn type_name_of(value: &dyn Any) -> &'static str {
    if value.is::<Value>() {
        "serde_json::Value"
    } else if value.is::<Map<String, Value>>() {
        "serde_json::Map"
    } else {
        "unknown"
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("type", &self.resource_type.name())
            .field("params", &self.params)
            .finish()
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.params.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn item_type() -> Arc<ResourceType> {
        Arc::new(
            ResourceType::builder("Item")
                .attributes(["itemName", "itemCode", "itemAvailableFlag", "postageFlag"])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_accessor_reads_prefixed_attribute() {
        let item = Resource::new(item_type(), [("itemName", "Widget")]);
        assert_eq!(item.read("name").unwrap(), Some(&json!("Widget")));
    }

    #[test]
    fn test_accessor_missing_field_is_none() {
        let item = Resource::new(item_type(), Vec::<(&str, Value)>::new());
        assert_eq!(item.read("name").unwrap(), None);
    }

    #[test]
    fn test_unknown_accessor() {
        let item = Resource::new(item_type(), [("itemName", "Widget")]);
        assert!(matches!(item.read("title"), Err(Error::UnknownAccessor { .. })));
        // predicates are not plain accessors
        assert!(item.read("available?").is_err());
        assert!(item.ask("name").is_err());
    }

    #[test]
    fn test_flag_predicate() {
        let ty = item_type();
        let cases = [
            (json!(1), true),
            (json!(0), false),
            (json!("1"), false),
            (json!(2), false),
        ];
        for (value, expected) in cases {
            let item = Resource::new(Arc::clone(&ty), [("itemAvailableFlag", value)]);
            assert_eq!(item.ask("available?").unwrap(), expected);
            assert_eq!(item.ask("available").unwrap(), expected);
        }

        let absent = Resource::new(ty, [("itemName", "x")]);
        assert!(!absent.ask("available?").unwrap());
        assert!(!absent.ask("postage?").unwrap());
    }

    #[test]
    fn test_flag_also_has_plain_accessor() {
        let item = Resource::new(item_type(), [("postageFlag", 0)]);
        assert_eq!(item.read("postage_flag").unwrap(), Some(&json!(0)));
    }

    #[test]
    fn test_get_falls_back_to_camel() {
        let item = Resource::new(item_type(), [("itemCode", "abc")]);
        assert_eq!(item.get("itemCode"), Some(&json!("abc")));
        assert_eq!(item.get("item_code"), Some(&json!("abc")));
        assert_eq!(item.get("code"), None);
    }

    #[test]
    fn test_get_does_not_fall_back_to_snake() {
        let item = Resource::new(item_type(), [("item_code", "abc")]);
        assert_eq!(item.get("item_code"), Some(&json!("abc")));
        assert_eq!(item.get("itemCode"), None);
    }

    #[test]
    fn test_get_attribute_is_exact() {
        let item = Resource::new(item_type(), [("itemCode", "abc")]);
        assert_eq!(item.get_attribute("itemCode"), Some(&json!("abc")));
        assert_eq!(item.get_attribute("item_code"), None);
    }

    #[test]
    fn test_keys_are_stringified() {
        let item = Resource::new(item_type(), [(1, "one"), (2, "two")]);
        let mut keys = item.attributes();
        keys.sort();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(item.get_attribute("1"), Some(&json!("one")));
    }

    #[test]
    fn test_equality_is_directional() {
        let ty = item_type();
        let a = Resource::new(Arc::clone(&ty), [("x", 1)]);
        let b = Resource::new(ty, [("x", 1), ("y", 2)]);

        assert!(a.equals(&b).unwrap());
        assert!(!b.equals(&a).unwrap());
    }

    #[test]
    fn test_equality_across_types() {
        let genre = Arc::new(ResourceType::builder("Genre").build().unwrap());
        let a = Resource::new(item_type(), [("x", 1)]);
        let b = Resource::new(genre, [("x", 1)]);
        assert!(a.equals(&b).unwrap());
        assert!(b.matches(&a));
    }

    #[test]
    fn test_equality_detects_different_values() {
        let ty = item_type();
        let a = Resource::new(Arc::clone(&ty), [("x", 1)]);
        let b = Resource::new(ty, [("x", 2)]);
        assert!(!a.equals(&b).unwrap());
    }

    #[test]
    fn test_equality_treats_missing_key_as_null() {
        let ty = item_type();
        let with_null = Resource::new(Arc::clone(&ty), [("x", Value::Null)]);
        let empty = Resource::new(Arc::clone(&ty), Vec::<(&str, Value)>::new());
        assert!(with_null.equals(&empty).unwrap());
        assert!(empty.equals(&with_null).unwrap());

        let zero = Resource::new(ty, [("x", 0)]);
        assert!(!with_null.matches(&zero));
    }

    #[test]
    fn test_equality_compares_numbers_by_value() {
        let ty = item_type();
        let int = Resource::new(Arc::clone(&ty), [("x", json!(1))]);
        let float = Resource::new(Arc::clone(&ty), [("x", json!(1.0))]);
        assert!(int.matches(&float));
        assert!(float.matches(&int));

        let nested_int = Resource::new(Arc::clone(&ty), [("x", json!([1, {"y": 2}]))]);
        let nested_float = Resource::new(Arc::clone(&ty), [("x", json!([1.0, {"y": 2.0}]))]);
        assert!(nested_int.matches(&nested_float));

        let other = Resource::new(ty, [("x", json!(2.0))]);
        assert!(!int.matches(&other));
        assert!(!int.matches(&Resource::new(item_type(), [("x", "1")])));
    }

    #[test]
    fn test_equality_with_non_resource_fails() {
        let item = Resource::new(item_type(), [("x", 1)]);

        let mapping: HashMap<String, Value> = HashMap::from([("x".to_string(), json!(1))]);
        assert!(matches!(item.equals(&mapping), Err(Error::NotAResource(_))));
        assert!(matches!(
            item.equals(&json!({"x": 1})),
            Err(Error::NotAResource("serde_json::Value"))
        ));

        let empty = Resource::new(item_type(), Vec::<(&str, Value)>::new());
        assert!(empty.equals(&"x").is_err());
    }

    #[test]
    fn test_serialize_as_raw_params() {
        let item = Resource::new(item_type(), [("itemName", "Widget")]);
        assert_eq!(serde_json::to_value(&item).unwrap(), json!({"itemName": "Widget"}));
    }

    #[test]
    fn test_accessors_listing() {
        let item = Resource::new(item_type(), Vec::<(&str, Value)>::new());
        assert_eq!(
            item.accessors(),
            vec!["name", "code", "available_flag", "available?", "postage_flag", "postage?"]
        );
    }
}
