use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// A single attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AttributeValue {
    S(String),
    N(i64),
    Bool(bool),
    Null,
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::N(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Named attributes of a row, ordered by name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// One row of the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub partition_key: String,
    pub sort_key: String,
    pub attributes: Attributes,
}

impl Item {
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
            attributes: Attributes::new(),
        }
    }

    /// Set an attribute, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set an optional attribute; `None` leaves it unset.
    pub fn with_opt<V: Into<AttributeValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// A string attribute. Absent and `Null` read as `None`.
    pub fn get_str(&self, name: &str) -> IndexResult<Option<&str>> {
        match self.attributes.get(name) {
            None | Some(AttributeValue::Null) => Ok(None),
            Some(AttributeValue::S(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(type_error(name, "string")),
        }
    }

    /// A required string attribute.
    pub fn require_str(&self, name: &str) -> IndexResult<&str> {
        self.get_str(name)?.ok_or_else(|| IndexError::AttributeType {
            name: name.to_string(),
            expected: "present string",
        })
    }

    /// A numeric attribute. Absent and `Null` read as `None`.
    pub fn get_number(&self, name: &str) -> IndexResult<Option<i64>> {
        match self.attributes.get(name) {
            None | Some(AttributeValue::Null) => Ok(None),
            Some(AttributeValue::N(n)) => Ok(Some(*n)),
            Some(_) => Err(type_error(name, "number")),
        }
    }

    /// A boolean attribute. Absent and `Null` read as `false`.
    pub fn get_bool(&self, name: &str) -> IndexResult<bool> {
        match self.attributes.get(name) {
            None | Some(AttributeValue::Null) => Ok(false),
            Some(AttributeValue::Bool(b)) => Ok(*b),
            Some(_) => Err(type_error(name, "bool")),
        }
    }

    pub(crate) fn validate_keys(&self) -> IndexResult<()> {
        validate_keys(&self.partition_key, &self.sort_key)
    }
}

/// A single attribute mutation applied by `update_item`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeUpdate {
    Set(String, AttributeValue),
    Remove(String),
}

impl AttributeUpdate {
    pub fn set(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::Set(name.into(), value.into())
    }

    pub(crate) fn apply(&self, attributes: &mut Attributes) {
        match self {
            Self::Set(name, value) => {
                attributes.insert(name.clone(), value.clone());
            }
            Self::Remove(name) => {
                attributes.remove(name);
            }
        }
    }
}

pub(crate) fn validate_keys(partition_key: &str, sort_key: &str) -> IndexResult<()> {
    if partition_key.is_empty() {
        return Err(IndexError::InvalidKey {
            reason: "partition key must not be empty".into(),
        });
    }
    if sort_key.is_empty() {
        return Err(IndexError::InvalidKey {
            reason: "sort key must not be empty".into(),
        });
    }
    Ok(())
}

fn type_error(name: &str, expected: &'static str) -> IndexError {
    IndexError::AttributeType {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_typed_getters() {
        let item = Item::new("app", "000001")
            .with("hash", "abc")
            .with("deleted", false)
            .with("weight", 20i64)
            .with_opt("secondary", None::<String>);
        assert_eq!(item.get_str("hash").unwrap(), Some("abc"));
        assert!(!item.get_bool("deleted").unwrap());
        assert_eq!(item.get_number("weight").unwrap(), Some(20));
        assert!(item.get("secondary").is_none());
        assert_eq!(item.get_str("missing").unwrap(), None);
    }

    #[test]
    fn wrong_type_is_an_error() {
        let item = Item::new("app", "LATEST").with("deleted", "yes");
        assert!(matches!(
            item.get_bool("deleted"),
            Err(IndexError::AttributeType { .. })
        ));
        assert!(item.require_str("absent").is_err());
    }

    #[test]
    fn null_reads_as_absent() {
        let item = Item::new("app", "LATEST").with("secondary", AttributeValue::Null);
        assert_eq!(item.get_str("secondary").unwrap(), None);
        assert_eq!(item.get_number("secondary").unwrap(), None);
    }

    #[test]
    fn updates_apply_in_order() {
        let mut attrs = Attributes::new();
        AttributeUpdate::set("deleted", true).apply(&mut attrs);
        AttributeUpdate::set("hash", "x").apply(&mut attrs);
        AttributeUpdate::Remove("hash".into()).apply(&mut attrs);
        assert_eq!(attrs.get("deleted"), Some(&AttributeValue::Bool(true)));
        assert!(!attrs.contains_key("hash"));
    }

    #[test]
    fn empty_keys_rejected() {
        assert!(Item::new("", "x").validate_keys().is_err());
        assert!(Item::new("x", "").validate_keys().is_err());
        assert!(Item::new("x", "y").validate_keys().is_ok());
    }

    #[test]
    fn attribute_values_serialize_tagged() {
        let item = Item::new("app", "000001").with("deleted", true).with("weight", 5i64);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["attributes"]["deleted"]["type"], "Bool");
        assert_eq!(json["attributes"]["weight"]["value"], 5);
        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
