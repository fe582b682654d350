//! Record and collection types
//!
//! A record is a flat JSON object. The only key the service cares about is `id`,
//! a string holding a decimal integer. Field order is kept as written, so a
//! document survives a load and save untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which every record stores its identifier
pub const ID_KEY: &str = "id";

/// Field map carried by request payloads
pub type Fields = Map<String, Value>;

/// Ordered sequence of records, the unit of persistence
pub type Collection = Vec<Record>;

/// A single user-like JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Fields);

impl Record {
    /// Build a record with `id` as its first field, followed by the caller fields.
    ///
    /// The assigned id replaces any `id` the caller supplied.
    pub fn with_id(fields: Fields, id: impl Into<String>) -> Self {
        let mut record = Fields::with_capacity(fields.len() + 1);
        record.insert(ID_KEY.to_string(), Value::String(id.into()));
        record.extend(fields.into_iter().filter(|(key, _)| key != ID_KEY));
        Self(record)
    }

    /// The record's id, if it is a string
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_KEY).and_then(Value::as_str)
    }

    /// The record's id parsed as a non-negative decimal integer.
    ///
    /// Only ASCII digits qualify; signs and whitespace do not.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id()
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|id| id.parse().ok())
    }

    /// Shallow merge: keys in `fields` overwrite existing keys in place, `id`
    /// included; new keys go after the existing ones.
    pub fn merge(&mut self, fields: Fields) {
        self.0.extend(fields);
    }

    /// Look up a single field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}
