//! Column-to-field mapping produced for one uploaded file.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::taxonomy::Field;

/// One original column and the canonical field it was assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub column: String,
    pub field: Field,
}

/// Ordered `column -> field` mapping.
///
/// Keys are unique and keep the original column order. Serializes as a JSON
/// object, e.g. `{"Email Address": "email"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    entries: Vec<MappingEntry>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column. The first occurrence of a column name wins; later
    /// duplicates are ignored and `false` is returned.
    pub fn insert(&mut self, column: impl Into<String>, field: Field) -> bool {
        let column = column.into();
        if self.contains_column(&column) {
            return false;
        }
        self.entries.push(MappingEntry { column, field });
        true
    }

    pub fn get(&self, column: &str) -> Option<Field> {
        self.entries
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| entry.field)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.entries.iter().any(|entry| entry.column == column)
    }

    /// Columns assigned to `field`, in column order.
    pub fn columns_for(&self, field: Field) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |entry| entry.field == field)
            .map(|entry| entry.column.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Field)> {
        self.entries
            .iter()
            .map(|entry| (entry.column.as_str(), entry.field))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.column.as_str())
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Field)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        let mut mapping = ColumnMapping::new();
        for (column, field) in iter {
            mapping.insert(column, field);
        }
        mapping
    }
}

impl Serialize for ColumnMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.column, &entry.field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = ColumnMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of column names to field names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = ColumnMapping::new();
                while let Some((column, field)) = access.next_entry::<String, Field>()? {
                    mapping.insert(column, field);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}
