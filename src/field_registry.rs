//! Logical field → physical expression lookup.
//!
//! Built once per resource and shared read-only by every builder.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{FieldMapping, FieldType};
use crate::error::SqlError;

/// Ordered set of field mappings keyed by logical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldMapping>", into = "Vec<FieldMapping>")]
pub struct FieldRegistry {
    fields: Vec<FieldMapping>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, rejecting duplicate logical names.
    pub fn from_mappings(mappings: Vec<FieldMapping>) -> Result<Self, SqlError> {
        let mut registry = Self::new();
        for mapping in mappings {
            registry.insert(mapping)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, mapping: FieldMapping) -> Result<(), SqlError> {
        if self.index.contains_key(&mapping.name) {
            return Err(SqlError::DuplicateField(mapping.name));
        }
        self.index.insert(mapping.name.clone(), self.fields.len());
        self.fields.push(mapping);
        Ok(())
    }

    /// Chainable insert for literal registries.
    pub fn with_field(
        mut self,
        name: &str,
        expression: &str,
        field_type: FieldType,
    ) -> Result<Self, SqlError> {
        self.insert(FieldMapping::new(name, expression, field_type))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldMapping> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn require(&self, name: &str) -> Result<&FieldMapping, SqlError> {
        self.get(name)
            .ok_or_else(|| SqlError::UnknownField(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Result column for `mapping` in a SELECT. The bare column is kept unless
    /// another field would produce the same name, in which case the logical
    /// name is used instead.
    pub fn output_column<'a>(&self, mapping: &'a FieldMapping) -> &'a str {
        let column = mapping.output_column();
        let clashes = self
            .fields
            .iter()
            .filter(|other| other.name != mapping.name)
            .any(|other| other.output_column() == column || other.name == column);
        if clashes {
            &mapping.name
        } else {
            column
        }
    }

    /// Finds the mapping whose physical expression is exactly `expression`.
    pub fn by_expression(&self, expression: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.expression == expression)
    }
}

impl TryFrom<Vec<FieldMapping>> for FieldRegistry {
    type Error = SqlError;

    fn try_from(mappings: Vec<FieldMapping>) -> Result<Self, Self::Error> {
        Self::from_mappings(mappings)
    }
}

impl From<FieldRegistry> for Vec<FieldMapping> {
    fn from(registry: FieldRegistry) -> Self {
        registry.fields
    }
}
