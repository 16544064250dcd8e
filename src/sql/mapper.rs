use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::field_registry::FieldRegistry;

/// Renames result-row keys from output columns back to logical names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMapper {
    columns: HashMap<String, String>,
}

impl ResponseMapper {
    pub fn new(fields: &FieldRegistry) -> Self {
        let columns = fields
            .iter()
            .map(|mapping| (fields.output_column(mapping).to_string(), mapping.name.clone()))
            .collect();
        Self { columns }
    }

    pub fn logical_name(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Keys with no mapping pass through unchanged.
    pub fn map_row(&self, row: Map<String, Value>) -> Map<String, Value> {
        row.into_iter()
            .map(|(column, value)| match self.columns.get(&column) {
                Some(name) => (name.clone(), value),
                None => (column, value),
            })
            .collect()
    }

    pub fn map_rows(&self, rows: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
        rows.into_iter().map(|row| self.map_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FieldMapping, FieldType};
    use serde_json::json;

    fn fields() -> FieldRegistry {
        FieldRegistry::from_mappings(vec![
            FieldMapping::new("id", "t.id", FieldType::Uuid),
            FieldMapping::new("createdAt", "t.created_at", FieldType::Timestamp),
            FieldMapping::new("ownerName", "o.name", FieldType::String),
            FieldMapping::new("fullName", "t.first || ' ' || t.last", FieldType::String),
            FieldMapping::new(
                "ageGroup",
                "CASE WHEN t.age >= 18 THEN 'adult' END",
                FieldType::String,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_map_row() {
        let mapper = ResponseMapper::new(&fields());
        let row = json!({
            "id": "1",
            "created_at": "2024-01-01",
            "name": "Ann",
            "fullName": "Ann Lee",
            "ageGroup": "adult",
            "extra": 7
        });
        let Value::Object(row) = row else { unreachable!() };

        let mapped = mapper.map_row(row);
        let keys: Vec<&str> = mapped.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["id", "createdAt", "ownerName", "fullName", "ageGroup", "extra"]
        );
        assert_eq!(mapped["createdAt"], "2024-01-01");
        assert_eq!(mapped["extra"], 7);
    }

    #[test]
    fn test_logical_name() {
        let mapper = ResponseMapper::new(&fields());
        assert_eq!(mapper.logical_name("created_at"), Some("createdAt"));
        assert_eq!(mapper.logical_name("unknown"), None);
    }

    #[test]
    fn test_map_rows() {
        let mapper = ResponseMapper::new(&fields());
        let mut row = Map::new();
        row.insert("created_at".into(), json!("x"));
        let mapped = mapper.map_rows(vec![row.clone(), row]);
        assert_eq!(mapped.len(), 2);
        assert!(mapped.iter().all(|r| r.contains_key("createdAt")));
    }

    #[test]
    fn test_shared_column_names_round_trip() {
        let fields = FieldRegistry::from_mappings(vec![
            FieldMapping::new("id", "t.id", FieldType::Uuid),
            FieldMapping::new("ownerId", "o.id", FieldType::Uuid),
        ])
        .unwrap();
        let mapper = ResponseMapper::new(&fields);
        let Value::Object(row) = json!({"id": "task-1", "ownerId": "user-9"}) else {
            unreachable!()
        };

        let mapped = mapper.map_row(row);
        assert_eq!(mapped["id"], "task-1");
        assert_eq!(mapped["ownerId"], "user-9");
        assert_eq!(mapper.logical_name("ownerId"), Some("ownerId"));
    }
}
