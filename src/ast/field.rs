use serde::{Deserialize, Serialize};

/// Declared type of a mapped field. Drives default operators and casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Number,
    Smallint,
    Bigint,
    Float,
    Double,
    Money,
    Boolean,
    Date,
    Timestamp,
    Uuid,
    Json,
    Jsonb,
    Array,
    Bytea,
    Xml,
    Inet,
    Tsvector,
    Interval,
}

impl FieldType {
    /// Operator used when a filter key names the field without a suffix.
    pub fn default_operator(&self) -> &'static str {
        match self {
            FieldType::String => "like",
            FieldType::Boolean => "isTrue",
            FieldType::Uuid | FieldType::Number => "eq",
            FieldType::Date | FieldType::Timestamp => "dateRange",
            FieldType::Jsonb => "jsonContains",
            FieldType::Array => "containsArray",
            FieldType::Tsvector => "fts",
            _ => "eq",
        }
    }

    /// Cast appended to the column in plain comparisons.
    pub fn cast_suffix(&self) -> &'static str {
        match self {
            FieldType::Date => "::date",
            FieldType::Timestamp => "::timestamp",
            FieldType::Jsonb => "::jsonb",
            FieldType::Array => "::text[]",
            _ => "",
        }
    }
}

/// Maps a logical field name onto a physical column or SQL expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    pub expression: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub computed: bool,
}

impl FieldMapping {
    pub fn new(
        name: impl Into<String>,
        expression: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            field_type,
            computed: false,
        }
    }

    /// Marks the field as selection-only even if its expression looks plain.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// True for derived expressions (`CASE ...`, sub-selects) or fields
    /// explicitly marked computed.
    pub fn is_computed(&self) -> bool {
        if self.computed {
            return true;
        }
        let upper = self.expression.to_ascii_uppercase();
        contains_keyword(&upper, "CASE") || contains_keyword(&upper, "SELECT")
    }

    /// Column name a SELECT emits for this field: the bare column of a
    /// `table.col` expression, or the logical name for anything else.
    pub fn output_column(&self) -> &str {
        if self.is_computed() {
            return &self.name;
        }
        let column = self
            .expression
            .rsplit_once('.')
            .map(|(_, col)| col)
            .unwrap_or(&self.expression);
        let is_plain = !column.is_empty()
            && column
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_plain {
            column
        } else {
            &self.name
        }
    }
}

/// Whole-word match, so `t.case_id` or `t.selected_at` do not count.
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    haystack.match_indices(keyword).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + keyword.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_operator_by_type() {
        assert_eq!(FieldType::String.default_operator(), "like");
        assert_eq!(FieldType::Boolean.default_operator(), "isTrue");
        assert_eq!(FieldType::Uuid.default_operator(), "eq");
        assert_eq!(FieldType::Timestamp.default_operator(), "dateRange");
        assert_eq!(FieldType::Jsonb.default_operator(), "jsonContains");
        assert_eq!(FieldType::Array.default_operator(), "containsArray");
        assert_eq!(FieldType::Tsvector.default_operator(), "fts");
        assert_eq!(FieldType::Inet.default_operator(), "eq");
    }

    #[test]
    fn test_cast_suffix() {
        assert_eq!(FieldType::Date.cast_suffix(), "::date");
        assert_eq!(FieldType::Array.cast_suffix(), "::text[]");
        assert_eq!(FieldType::String.cast_suffix(), "");
    }

    #[test]
    fn test_is_computed() {
        let plain = FieldMapping::new("name", "u.name", FieldType::String);
        assert!(!plain.is_computed());

        let case = FieldMapping::new(
            "label",
            "case when u.active then 'on' else 'off' end",
            FieldType::String,
        );
        assert!(case.is_computed());

        let sub = FieldMapping::new(
            "orderCount",
            "(SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id)",
            FieldType::Number,
        );
        assert!(sub.is_computed());

        let marked = FieldMapping::new("score", "u.score", FieldType::Number).computed();
        assert!(marked.is_computed());
    }

    #[test]
    fn test_keyword_inside_identifier_is_plain() {
        for expression in ["t.case_id", "t.selected_at", "t.showcase", "t.selection", "t.usecases"] {
            let mapping = FieldMapping::new("f", expression, FieldType::String);
            assert!(!mapping.is_computed(), "{expression}");
        }

        let case_id = FieldMapping::new("caseId", "t.case_id", FieldType::Uuid);
        assert_eq!(case_id.output_column(), "case_id");

        let nested = FieldMapping::new(
            "latest",
            "(select max(x.at) from x where x.case_id = t.id)",
            FieldType::Timestamp,
        );
        assert!(nested.is_computed());

        let bare = FieldMapping::new("tier", "CASE t.level WHEN 1 THEN 'a' END", FieldType::String);
        assert!(bare.is_computed());
    }

    #[test]
    fn test_output_column() {
        let plain = FieldMapping::new("firstName", "u.first_name", FieldType::String);
        assert_eq!(plain.output_column(), "first_name");

        let bare = FieldMapping::new("id", "id", FieldType::Uuid);
        assert_eq!(bare.output_column(), "id");

        let expr = FieldMapping::new("lowerEmail", "lower(u.email)", FieldType::String);
        assert_eq!(expr.output_column(), "lowerEmail");
    }

    #[test]
    fn test_field_type_serialization() {
        let json = serde_json::to_string(&FieldType::Tsvector).unwrap();
        assert_eq!(json, "\"tsvector\"");
        let parsed: FieldType = serde_json::from_str("\"jsonb\"").unwrap();
        assert_eq!(parsed, FieldType::Jsonb);
    }
}
