use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every filter operator the builder understands. The serialized form is
/// the suffix used in query-parameter keys (`age_gte`, `tags_overlap`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
    In,
    NotIn,
    Between,
    NotBetween,
    DateRange,
    MonthYear,
    Year,
    IsNull,
    IsNotNull,
    Regexp,
    NotRegexp,
    IRegexp,
    NotIRegexp,
    Any,
    All,
    Is,
    Not,
    JsonContains,
    JsonContained,
    JsonKeyExists,
    JsonAnyKeyExists,
    JsonAllKeysExist,
    /// `<f>->>$n = $m`. The `{path, value}` pair binds the key then the
    /// expected text; no space sits between the field and `->>`.
    JsonPath,
    /// `<f>@? $n::jsonpath`. The parameter is an SQL/JSON path, so it is cast
    /// to `jsonpath` rather than `jsonb`.
    JsonPathText,
    /// `<f>#>>$n = $m`. The path is bound as a `text[]`, followed by the
    /// expected text.
    JsonEq,
    Overlap,
    Contained,
    ContainsArray,
    Fts,
    FtsPlain,
    FtsPhrase,
    FtsWeb,
    CiEq,
    CiNe,
    Col,
    IsTrue,
    IsFalse,
    DistinctFrom,
    NotDistinctFrom,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 50] = [
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Like,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Between,
        FilterOperator::NotBetween,
        FilterOperator::DateRange,
        FilterOperator::MonthYear,
        FilterOperator::Year,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
        FilterOperator::Regexp,
        FilterOperator::NotRegexp,
        FilterOperator::IRegexp,
        FilterOperator::NotIRegexp,
        FilterOperator::Any,
        FilterOperator::All,
        FilterOperator::Is,
        FilterOperator::Not,
        FilterOperator::JsonContains,
        FilterOperator::JsonContained,
        FilterOperator::JsonKeyExists,
        FilterOperator::JsonAnyKeyExists,
        FilterOperator::JsonAllKeysExist,
        FilterOperator::JsonPath,
        FilterOperator::JsonPathText,
        FilterOperator::JsonEq,
        FilterOperator::Overlap,
        FilterOperator::Contained,
        FilterOperator::ContainsArray,
        FilterOperator::Fts,
        FilterOperator::FtsPlain,
        FilterOperator::FtsPhrase,
        FilterOperator::FtsWeb,
        FilterOperator::CiEq,
        FilterOperator::CiNe,
        FilterOperator::Col,
        FilterOperator::IsTrue,
        FilterOperator::IsFalse,
        FilterOperator::DistinctFrom,
        FilterOperator::NotDistinctFrom,
    ];

    /// Name as it appears in a parameter-key suffix.
    pub fn name(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "notContains",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
            FilterOperator::Between => "between",
            FilterOperator::NotBetween => "notBetween",
            FilterOperator::DateRange => "dateRange",
            FilterOperator::MonthYear => "monthYear",
            FilterOperator::Year => "year",
            FilterOperator::IsNull => "isNull",
            FilterOperator::IsNotNull => "isNotNull",
            FilterOperator::Regexp => "regexp",
            FilterOperator::NotRegexp => "notRegexp",
            FilterOperator::IRegexp => "iRegexp",
            FilterOperator::NotIRegexp => "notIRegexp",
            FilterOperator::Any => "any",
            FilterOperator::All => "all",
            FilterOperator::Is => "is",
            FilterOperator::Not => "not",
            FilterOperator::JsonContains => "jsonContains",
            FilterOperator::JsonContained => "jsonContained",
            FilterOperator::JsonKeyExists => "jsonKeyExists",
            FilterOperator::JsonAnyKeyExists => "jsonAnyKeyExists",
            FilterOperator::JsonAllKeysExist => "jsonAllKeysExist",
            FilterOperator::JsonPath => "jsonPath",
            FilterOperator::JsonPathText => "jsonPathText",
            FilterOperator::JsonEq => "jsonEq",
            FilterOperator::Overlap => "overlap",
            FilterOperator::Contained => "contained",
            FilterOperator::ContainsArray => "containsArray",
            FilterOperator::Fts => "fts",
            FilterOperator::FtsPlain => "ftsPlain",
            FilterOperator::FtsPhrase => "ftsPhrase",
            FilterOperator::FtsWeb => "ftsWeb",
            FilterOperator::CiEq => "ciEq",
            FilterOperator::CiNe => "ciNe",
            FilterOperator::Col => "col",
            FilterOperator::IsTrue => "isTrue",
            FilterOperator::IsFalse => "isFalse",
            FilterOperator::DistinctFrom => "distinctFrom",
            FilterOperator::NotDistinctFrom => "notDistinctFrom",
        }
    }

    pub fn is_full_text(&self) -> bool {
        matches!(
            self,
            FilterOperator::Fts
                | FilterOperator::FtsPlain
                | FilterOperator::FtsPhrase
                | FilterOperator::FtsWeb
        )
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A filter resolved from a query-parameter key, ready for emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}
