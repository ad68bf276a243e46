use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::dataset::ColumnType;
use crate::error::{DqError, Result};

/// A stored expectation: the check itself plus free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationConfig {
    #[serde(flatten)]
    pub expectation: Expectation,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl ExpectationConfig {
    pub fn new(expectation: Expectation) -> Self {
        Self {
            expectation,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn expectation_type(&self) -> &'static str {
        self.expectation.expectation_type()
    }

    pub fn column(&self) -> Option<&str> {
        self.expectation.column()
    }

    /// Two configurations with the same type and column replace each other in a suite.
    pub fn is_equivalent_to(&self, other: &ExpectationConfig) -> bool {
        self.expectation_type() == other.expectation_type() && self.column() == other.column()
    }
}

impl From<Expectation> for ExpectationConfig {
    fn from(expectation: Expectation) -> Self {
        Self::new(expectation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expectation_type", rename_all = "snake_case")]
pub enum Expectation {
    ExpectTableRowCountToBeBetween {
        #[serde(default)]
        min_value: Option<u64>,
        #[serde(default)]
        max_value: Option<u64>,
    },

    ExpectTableColumnsToMatchOrderedList {
        column_list: Vec<String>,
    },

    ExpectColumnToExist {
        column: String,
    },

    ExpectColumnValuesToNotBeNull {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mostly: Option<f64>,
    },

    ExpectColumnValuesToBeNull {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mostly: Option<f64>,
    },

    ExpectColumnValuesToBeBetween {
        column: String,
        #[serde(default)]
        min_value: Option<f64>,
        #[serde(default)]
        max_value: Option<f64>,
        #[serde(default)]
        strict_min: bool,
        #[serde(default)]
        strict_max: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mostly: Option<f64>,
    },

    ExpectColumnValuesToBeInSet {
        column: String,
        value_set: Vec<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mostly: Option<f64>,
    },

    ExpectColumnValuesToBeUnique {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mostly: Option<f64>,
    },

    ExpectColumnValuesToBeInTypeList {
        column: String,
        type_list: Vec<ColumnType>,
    },

    ExpectColumnMeanToBeBetween {
        column: String,
        #[serde(default)]
        min_value: Option<f64>,
        #[serde(default)]
        max_value: Option<f64>,
    },

    ExpectColumnUniqueValueCountToBeBetween {
        column: String,
        #[serde(default)]
        min_value: Option<u64>,
        #[serde(default)]
        max_value: Option<u64>,
    },
}

impl Expectation {
    pub fn not_null(column: impl Into<String>) -> Self {
        Expectation::ExpectColumnValuesToNotBeNull {
            column: column.into(),
            mostly: None,
        }
    }

    pub fn between(column: impl Into<String>, min_value: Option<f64>, max_value: Option<f64>) -> Self {
        Expectation::ExpectColumnValuesToBeBetween {
            column: column.into(),
            min_value,
            max_value,
            strict_min: false,
            strict_max: false,
            mostly: None,
        }
    }

    pub fn expectation_type(&self) -> &'static str {
        match self {
            Expectation::ExpectTableRowCountToBeBetween { .. } => "expect_table_row_count_to_be_between",
            Expectation::ExpectTableColumnsToMatchOrderedList { .. } => "expect_table_columns_to_match_ordered_list",
            Expectation::ExpectColumnToExist { .. } => "expect_column_to_exist",
            Expectation::ExpectColumnValuesToNotBeNull { .. } => "expect_column_values_to_not_be_null",
            Expectation::ExpectColumnValuesToBeNull { .. } => "expect_column_values_to_be_null",
            Expectation::ExpectColumnValuesToBeBetween { .. } => "expect_column_values_to_be_between",
            Expectation::ExpectColumnValuesToBeInSet { .. } => "expect_column_values_to_be_in_set",
            Expectation::ExpectColumnValuesToBeUnique { .. } => "expect_column_values_to_be_unique",
            Expectation::ExpectColumnValuesToBeInTypeList { .. } => "expect_column_values_to_be_in_type_list",
            Expectation::ExpectColumnMeanToBeBetween { .. } => "expect_column_mean_to_be_between",
            Expectation::ExpectColumnUniqueValueCountToBeBetween { .. } => {
                "expect_column_unique_value_count_to_be_between"
            }
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            Expectation::ExpectTableRowCountToBeBetween { .. }
            | Expectation::ExpectTableColumnsToMatchOrderedList { .. } => None,
            Expectation::ExpectColumnToExist { column }
            | Expectation::ExpectColumnValuesToNotBeNull { column, .. }
            | Expectation::ExpectColumnValuesToBeNull { column, .. }
            | Expectation::ExpectColumnValuesToBeBetween { column, .. }
            | Expectation::ExpectColumnValuesToBeInSet { column, .. }
            | Expectation::ExpectColumnValuesToBeUnique { column, .. }
            | Expectation::ExpectColumnValuesToBeInTypeList { column, .. }
            | Expectation::ExpectColumnMeanToBeBetween { column, .. }
            | Expectation::ExpectColumnUniqueValueCountToBeBetween { column, .. } => Some(column),
        }
    }

    pub fn mostly(&self) -> Option<f64> {
        match self {
            Expectation::ExpectColumnValuesToNotBeNull { mostly, .. }
            | Expectation::ExpectColumnValuesToBeNull { mostly, .. }
            | Expectation::ExpectColumnValuesToBeBetween { mostly, .. }
            | Expectation::ExpectColumnValuesToBeInSet { mostly, .. }
            | Expectation::ExpectColumnValuesToBeUnique { mostly, .. } => *mostly,
            _ => None,
        }
    }

    /// Reject configurations that cannot be evaluated.
    pub fn validate(&self) -> Result<()> {
        if let Some(mostly) = self.mostly() {
            if !(0.0..=1.0).contains(&mostly) {
                return Err(DqError::InvalidExpectation(format!(
                    "{}: mostly must be between 0 and 1, got {}",
                    self.expectation_type(),
                    mostly
                )));
            }
        }

        if let Some(column) = self.column() {
            if column.is_empty() {
                return Err(DqError::InvalidExpectation(format!(
                    "{}: column must not be empty",
                    self.expectation_type()
                )));
            }
        }

        match self {
            Expectation::ExpectColumnValuesToBeBetween { min_value: None, max_value: None, .. } => {
                Err(DqError::InvalidExpectation(format!(
                    "{}: min_value and max_value cannot both be None",
                    self.expectation_type()
                )))
            }
            Expectation::ExpectColumnValuesToBeBetween { min_value, max_value, .. }
            | Expectation::ExpectColumnMeanToBeBetween { min_value, max_value, .. } => {
                check_bounds(self.expectation_type(), *min_value, *max_value)
            }
            Expectation::ExpectTableRowCountToBeBetween { min_value, max_value }
            | Expectation::ExpectColumnUniqueValueCountToBeBetween { min_value, max_value, .. } => {
                check_bounds(self.expectation_type(), *min_value, *max_value)
            }
            Expectation::ExpectColumnValuesToBeInTypeList { type_list, .. } if type_list.is_empty() => {
                Err(DqError::InvalidExpectation(format!(
                    "{}: type_list must not be empty",
                    self.expectation_type()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Human-readable rendering used by data docs.
    pub fn describe(&self) -> String {
        match self {
            Expectation::ExpectTableRowCountToBeBetween { min_value, max_value } => {
                format!("Must have {} rows.", describe_range(min_value.map(|v| v as f64), max_value.map(|v| v as f64), false, false))
            }
            Expectation::ExpectTableColumnsToMatchOrderedList { column_list } => {
                format!("Must have these columns in this order: {}.", column_list.join(", "))
            }
            Expectation::ExpectColumnToExist { column } => format!("{} is a required field.", column),
            Expectation::ExpectColumnValuesToNotBeNull { column, mostly } => {
                format!("{} values must never be null{}.", column, describe_mostly(*mostly))
            }
            Expectation::ExpectColumnValuesToBeNull { column, mostly } => {
                format!("{} values must be null{}.", column, describe_mostly(*mostly))
            }
            Expectation::ExpectColumnValuesToBeBetween { column, min_value, max_value, strict_min, strict_max, mostly } => {
                format!(
                    "{} values must be {}{}.",
                    column,
                    describe_range(*min_value, *max_value, *strict_min, *strict_max),
                    describe_mostly(*mostly)
                )
            }
            Expectation::ExpectColumnValuesToBeInSet { column, value_set, mostly } => {
                let values: Vec<String> = value_set.iter().map(|v| v.to_string()).collect();
                format!("{} values must belong to this set: {}{}.", column, values.join(", "), describe_mostly(*mostly))
            }
            Expectation::ExpectColumnValuesToBeUnique { column, mostly } => {
                format!("{} values must be unique{}.", column, describe_mostly(*mostly))
            }
            Expectation::ExpectColumnValuesToBeInTypeList { column, type_list } => {
                let types: Vec<&str> = type_list.iter().map(|t| t.as_str()).collect();
                format!("{} value types must belong to this set: {}.", column, types.join(", "))
            }
            Expectation::ExpectColumnMeanToBeBetween { column, min_value, max_value } => {
                format!("{} mean must be {}.", column, describe_range(*min_value, *max_value, false, false))
            }
            Expectation::ExpectColumnUniqueValueCountToBeBetween { column, min_value, max_value } => {
                format!(
                    "{} must have {} unique values.",
                    column,
                    describe_range(min_value.map(|v| v as f64), max_value.map(|v| v as f64), false, false)
                )
            }
        }
    }
}

fn check_bounds<T: PartialOrd + std::fmt::Display>(
    expectation_type: &str,
    min_value: Option<T>,
    max_value: Option<T>,
) -> Result<()> {
    match (min_value, max_value) {
        (Some(min), Some(max)) if min > max => Err(DqError::InvalidExpectation(format!(
            "{}: min_value {} is greater than max_value {}",
            expectation_type, min, max
        ))),
        _ => Ok(()),
    }
}

fn describe_range(min: Option<f64>, max: Option<f64>, strict_min: bool, strict_max: bool) -> String {
    let lower = if strict_min { "greater than" } else { "greater than or equal to" };
    let upper = if strict_max { "less than" } else { "less than or equal to" };
    match (min, max) {
        (Some(min), Some(max)) => format!("{} {} and {} {}", lower, min, upper, max),
        (Some(min), None) => format!("{} {}", lower, min),
        (None, Some(max)) => format!("{} {}", upper, max),
        (None, None) => "any number of".to_string(),
    }
}

fn describe_mostly(mostly: Option<f64>) -> String {
    match mostly {
        Some(m) if m < 1.0 => format!(", at least {:.0}% of the time", m * 100.0),
        _ => String::new(),
    }
}
