use super::schema::ColumnType;
use super::value::{parse_bool, parse_number, parse_timestamp};

/// Streaming per-column type inference over raw CSV cells.
///
/// Types only ever widen: integer to double, everything else to string.
/// A column that never sees a non-empty cell is inferred as string.
#[derive(Debug, Clone, Default)]
pub struct TypeInference {
    current: Option<ColumnType>,
}

impl TypeInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, raw: &str) {
        if raw.is_empty() || self.current == Some(ColumnType::String) {
            return;
        }

        let observed = classify(raw);
        self.current = Some(match self.current {
            None => observed,
            Some(current) => widen(current, observed),
        });
    }

    pub fn finish(&self) -> ColumnType {
        self.current.unwrap_or(ColumnType::String)
    }
}

pub fn infer_column_type<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
    let mut inference = TypeInference::new();
    for cell in cells {
        inference.observe(cell);
    }
    inference.finish()
}

fn classify(raw: &str) -> ColumnType {
    let trimmed = raw.trim();
    if trimmed.parse::<i64>().is_ok() {
        ColumnType::Integer
    } else if parse_number(trimmed).is_some() {
        ColumnType::Double
    } else if parse_bool(trimmed).is_some() {
        ColumnType::Boolean
    } else if parse_timestamp(trimmed).is_some() {
        ColumnType::Timestamp
    } else {
        ColumnType::String
    }
}

fn widen(current: ColumnType, observed: ColumnType) -> ColumnType {
    match (current, observed) {
        (a, b) if a == b => a,
        (ColumnType::Integer, ColumnType::Double) | (ColumnType::Double, ColumnType::Integer) => {
            ColumnType::Double
        }
        _ => ColumnType::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_column() {
        assert_eq!(infer_column_type(["1", "2", "", "3"]), ColumnType::Integer);
    }

    #[test]
    fn test_integer_widens_to_double() {
        assert_eq!(infer_column_type(["1", "2.5", "3"]), ColumnType::Double);
    }

    #[test]
    fn test_mixed_falls_back_to_string() {
        assert_eq!(infer_column_type(["1", "N", "3"]), ColumnType::String);
        assert_eq!(infer_column_type(["true", "1"]), ColumnType::String);
    }

    #[test]
    fn test_timestamp_and_boolean() {
        assert_eq!(
            infer_column_type(["2019-01-01 00:46:40", "2019-01-01T01:00:00"]),
            ColumnType::Timestamp
        );
        assert_eq!(infer_column_type(["True", "false"]), ColumnType::Boolean);
    }

    #[test]
    fn test_all_empty_is_string() {
        assert_eq!(infer_column_type(["", ""]), ColumnType::String);
        assert_eq!(infer_column_type(Vec::<&str>::new()), ColumnType::String);
    }
}
