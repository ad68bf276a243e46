use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use crate::error::Result;
use crate::expectation::ExpectationSuite;

fn suite_json(suite: &ExpectationSuite) -> Result<String> {
    Ok(serde_json::to_string_pretty(suite)?)
}

pub fn format_text_diff(old_text: &str, new_text: &str) -> String {
    let diff = TextDiff::from_lines(old_text, new_text);
    let mut output = String::new();

    output.push_str(&"───────────────────────────────────────\n".dimmed().to_string());

    for change in diff.iter_all_changes() {
        let line = change.to_string();
        let formatted = match change.tag() {
            ChangeTag::Delete => format!("- {}", line.trim_end()).red().to_string(),
            ChangeTag::Insert => format!("+ {}", line.trim_end()).green().to_string(),
            ChangeTag::Equal => format!("  {}", line.trim_end()),
        };
        output.push_str(&formatted);
        output.push('\n');
    }

    output.push_str(&"───────────────────────────────────────".dimmed().to_string());

    output
}

/// Line diff of the two suites' JSON renderings.
pub fn format_suite_diff(old: &ExpectationSuite, new: &ExpectationSuite) -> Result<String> {
    Ok(format_text_diff(&suite_json(old)?, &suite_json(new)?))
}

/// Suite metadata (crate version and the like) does not count as a change.
pub fn has_changes(old: &ExpectationSuite, new: &ExpectationSuite) -> bool {
    old.expectation_suite_name != new.expectation_suite_name || old.expectations != new.expectations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::Expectation;

    fn suite() -> ExpectationSuite {
        let mut suite = ExpectationSuite::new("trips");
        suite.add_expectation(Expectation::not_null("passenger_count"));
        suite
    }

    #[test]
    fn test_has_changes_true() {
        let mut new = suite();
        new.add_expectation(Expectation::between("trip_distance", Some(0.0), Some(100.0)));
        assert!(has_changes(&suite(), &new));
    }

    #[test]
    fn test_has_changes_ignores_meta() {
        let mut new = suite();
        new.meta.insert("notes".to_string(), serde_json::json!("reviewed"));
        assert!(!has_changes(&suite(), &new));
    }

    #[test]
    fn test_format_diff_shows_changes() {
        colored::control::set_override(false);
        let mut new = suite();
        new.add_expectation(Expectation::between("trip_distance", Some(0.0), Some(100.0)));
        let diff = format_suite_diff(&suite(), &new).unwrap();
        assert!(diff.contains("+ "));
        assert!(diff.contains("trip_distance"));
        assert!(diff.contains("passenger_count"));
    }
}
