use crate::docs::{escape_html, page_end, page_start, stat_box, status_badge};
use super::profiler::{ColumnProfile, ProfilingResult};

/// Standalone HTML profiling report: overview, one section per column and
/// the generated expectations with their outcome.
pub fn render_profiling_page(result: &ProfilingResult) -> String {
    let profile = &result.profile;
    let mut html = page_start(
        &format!("Profiling Report: {}", result.suite.name()),
        None,
    );

    html.push_str("<h2>Overview</h2>\n<div class=\"stats\">\n");
    html.push_str(&stat_box("rows", &profile.row_count.to_string()));
    html.push_str(&stat_box("columns", &profile.column_count.to_string()));
    html.push_str(&stat_box("expectations", &result.suite.len().to_string()));
    let missing_cells: usize = profile.columns.iter().map(|c| c.null_count).sum();
    html.push_str(&stat_box("missing cells", &missing_cells.to_string()));
    html.push_str("</div>\n");

    html.push_str("<h2>Columns</h2>\n");
    html.push_str("<table>\n<thead><tr><th>Column</th><th>Type</th><th>Missing</th><th>Distinct</th><th>Min</th><th>Max</th><th>Mean</th><th>Median</th><th>Std dev</th></tr></thead>\n<tbody>\n");
    for column in &profile.columns {
        html.push_str(&overview_row(column));
    }
    html.push_str("</tbody>\n</table>\n");

    for column in &profile.columns {
        html.push_str(&format!("<h3>{}</h3>\n", escape_html(&column.name)));
        if column.top_values.is_empty() {
            html.push_str("<p class=\"muted\">No non-null values.</p>\n");
            continue;
        }
        html.push_str("<table>\n<thead><tr><th>Value</th><th>Count</th></tr></thead>\n<tbody>\n");
        for vc in &column.top_values {
            let value = match &vc.value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(&value),
                vc.count
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str("<h2>Generated Expectations</h2>\n");
    html.push_str("<table>\n<thead><tr><th>Status</th><th>Expectation</th></tr></thead>\n<tbody>\n");
    for r in &result.validation.results {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            status_badge(r.success),
            escape_html(&r.expectation_config.expectation.describe())
        ));
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str(&page_end());
    html
}

fn overview_row(column: &ColumnProfile) -> String {
    let fmt = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_default();
    let numeric = column.numeric.as_ref();
    format!(
        "<tr><td>{}</td><td>{}</td><td>{} ({:.1}%)</td><td>{} ({:.1}%)</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape_html(&column.name),
        column.column_type,
        column.null_count,
        column.null_percent,
        column.distinct_count,
        column.distinct_percent,
        fmt(numeric.map(|n| n.min)),
        fmt(numeric.map(|n| n.max)),
        fmt(numeric.map(|n| n.mean)),
        fmt(numeric.map(|n| n.median)),
        fmt(numeric.map(|n| n.std_dev)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnType, DataFrame, Value};
    use crate::profile::BasicDatasetProfiler;

    #[test]
    fn test_page_has_overview_and_columns() {
        let frame = DataFrame::new(vec![Column::new(
            "note<x>",
            ColumnType::String,
            vec![Value::Str("a&b".into()), Value::Null],
        )])
        .unwrap();
        let result = BasicDatasetProfiler::profile(&frame, "notes.profile", "batch");
        let html = render_profiling_page(&result);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Profiling Report: notes.profile"));
        assert!(html.contains("<h3>note&lt;x&gt;</h3>"));
        assert!(html.contains("a&amp;b"));
        assert!(html.contains("1 (50.0%)"));
    }
}
