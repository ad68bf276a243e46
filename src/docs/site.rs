use std::path::{Path, PathBuf};
use tracing::info;
use crate::error::Result;
use crate::expectation::{ExpectationSuite, ExpectationValidationResult, ValidationResult};
use crate::store::{write_bytes_atomic, ValidationResultIdentifier};
use super::html::{escape_html, page_end, page_start, stat_box, status_badge, up_levels};

pub const INDEX_PAGE: &str = "index.html";

#[derive(Debug, Clone, Default)]
pub struct DataDocsBuildReport {
    pub index: PathBuf,
    pub suite_pages: Vec<PathBuf>,
    pub validation_pages: Vec<PathBuf>,
}

impl DataDocsBuildReport {
    pub fn page_count(&self) -> usize {
        1 + self.suite_pages.len() + self.validation_pages.len()
    }
}

/// The local static site: an index, one page per suite and one per stored
/// validation result.
#[derive(Debug, Clone)]
pub struct DataDocsSite {
    root: PathBuf,
}

impl DataDocsSite {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_PAGE)
    }

    pub fn suite_page_path(&self, suite_name: &str) -> PathBuf {
        self.root.join(suite_page_relative(suite_name))
    }

    pub fn validation_page_path(&self, id: &ValidationResultIdentifier) -> PathBuf {
        self.root.join("validations").join(id.relative_path("html"))
    }

    pub fn write_suite_page(&self, suite: &ExpectationSuite) -> Result<PathBuf> {
        let path = self.suite_page_path(suite.name());
        write_bytes_atomic(&path, render_suite_page(suite).as_bytes())?;
        Ok(path)
    }

    pub fn write_validation_page(&self, result: &ValidationResult) -> Result<PathBuf> {
        let id = ValidationResultIdentifier::from_result(result);
        let path = self.validation_page_path(&id);
        write_bytes_atomic(&path, render_validation_page(result).as_bytes())?;
        Ok(path)
    }

    pub fn write_index(&self, suites: &[ExpectationSuite], validations: &[ValidationResult]) -> Result<PathBuf> {
        let path = self.index_path();
        write_bytes_atomic(&path, render_index(suites, validations).as_bytes())?;
        Ok(path)
    }

    /// Render every page from scratch.
    pub fn build(&self, suites: &[ExpectationSuite], validations: &[ValidationResult]) -> Result<DataDocsBuildReport> {
        let suite_pages = suites
            .iter()
            .map(|s| self.write_suite_page(s))
            .collect::<Result<Vec<_>>>()?;
        let validation_pages = validations
            .iter()
            .map(|v| self.write_validation_page(v))
            .collect::<Result<Vec<_>>>()?;
        let index = self.write_index(suites, validations)?;

        let report = DataDocsBuildReport {
            index,
            suite_pages,
            validation_pages,
        };
        info!("Built data docs at {} ({} pages)", self.root.display(), report.page_count());
        Ok(report)
    }
}

fn suite_page_relative(suite_name: &str) -> PathBuf {
    PathBuf::from("expectations").join(format!("{}.html", suite_name))
}

fn validation_page_relative(id: &ValidationResultIdentifier) -> PathBuf {
    PathBuf::from("validations").join(id.relative_path("html"))
}

fn href(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn render_index(suites: &[ExpectationSuite], validations: &[ValidationResult]) -> String {
    let mut html = page_start("Data Docs", None);

    html.push_str("<h2>Expectation Suites</h2>\n");
    if suites.is_empty() {
        html.push_str("<p class=\"muted\">No expectation suites.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Suite</th><th>Expectations</th></tr></thead>\n<tbody>\n");
        for suite in suites {
            html.push_str(&format!(
                "<tr><td><a href=\"{}\">{}</a></td><td>{}</td></tr>\n",
                escape_html(&href(&suite_page_relative(suite.name()))),
                escape_html(suite.name()),
                suite.len()
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    let mut ordered: Vec<&ValidationResult> = validations.iter().collect();
    ordered.sort_by_key(|v| std::cmp::Reverse(run_time_of(v)));

    html.push_str("<h2>Validation Results</h2>\n");
    if ordered.is_empty() {
        html.push_str("<p class=\"muted\">No validation results.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Run time</th><th>Run name</th><th>Suite</th><th>Batch</th><th>Status</th><th>Passed</th></tr></thead>\n<tbody>\n");
        for result in ordered {
            let id = ValidationResultIdentifier::from_result(result);
            html.push_str(&format!(
                "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}/{}</td></tr>\n",
                escape_html(&href(&validation_page_relative(&id))),
                escape_html(&run_time_of(result).to_rfc3339()),
                escape_html(&id.run_name),
                escape_html(&result.meta.expectation_suite_name),
                escape_html(&result.meta.batch_id),
                status_badge(result.success),
                result.passed_count(),
                result.statistics.evaluated_expectations
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str(&page_end());
    html
}

fn run_time_of(result: &ValidationResult) -> chrono::DateTime<chrono::Utc> {
    result
        .meta
        .run_id
        .as_ref()
        .map(|r| r.run_time)
        .unwrap_or(result.meta.validation_time)
}

pub fn render_suite_page(suite: &ExpectationSuite) -> String {
    let home = format!("{}{}", up_levels(1), INDEX_PAGE);
    let mut html = page_start(&format!("Expectation Suite: {}", suite.name()), Some(&home));

    html.push_str("<div class=\"stats\">\n");
    html.push_str(&stat_box("expectations", &suite.len().to_string()));
    if let Some(version) = suite.meta.get(crate::expectation::VERSION_META_KEY).and_then(|v| v.as_str()) {
        html.push_str(&stat_box("dqcheck version", version));
    }
    html.push_str("</div>\n");

    if suite.is_empty() {
        html.push_str("<p class=\"muted\">This suite has no expectations.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Column</th><th>Expectation</th><th>Type</th></tr></thead>\n<tbody>\n");
        for config in &suite.expectations {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td><code>{}</code></td></tr>\n",
                escape_html(config.column().unwrap_or("(table)")),
                escape_html(&config.expectation.describe()),
                config.expectation_type()
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str(&page_end());
    html
}

pub fn render_validation_page(result: &ValidationResult) -> String {
    // validations/<suite>/<run_name>/<run_time>/<batch>.html
    let home = format!("{}{}", up_levels(4), INDEX_PAGE);
    let mut html = page_start(
        &format!("Validation: {}", result.meta.expectation_suite_name),
        Some(&home),
    );

    let run_name = result
        .meta
        .run_id
        .as_ref()
        .map(|r| r.run_name_key().to_string())
        .unwrap_or_else(|| crate::checkpoint::NO_RUN_NAME.to_string());

    html.push_str(&format!("<p>{}</p>\n", status_badge(result.success)));
    html.push_str("<table>\n<tbody>\n");
    let mut info_row = |label: &str, value: &str| {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            escape_html(label),
            escape_html(value)
        ));
    };
    info_row("Run name", &run_name);
    info_row("Run time", &run_time_of(result).to_rfc3339());
    info_row("Batch", &result.meta.batch_id);
    if let Some(ds) = &result.meta.datasource_name {
        info_row("Datasource", ds);
    }
    if let Some(asset) = &result.meta.data_asset_name {
        info_row("Data asset", asset);
    }
    if let Some(checkpoint) = &result.meta.checkpoint_name {
        info_row("Checkpoint", checkpoint);
    }
    html.push_str("</tbody>\n</table>\n");

    let stats = &result.statistics;
    html.push_str("<h2>Statistics</h2>\n<div class=\"stats\">\n");
    html.push_str(&stat_box("evaluated", &stats.evaluated_expectations.to_string()));
    html.push_str(&stat_box("successful", &stats.successful_expectations.to_string()));
    html.push_str(&stat_box("unsuccessful", &stats.unsuccessful_expectations.to_string()));
    let percent = stats
        .success_percent
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "n/a".to_string());
    html.push_str(&stat_box("success percent", &percent));
    html.push_str("</div>\n");

    html.push_str("<h2>Expectations</h2>\n");
    html.push_str("<table>\n<thead><tr><th>Status</th><th>Expectation</th><th>Observed</th><th>Unexpected</th><th>Sample unexpected values</th></tr></thead>\n<tbody>\n");
    for r in &result.results {
        html.push_str(&render_result_row(r));
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str(&page_end());
    html
}

fn render_result_row(r: &ExpectationValidationResult) -> String {
    let status = if r.raised_exception() {
        "<span class=\"badge error\">Error</span>"
    } else {
        status_badge(r.success)
    };

    let observed = match (&r.result.observed_value, &r.exception_info.exception_message) {
        (_, Some(message)) if r.raised_exception() => message.clone(),
        (Some(value), _) => value.to_string(),
        (None, _) => String::new(),
    };

    let unexpected = match (r.result.unexpected_count, r.result.unexpected_percent) {
        (Some(count), Some(percent)) => format!("{} ({:.2}%)", count, percent),
        (Some(count), None) => count.to_string(),
        _ => String::new(),
    };

    let samples = r
        .result
        .partial_unexpected_list
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "<tr><td>{}</td><td>{}<br><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        status,
        escape_html(&r.expectation_config.expectation.describe()),
        r.expectation_config.expectation_type(),
        escape_html(&observed),
        escape_html(&unexpected),
        escape_html(&samples)
    )
}
