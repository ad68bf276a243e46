//! Shared pieces of the generated HTML pages.

pub const CSS_STYLES: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; background: #f8f9fa; color: #212529; }
h1 { color: #1a1a2e; border-bottom: 3px solid #0f3460; padding-bottom: 10px; }
h2 { color: #16213e; margin-top: 30px; }
nav { margin-bottom: 16px; }
table { border-collapse: collapse; width: 100%; margin: 10px 0; background: white; }
th, td { border: 1px solid #dee2e6; padding: 8px 12px; text-align: left; vertical-align: top; }
th { background: #e9ecef; font-weight: 600; }
code { background: #e9ecef; padding: 2px 6px; border-radius: 3px; font-size: 0.9em; }
.badge { display: inline-block; padding: 2px 8px; border-radius: 4px; font-size: 0.85em; font-weight: 600; color: white; }
.success { background: #2e7d32; }
.failure { background: #c62828; }
.error { background: #ef6c00; }
.stats { display: flex; gap: 16px; flex-wrap: wrap; }
.stat { background: white; border: 1px solid #dee2e6; border-radius: 6px; padding: 12px 18px; }
.stat strong { display: block; font-size: 1.4em; }
.muted { color: #6c757d; }
footer { margin-top: 40px; color: #6c757d; font-size: 0.85em; border-top: 1px solid #dee2e6; padding-top: 10px; }
"#;

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Opening markup up to and including the page heading. `home` is the
/// relative link back to the site index, if any.
pub fn page_start(title: &str, home: Option<&str>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str("<style>\n");
    html.push_str(CSS_STYLES);
    html.push_str("</style>\n</head>\n<body>\n");
    if let Some(home) = home {
        html.push_str(&format!("<nav><a href=\"{}\">&larr; Data Docs home</a></nav>\n", escape_html(home)));
    }
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));
    html
}

pub fn page_end() -> String {
    format!(
        "<footer><p>Generated by dqcheck {}</p></footer>\n</body>\n</html>\n",
        env!("CARGO_PKG_VERSION")
    )
}

pub fn status_badge(success: bool) -> &'static str {
    if success {
        "<span class=\"badge success\">Succeeded</span>"
    } else {
        "<span class=\"badge failure\">Failed</span>"
    }
}

pub fn stat_box(label: &str, value: &str) -> String {
    format!(
        "<div class=\"stat\"><strong>{}</strong>{}</div>\n",
        escape_html(value),
        escape_html(label)
    )
}

/// `../` repeated `depth` times, for links back to the site root.
pub fn up_levels(depth: usize) -> String {
    "../".repeat(depth)
}
