mod html;
mod site;

pub use html::{escape_html, page_end, page_start, CSS_STYLES};
pub use site::{
    render_index, render_suite_page, render_validation_page, DataDocsBuildReport, DataDocsSite,
    INDEX_PAGE,
};
pub(crate) use html::{stat_box, status_badge};
