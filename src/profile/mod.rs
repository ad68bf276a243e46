mod profiler;
mod render;

pub use profiler::{
    BasicDatasetProfiler, ColumnProfile, DatasetProfile, NumericSummary, ProfilingResult,
    ValueCount, PROFILER_META_KEY,
};
pub use render::render_profiling_page;
