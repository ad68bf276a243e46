mod source;
mod batch;

pub use source::{AssetKind, DataAsset, Datasource};
pub use batch::{Batch, BatchRequest};
