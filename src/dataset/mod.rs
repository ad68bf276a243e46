mod value;
mod schema;
mod infer;
mod frame;
mod reader;

pub use value::Value;
pub use schema::{ColumnType, Field, Schema};
pub use infer::{TypeInference, infer_column_type};
pub use frame::{Column, DataFrame};
pub use reader::{Compression, CsvReadOptions, read_csv, read_csv_from_reader};
