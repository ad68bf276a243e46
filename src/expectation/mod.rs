mod types;
mod suite;
mod checker;
mod result;

pub use types::{Expectation, ExpectationConfig};
pub use suite::{AddOutcome, ExpectationSuite, VERSION_META_KEY};
pub use checker::ExpectationChecker;
pub use result::{
    ExceptionInfo, ExpectationResultDetails, ExpectationValidationResult,
    ValidationMeta, ValidationResult, ValidationStatistics,
};

pub(crate) use checker::value_key;
