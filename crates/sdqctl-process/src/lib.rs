//! Executes `RUN` step commands: `sh -c` with process-group isolation,
//! a hard timeout, and a byte-capped output capture.

pub mod error;
pub mod options;
pub mod result;
pub mod run;

pub use error::ProcessError;
pub use options::{RunOptions, DEFAULT_OUTPUT_LIMIT_BYTES, DEFAULT_TIMEOUT};
pub use result::RunResult;
pub use run::run;
