//! # Extraction
//!
//! Field-extraction and expression engine.
//!
//! Responsibilities:
//! - Compile a task's `parse_string` into an `ExtractionPlan` (directive parsing)
//! - Resolve dotted field paths inside decoded messages
//! - Slice byte buffers and cast values to primitive numeric types
//! - Evaluate the residual arithmetic expression in a sandbox
//!
//! ## Usage Example
//!
//! ```ignore
//! use extraction::ExtractionPlan;
//!
//! let plan = ExtractionPlan::compile(
//!     "imu_rate",
//!     &["header.stamp.sec".into(), "header.stamp.nanosec".into()],
//!     "header.stamp.sec * 1000000000 + header.stamp.nanosec",
//! )?;
//!
//! match plan.extract(&message) {
//!     Ok(sample) => println!("{}", sample.computed_value),
//!     Err(e) => eprintln!("sample dropped: {e}"),
//! }
//! ```

mod cast;
mod directive;
mod error;
mod expr;
mod path;
mod plan;
mod slice;
mod types;

// Re-exports
pub use cast::{cast_scalar, decode_le, to_number};
pub use directive::{parse_directive_body, DirectiveMode, FieldDirective};
pub use error::{CompileError, Result};
pub use expr::Expression;
pub use path::FieldPath;
pub use plan::ExtractionPlan;
pub use slice::extract_bytes;
pub use types::TargetType;
