//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Message timestamps are log times in nanoseconds (`u64`)
//! - Samples keep the timestamp of the message they were extracted from

mod error;
mod message;
mod report;
mod result;
mod sample;
mod sink;
mod task;
mod value;

pub use error::*;
pub use message::{MessageRecord, MessageSource};
pub use report::*;
pub use result::*;
pub use sample::*;
pub use sink::*;
pub use task::*;
pub use value::{FieldValue, Number};
