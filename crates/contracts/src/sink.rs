//! ReportSink trait - report writer interface
//!
//! Defines the abstract interface for report writers.

use crate::{ContractError, RunReport};

/// Report output trait
///
/// All report writer implementations must implement this trait.
#[trait_variant::make(ReportSink: Send)]
pub trait LocalReportSink {
    /// Sink name (used for logging)
    fn name(&self) -> &str;

    /// Write the report of a completed run
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, report: &RunReport) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
