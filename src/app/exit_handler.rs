//! Exit code logic for the databus-dl process.
//!
//! Single responsibility: map a run summary to the process exit outcome.

use databus_core::RunSummary;

use crate::ProcessExit;

/// Maps completed and failed counts to an exit outcome.
pub(crate) fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// An aborted or interrupted run is a failure regardless of counts.
pub(crate) fn exit_outcome_for(summary: &RunSummary) -> ProcessExit {
    if summary.was_aborted() || summary.was_interrupted() {
        return ProcessExit::Failure;
    }
    determine_exit_outcome(summary.success_count(), summary.failure_count())
}
