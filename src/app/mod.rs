//! Binary-side orchestration: wiring settings into the library, terminal
//! handling, progress display, summary output, and exit codes.

pub(crate) mod exit_handler;
pub(crate) mod output;
pub(crate) mod progress;
pub(crate) mod runtime;
pub(crate) mod terminal;
