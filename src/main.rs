//! CLI entry point for databus-dl.

mod app;
mod cli;
mod config;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every file succeeded (dry runs included).
    Success,
    /// Some files succeeded, some failed.
    Partial,
    /// Nothing succeeded, the run stopped early, or a fatal error occurred.
    Failure,
}

impl ProcessExit {
    fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

#[tokio::main]
async fn main() {
    let exit = match app::runtime::run_databus_dl().await {
        Ok(exit) => exit,
        Err(error) => {
            eprintln!("error: {error:#}");
            ProcessExit::Failure
        }
    };
    std::process::exit(exit.code());
}
