/// Interactive and one-shot runtimes - Gateway
mod oneshot;
mod repl;
mod setup;

pub use oneshot::{run_oneshot, OneshotResult};
pub use repl::run_repl;
