//! Shared plumbing for the importer: staged progress timing, command-line
//! flags, a couple of deterministic collections and a stdout logger.

mod cli;
mod collections;
mod logger;
mod time;

pub use crate::cli::CmdArgs;
pub use crate::collections::{Counter, MultiMap};
pub use crate::logger::setup_logger;
pub use crate::time::Timer;
