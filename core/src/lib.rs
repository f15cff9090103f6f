//! Runner runtime behind the `shush` command.
//!
//! The cli crate only parses arguments and maps results to exit codes; everything
//! that touches the child process lives here.

pub mod api;
pub mod config;
pub mod error;
pub mod runner;
pub mod util;
