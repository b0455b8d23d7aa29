pub mod config;
pub mod locator;
pub mod process_runner;

pub use locator::{PathLookup, RuntimeLocator, WhichLookup};
pub use process_runner::ProcessRunner;
