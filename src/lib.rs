//! Bounded-concurrency front end for the wordsmith solver.
//!
//! [`engine::process::ProcessEngine`] verifies the solver executable, then
//! runs every call through a fixed worker pool ([`scheduler`]) that spawns
//! one solver process per call ([`invoker`]) and decodes its JSON output.

pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod invoker;
pub mod scheduler;
pub mod trust;
pub mod types;
pub mod words;

pub use error::{ConfigError, EngineError, ErrorKind};
pub use types::{Guess, WordReport};
