//! `kvtap` command line tool
//!
//! Replays mutation scripts against an in-memory store with the inspector
//! attached, so ignore-lists and previews can be checked without running an
//! application.

pub mod config;
pub mod script;

pub use script::{ReplaySummary, Replayer, ScriptCommand, ScriptError, ScriptLine, parse_script};
