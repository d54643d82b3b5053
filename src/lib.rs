pub mod config;
pub mod correlator;
pub mod diff;
pub mod graders;
pub mod logging;
pub mod redaction;
pub mod trace;
