//! Shared plumbing for the Foundry sample programs.
//!
//! Each binary under `src/bin` loads [`settings::Settings`], initialises
//! tracing, and hands a typed config to the matching module in [`scenarios`].

pub mod console;
pub mod credentials;
pub mod scenarios;
pub mod settings;
