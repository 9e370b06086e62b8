//! Core domain types
//!
//! These types describe analysis runs as reported by the analysis API and are
//! shared between the HTTP client and the command-line tools.

pub mod run;
