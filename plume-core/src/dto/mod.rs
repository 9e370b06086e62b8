//! Data Transfer Objects
//!
//! Lightweight shapes used when submitting runs and listing them.

pub mod run;
