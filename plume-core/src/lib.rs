//! Plume Core
//!
//! Core types shared by the Plume analysis tooling.
//!
//! This crate contains:
//! - Domain types: analysis runs, their status and their outputs
//! - DTOs: request and listing shapes exchanged with the analysis API

pub mod domain;
pub mod dto;
