//! Plume Poller
//!
//! A generic repeated-invocation engine for tracking long-running analysis runs.
//!
//! The poller calls a caller-supplied asynchronous check function on a fixed
//! interval, records the latest result, and stops when a stop condition holds,
//! when an attempt ceiling is reached, or when the check function fails.
//! Consumers observe progress through [`PollState`] snapshots published on a
//! `tokio::sync::watch` channel.
//!
//! # Example
//!
//! ```no_run
//! use plume_poller::AsyncPoller;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let poller = AsyncPoller::builder(|| async { Ok::<u32, std::io::Error>(42) })
//!         .interval(Duration::from_millis(500))
//!         .stop_when(|value| *value == 42)
//!         .build()?;
//!
//!     poller.start();
//!     let state = poller.wait_until_stopped().await;
//!     assert_eq!(state.data, Some(42));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod poller;
pub mod scheduler;
pub mod state;

pub use config::PollerConfig;
pub use error::{PollerError, Result};
pub use poller::{AsyncPoller, PollerBuilder};
pub use scheduler::{Scheduler, Task, TimerHandle, TokioScheduler};
pub use state::PollState;
