//! Core of a feature toggle client: keeps a local snapshot of toggle definitions in sync with a
//! remote API and evaluates toggles against a caller-supplied [`Context`].
//!
//! # Overview
//!
//! The crate revolves around a [`Client`]. On creation, it restores the last known toggles from a
//! local backup so that evaluation works before (or without) talking to the server. A background
//! [`Scheduler`] then runs [`FetchTogglesTask`] periodically, which asks the server whether toggles
//! changed since the last known etag and, if they did, publishes them to the [`ToggleSnapshot`] and
//! writes a new backup.
//!
//! Evaluation ([`Client::is_enabled`]) never blocks on network or disk and never fails: unknown
//! toggles and unknown strategies resolve to "disabled".
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. Errors inside the fetch cycle are logged and
//! retried on the next tick; they never reach evaluation.
//!
//! # Logging
//!
//! The crate uses the [`log`](https://docs.rs/log/latest/log/) crate with target `toggle` and
//! structured key-values. Consider integrating a `log`-compatible logger implementation for better
//! visibility into fetch and persistence failures.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod api_client;
mod client;
mod config;
mod context;
mod error;
mod evaluator;
mod fetch_task;
pub mod persistence;
pub mod scheduler;
pub mod strategies;
mod toggle_snapshot;
mod toggles;

#[cfg(test)]
mod test_support;

pub use api_client::{ApiClient, FetchTogglesResult, HttpApiClient, HttpApiClientConfig};
pub use client::Client;
pub use config::ClientConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use evaluator::Evaluator;
pub use fetch_task::FetchTogglesTask;
pub use scheduler::{ScheduledTask, Scheduler, SchedulerConfig};
pub use strategies::{Strategy, StrategyRegistry};
pub use toggle_snapshot::ToggleSnapshot;
pub use toggles::{StrategyBinding, Toggle, ToggleSet};
