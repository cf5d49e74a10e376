//! Terminal dashboard for a Miningcore-style mining pool.
//!
//! Two surfaces share one update cycle: `pooldash` shows the public pool view,
//! `pooldash-admin` adds system resources and containers behind a session gate.

pub mod alerts;
pub mod api;
pub mod config;
pub mod cycle;
pub mod format;
pub mod history;
pub mod logging;
pub mod model;
pub mod render;
pub mod session;
pub mod view;
