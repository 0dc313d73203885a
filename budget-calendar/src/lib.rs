//! # Budget Calendar
//!
//! Non-UI logic for a budget-tracking calendar.
//!
//! - **Domain**: month grid, expense statistics, expense form, controller
//! - **IO**: the event store interface and its HTTP client
//! - **Config**: YAML settings with environment overrides
//!
//! ```text
//! UI layer (terminal, web, ...)
//!     ↓
//! AppController (domain)
//!     ↓
//! EventStore (io) → external HTTP service
//! ```

pub mod config;
pub mod domain;
pub mod io;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

pub use config::AppConfig;
pub use domain::*;
pub use io::*;

/// Build a controller talking to the configured HTTP event store
pub fn initialize_controller(config: &AppConfig, today: NaiveDate) -> Result<AppController> {
    info!("Setting up event store client for {}", config.api_base_url);
    let store = HttpEventStore::new(config).context("Failed to set up event store client")?;

    info!("Setting up controller");
    Ok(AppController::new(Arc::new(store), config, today))
}
