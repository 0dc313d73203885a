//! # Domain Module
//!
//! Business logic of the budget calendar, independent of any UI or of how
//! events are stored.
//!
//! - **calendar**: month grid generation and month navigation
//! - **expense_stats**: totals, largest payment and category breakdown
//! - **event_form**: expense form validation and request building
//! - **controller**: the single owner of view state (focus month, modal,
//!   status message, event snapshot)

pub mod calendar;
pub mod controller;
pub mod event_form;
pub mod expense_stats;

pub use calendar::*;
pub use controller::*;
pub use event_form::*;
pub use expense_stats::*;
