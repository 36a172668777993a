//! # obrador-core — domain model and ordering-window calculator
//!
//! Core building blocks shared by the Obrador weekly-preorder engine:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Product, order and money types |
//! | [`week`] | [`WeekId`] and the pure ordering-window calculator |
//! | [`config`] | [`OrderingWindowConfig`] with validation at the write boundary |
//! | [`gate`] | [`OrderingGate`] — hot-reloadable window queries |
//!
//! The calculator in [`week`] is pure: it is a set of functions over
//! `(now, config)` with no I/O, so it can be tested with arbitrary clocks and
//! configurations. [`OrderingGate`] wraps it with a live, reloadable
//! configuration handle for use from request handlers.

pub mod config;
pub mod domain;
pub mod gate;
pub mod week;

pub use config::{ConfigError, OrderingWindowConfig};
pub use domain::{DeliveryMethod, Product, ProductId, StockPolicy};
pub use gate::OrderingGate;
pub use week::{ClosingCountdown, OpeningCountdown, WeekId, WeekIdError};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{
        ConfigError, DeliveryMethod, OrderingGate, OrderingWindowConfig, Product, ProductId,
        StockPolicy, WeekId,
    };
}
