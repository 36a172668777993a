//! Hot-reloadable ordering gate.
//!
//! Wraps the pure calculator in [`crate::week`] with a shared, reloadable
//! configuration handle. Every query takes one consistent snapshot of the
//! configuration; a concurrent reload affects the next call, never the middle
//! of an evaluation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::config::{ConfigError, OrderingWindowConfig};
use crate::week::{self, ClosingCountdown, OpeningCountdown, WeekId};

#[derive(Clone)]
pub struct OrderingGate {
    config: Arc<RwLock<OrderingWindowConfig>>,
}

impl OrderingGate {
    /// Creates a gate with an already-validated configuration.
    pub fn new(config: OrderingWindowConfig) -> Result<Self, ConfigError> {
        config.check()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Replaces the live configuration. Invalid configurations are rejected
    /// and the previous one stays in effect.
    pub async fn reload(&self, config: OrderingWindowConfig) -> Result<(), ConfigError> {
        config.check()?;
        let mut guard = self.config.write().await;
        tracing::info!(
            enabled = config.enabled,
            timezone = %config.timezone,
            "ordering window configuration reloaded"
        );
        *guard = config;
        Ok(())
    }

    /// Snapshot of the live configuration.
    pub async fn config(&self) -> OrderingWindowConfig {
        self.config.read().await.clone()
    }

    pub async fn current_week_id(&self) -> WeekId {
        self.current_week_id_at(Utc::now()).await
    }

    pub async fn current_week_id_at(&self, now: DateTime<Utc>) -> WeekId {
        let cfg = self.config().await;
        week::week_id_at(now, &cfg)
    }

    pub async fn is_open(&self) -> bool {
        self.is_open_at(Utc::now()).await
    }

    pub async fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let cfg = self.config().await;
        week::is_open_at(now, &cfg)
    }

    pub async fn opening_countdown(&self) -> OpeningCountdown {
        self.opening_countdown_at(Utc::now()).await
    }

    pub async fn opening_countdown_at(&self, now: DateTime<Utc>) -> OpeningCountdown {
        let cfg = self.config().await;
        week::opening_countdown_at(now, &cfg)
    }

    pub async fn closing_countdown(&self) -> ClosingCountdown {
        self.closing_countdown_at(Utc::now()).await
    }

    pub async fn closing_countdown_at(&self, now: DateTime<Utc>) -> ClosingCountdown {
        let cfg = self.config().await;
        week::closing_countdown_at(now, &cfg)
    }
}
