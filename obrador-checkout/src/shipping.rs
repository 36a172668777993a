//! Shipping costs per delivery method, loaded from the flat settings table.

use std::collections::HashMap;

use obrador_core::config::ConfigError;
use obrador_core::DeliveryMethod;
use serde::{Deserialize, Serialize};

/// Settings keys as stored in the site-configuration table.
pub mod keys {
    pub const PICKUP: &str = "shipping.cost.pickup";
    pub const HOME_DELIVERY: &str = "shipping.cost.home_delivery";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRates {
    pub pickup_cents: i64,
    pub home_delivery_cents: i64,
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            pickup_cents: 0,
            home_delivery_cents: 500,
        }
    }
}

impl ShippingRates {
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            pickup_cents: parse_or(settings, keys::PICKUP, defaults.pickup_cents)?,
            home_delivery_cents: parse_or(
                settings,
                keys::HOME_DELIVERY,
                defaults.home_delivery_cents,
            )?,
        })
    }

    pub fn cost_cents(&self, delivery: DeliveryMethod) -> i64 {
        match delivery {
            DeliveryMethod::Pickup => self.pickup_cents,
            DeliveryMethod::HomeDelivery => self.home_delivery_cents,
        }
    }
}

fn parse_or(
    settings: &HashMap<String, String>,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match settings.get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(cents) if cents >= 0 => Ok(cents),
            Ok(cents) => Err(ConfigError::Invalid {
                key: key.to_string(),
                message: format!("shipping cost must be non-negative, got {cents}"),
            }),
            Err(e) => Err(ConfigError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            }),
        },
    }
}
