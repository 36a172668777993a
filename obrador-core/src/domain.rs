use serde::{Deserialize, Serialize};

/// Identifier of a catalog product.
///
/// The catalog itself lives outside this workspace; the engine only needs a
/// stable key to partition stock rows and order items by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a product's stock is managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockPolicy {
    /// Never materializes a ledger row; always reported available.
    Unlimited,
    /// Tracked per calendar week against a finite allotment.
    Weekly,
}

/// The slice of a catalog product the stock engine cares about.
///
/// Immutable during a single reservation operation; admin edits produce a
/// fresh snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Authoritative unit price. Client-submitted prices are never trusted.
    pub unit_price_cents: i64,
    pub stock_policy: StockPolicy,
    /// Default allotment used to seed a new week's ledger row.
    pub weekly_stock: i64,
    pub active: bool,
}

impl Product {
    pub fn is_weekly(&self) -> bool {
        self.stock_policy == StockPolicy::Weekly
    }
}

/// Delivery method chosen at checkout; keys the shipping-cost lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Pickup,
    HomeDelivery,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Pickup => "pickup",
            DeliveryMethod::HomeDelivery => "home_delivery",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_policy_serializes_uppercase() {
        let json = serde_json::to_string(&StockPolicy::Weekly).unwrap();
        assert_eq!(json, "\"WEEKLY\"");
        let back: StockPolicy = serde_json::from_str("\"UNLIMITED\"").unwrap();
        assert_eq!(back, StockPolicy::Unlimited);
    }
}
