use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Sale,
    Return,
    Adjustment,
    Restock,
    Damage,
    Expired,
}

impl MovementType {
    /// Converts a requested quantity into the signed stock delta.
    ///
    /// Typed movements take a positive magnitude; `Adjustment` takes a signed delta.
    pub fn delta(&self, quantity: i64) -> Result<i64> {
        match self {
            Self::Adjustment if quantity != 0 => Ok(quantity),
            Self::Adjustment => Err(MarketError::Validation(
                "Adjustment quantity must be non-zero".to_string(),
            )),
            _ if quantity <= 0 => Err(MarketError::Validation(format!(
                "{:?} quantity must be positive",
                self
            ))),
            Self::Return | Self::Restock => Ok(quantity),
            Self::Sale | Self::Damage | Self::Expired => Ok(-quantity),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Product {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub stock: i64,
}

/// One line of the append-only stock audit trail.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: Option<String>,
    pub actor_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_deltas() {
        assert_eq!(MovementType::Sale.delta(3).unwrap(), -3);
        assert_eq!(MovementType::Damage.delta(1).unwrap(), -1);
        assert_eq!(MovementType::Expired.delta(2).unwrap(), -2);
        assert_eq!(MovementType::Return.delta(2).unwrap(), 2);
        assert_eq!(MovementType::Restock.delta(10).unwrap(), 10);
        assert_eq!(MovementType::Adjustment.delta(-4).unwrap(), -4);
        assert_eq!(MovementType::Adjustment.delta(4).unwrap(), 4);

        assert!(MovementType::Sale.delta(0).is_err());
        assert!(MovementType::Restock.delta(-1).is_err());
        assert!(MovementType::Adjustment.delta(0).is_err());
    }
}
