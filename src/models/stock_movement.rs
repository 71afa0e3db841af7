use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }

    /// Stock delta a movement of `quantity` units causes.
    pub fn signed(&self, quantity: i32) -> i64 {
        match self {
            MovementType::In => i64::from(quantity),
            MovementType::Out => -i64::from(quantity),
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            other => Err(AppError::UnknownTag {
                field: "type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i32,
    pub date: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_bulk: Option<bool>,
    #[serde(default)]
    pub bulk_id: Option<String>,
    /// Embedded product snapshot, present when selected with `product:products(*)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStockMovement {
    pub product_id: i64,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i32,
    pub date: DateTime<Utc>,
    pub user_id: String,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bulk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movement_type_rejects_unknown_tags() {
        assert_eq!("in".parse::<MovementType>().unwrap(), MovementType::In);
        assert_eq!("out".parse::<MovementType>().unwrap(), MovementType::Out);

        let err = "transfer".parse::<MovementType>().unwrap_err();
        assert!(matches!(err, AppError::UnknownTag { field: "type", .. }));

        let row = json!({
            "id": 1, "product_id": 2, "type": "adjust", "quantity": 3,
            "date": "2024-02-01T09:00:00Z", "user_id": "u1"
        });
        assert!(serde_json::from_value::<StockMovement>(row).is_err());
    }

    #[test]
    fn test_signed_quantity() {
        assert_eq!(MovementType::In.signed(5), 5);
        assert_eq!(MovementType::Out.signed(5), -5);
    }

    #[test]
    fn test_optional_fields_round_trip_as_null() {
        let row = json!({
            "id": 10, "product_id": 2, "type": "out", "quantity": 3,
            "date": "2024-02-01T09:00:00Z", "user_id": "u1",
            "notes": null, "is_bulk": null, "bulk_id": null
        });
        let movement: StockMovement = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(movement.movement_type, MovementType::Out);
        assert!(movement.product.is_none());

        let back = serde_json::to_value(&movement).unwrap();
        assert_eq!(back["notes"], serde_json::Value::Null);
        assert_eq!(back["type"], "out");
        let again: StockMovement = serde_json::from_value(back).unwrap();
        assert_eq!(again, movement);
    }
}
