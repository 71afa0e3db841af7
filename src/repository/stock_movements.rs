use chrono::Utc;
use uuid::Uuid;

use crate::client::DataClient;
use crate::error::AppError;
use crate::models::{MovementType, NewStockMovement, StockMovement};
use crate::query::{Direction, QueryResult};

use super::STOCK_MOVEMENTS;

/// Movements with the moved product embedded.
const WITH_PRODUCT: &str = "*, product:products(*)";

/// One product line of a bulk movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkLine {
    pub product_id: i64,
    pub quantity: i32,
}

pub struct StockMovementRepository {
    client: DataClient,
}

impl StockMovementRepository {
    pub fn new(client: DataClient) -> Self {
        Self { client }
    }

    /// Newest first.
    pub async fn recent(&self, limit: usize) -> QueryResult<Vec<StockMovement>> {
        self.client
            .from(STOCK_MOVEMENTS)
            .select(WITH_PRODUCT)
            .order("date", Direction::Desc)
            .limit(limit)
            .fetch()
            .await
    }

    pub async fn for_product(&self, product_id: i64) -> QueryResult<Vec<StockMovement>> {
        self.client
            .from(STOCK_MOVEMENTS)
            .select("*")
            .eq("product_id", product_id)
            .order("date", Direction::Desc)
            .fetch()
            .await
    }

    pub async fn by_bulk_id(&self, bulk_id: &str) -> QueryResult<Vec<StockMovement>> {
        self.client
            .from(STOCK_MOVEMENTS)
            .select(WITH_PRODUCT)
            .eq("bulk_id", bulk_id)
            .order("product_id", Direction::Asc)
            .fetch()
            .await
    }

    pub async fn record(&self, movement: &NewStockMovement) -> QueryResult<StockMovement> {
        if movement.quantity <= 0 {
            return QueryResult::err(AppError::InvalidInput(format!(
                "movement quantity must be positive, got {}",
                movement.quantity
            )));
        }
        self.client
            .from(STOCK_MOVEMENTS)
            .insert(movement)
            .select("*")
            .single()
            .await
    }

    /// Records several lines as one bulk movement sharing a fresh `bulk_id`.
    pub async fn record_bulk(
        &self,
        movement_type: MovementType,
        lines: &[BulkLine],
        user_id: &str,
        notes: Option<&str>,
    ) -> QueryResult<Vec<StockMovement>> {
        if lines.is_empty() {
            return QueryResult::err(AppError::InvalidInput(
                "bulk movement needs at least one line".to_string(),
            ));
        }
        if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
            return QueryResult::err(AppError::InvalidInput(format!(
                "quantity for product {} must be positive",
                line.product_id
            )));
        }

        let bulk_id = Uuid::new_v4().to_string();
        let date = Utc::now();
        let rows: Vec<NewStockMovement> = lines
            .iter()
            .map(|line| NewStockMovement {
                product_id: line.product_id,
                movement_type,
                quantity: line.quantity,
                date,
                user_id: user_id.to_string(),
                notes: notes.map(str::to_string),
                is_bulk: Some(true),
                bulk_id: Some(bulk_id.clone()),
            })
            .collect();

        tracing::info!(
            "Recording bulk {} movement: bulk_id={}, lines={}",
            movement_type,
            bulk_id,
            rows.len()
        );
        self.client
            .from(STOCK_MOVEMENTS)
            .insert(&rows)
            .select("*")
            .fetch()
            .await
    }
}

/// Signed stock delta of `movements`.
pub fn net_change(movements: &[StockMovement]) -> i64 {
    movements
        .iter()
        .map(|m| m.movement_type.signed(m.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn movement(movement_type: MovementType, quantity: i32) -> StockMovement {
        StockMovement {
            id: 1,
            product_id: 1,
            movement_type,
            quantity,
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            user_id: "u".to_string(),
            notes: None,
            is_bulk: None,
            bulk_id: None,
            product: None,
        }
    }

    #[test]
    fn test_net_change() {
        let movements = vec![
            movement(MovementType::In, 10),
            movement(MovementType::Out, 3),
            movement(MovementType::Out, 2),
        ];
        assert_eq!(net_change(&movements), 5);
        assert_eq!(net_change(&[]), 0);
    }
}
