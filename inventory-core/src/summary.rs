//! Movement summary aggregation
//!
//! Pure read-side derivation over a movement collection; no storage access
//! and no failure modes of its own.

use crate::types::{Movement, MovementType};
use serde::{Deserialize, Serialize};

/// Aggregated statistics over a movement set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSummary {
    /// Total number of movements
    pub total_movements: usize,

    /// Number of IN movements
    pub total_in: usize,

    /// Number of OUT movements
    pub total_out: usize,

    /// Sum of IN quantities
    pub total_quantity_in: i64,

    /// Sum of OUT quantities
    pub total_quantity_out: i64,

    /// The movements themselves, most recent first
    pub movements: Vec<Movement>,
}

/// Summarize a movement collection.
///
/// The returned movement list is ordered most recent first regardless of
/// input order.
pub fn summarize(mut movements: Vec<Movement>) -> MovementSummary {
    movements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let total_in = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::In)
        .count();
    let total_out = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Out)
        .count();
    let total_quantity_in = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::In)
        .map(|m| m.quantity)
        .sum();
    let total_quantity_out = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Out)
        .map(|m| m.quantity)
        .sum();

    MovementSummary {
        total_movements: movements.len(),
        total_in,
        total_out,
        total_quantity_in,
        total_quantity_out,
        movements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MovementId, ProductId};
    use chrono::{Duration, Utc};

    fn movement(movement_type: MovementType, quantity: i64, age_secs: i64) -> Movement {
        Movement {
            id: MovementId::generate(),
            movement_type,
            quantity,
            description: None,
            reference: None,
            product_id: ProductId::generate(),
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_summarize_counts_and_sums() {
        let movements = vec![
            movement(MovementType::In, 100, 30),
            movement(MovementType::Out, 20, 20),
            movement(MovementType::In, 50, 10),
            movement(MovementType::Out, 5, 0),
        ];

        let summary = summarize(movements);
        assert_eq!(summary.total_movements, 4);
        assert_eq!(summary.total_in, 2);
        assert_eq!(summary.total_out, 2);
        assert_eq!(summary.total_quantity_in, 150);
        assert_eq!(summary.total_quantity_out, 25);
    }

    #[test]
    fn test_summarize_orders_most_recent_first() {
        // Deliberately shuffled input
        let movements = vec![
            movement(MovementType::In, 1, 10),
            movement(MovementType::In, 2, 30),
            movement(MovementType::In, 3, 0),
        ];

        let summary = summarize(movements);
        assert_eq!(summary.movements[0].quantity, 3);
        assert_eq!(summary.movements[1].quantity, 1);
        assert_eq!(summary.movements[2].quantity, 2);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(Vec::new());
        assert_eq!(summary.total_movements, 0);
        assert_eq!(summary.total_in, 0);
        assert_eq!(summary.total_out, 0);
        assert_eq!(summary.total_quantity_in, 0);
        assert_eq!(summary.total_quantity_out, 0);
        assert!(summary.movements.is_empty());
    }
}
