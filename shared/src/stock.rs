//! Quantity adjuster
//!
//! Every create, replace and delete of a transaction is reduced to the same
//! computation: undo the movement of the lines as they were, apply the
//! movement of the lines as they are now. Create is a replace from an empty
//! snapshot, delete is a replace to an empty collection.
//!
//! Deltas are accumulated per part before anything is checked, so the outcome
//! does not depend on line order and a part that appears in both snapshots is
//! counted exactly once.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::TransactionFamily;

/// A single stock-moving line: which part and how many units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub part_id: Uuid,
    pub quantity: i64,
}

impl StockLine {
    pub fn new(part_id: Uuid, quantity: i64) -> Self {
        Self { part_id, quantity }
    }

    /// Lines whose part was retired (null reference) do not move stock
    pub fn from_parts(part_id: Option<Uuid>, quantity: Option<i64>) -> Option<Self> {
        Some(Self::new(part_id?, quantity?))
    }
}

/// What is being done to the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustMode {
    Create,
    Update,
    Delete,
}

/// Shortage reported when a movement would drive a part below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[error("insufficient stock for part {part_id}: available {available}, requested {requested}")]
pub struct StockShortage {
    pub part_id: Uuid,
    pub available: i64,
    pub requested: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdjustError {
    #[error(transparent)]
    Shortage(#[from] StockShortage),

    #[error("part {0} does not exist")]
    UnknownPart(Uuid),

    #[error("stock movement for part {0} is out of range")]
    Overflow(Uuid),
}

/// One resulting quantity change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub part_id: Uuid,
    pub before: i64,
    pub delta: i64,
    pub after: i64,
}

/// Net per-part movement of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockPlan {
    deltas: BTreeMap<Uuid, i64>,
    /// Parts in first-seen line order: new lines first, then the prior snapshot
    order: Vec<Uuid>,
}

impl StockPlan {
    /// Compute the movement for `mode` on a transaction of `family`.
    ///
    /// `previous` is the line snapshot taken before the mutation, `current`
    /// the collection being written. Create ignores `previous`, delete ignores
    /// `current`.
    pub fn new(
        family: TransactionFamily,
        mode: AdjustMode,
        previous: &[StockLine],
        current: &[StockLine],
    ) -> Self {
        let (previous, current): (&[StockLine], &[StockLine]) = match mode {
            AdjustMode::Create => (&[], current),
            AdjustMode::Update => (previous, current),
            AdjustMode::Delete => (previous, &[]),
        };

        let sign = if family.is_inbound() { 1 } else { -1 };
        let mut plan = StockPlan::default();

        for line in current {
            plan.add(line.part_id, line.quantity.saturating_mul(sign));
        }
        for line in previous {
            plan.add(line.part_id, line.quantity.saturating_mul(-sign));
        }

        plan
    }

    fn add(&mut self, part_id: Uuid, delta: i64) {
        if !self.deltas.contains_key(&part_id) {
            self.order.push(part_id);
        }
        let entry = self.deltas.entry(part_id).or_insert(0);
        *entry = entry.saturating_add(delta);
    }

    /// Every part touched by either snapshot, ascending. This is the lock order.
    pub fn part_ids(&self) -> Vec<Uuid> {
        self.deltas.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Net delta for one part (zero when untouched)
    pub fn delta(&self, part_id: &Uuid) -> i64 {
        self.deltas.get(part_id).copied().unwrap_or(0)
    }

    /// Apply the plan to the locked on-hand quantities.
    ///
    /// Returns the non-zero changes in line order, or the first part in line
    /// order that would go negative or leave the `i64` range.
    pub fn apply(&self, on_hand: &HashMap<Uuid, i64>) -> Result<Vec<StockChange>, AdjustError> {
        let mut changes = Vec::with_capacity(self.order.len());

        for part_id in &self.order {
            let delta = self.deltas[part_id];
            if delta == 0 {
                continue;
            }

            let before = *on_hand
                .get(part_id)
                .ok_or(AdjustError::UnknownPart(*part_id))?;
            let after = before
                .checked_add(delta)
                .ok_or(AdjustError::Overflow(*part_id))?;

            if after < 0 {
                return Err(StockShortage {
                    part_id: *part_id,
                    available: before,
                    requested: delta.checked_neg().ok_or(AdjustError::Overflow(*part_id))?,
                }
                .into());
            }

            changes.push(StockChange {
                part_id: *part_id,
                before,
                delta,
                after,
            });
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(entries: &[(Uuid, i64)]) -> HashMap<Uuid, i64> {
        entries.iter().copied().collect()
    }

    fn after(changes: &[StockChange], part_id: Uuid) -> Option<i64> {
        changes.iter().find(|c| c.part_id == part_id).map(|c| c.after)
    }

    #[test]
    fn test_create_sales_subtracts() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Sales,
            AdjustMode::Create,
            &[],
            &[StockLine::new(p, 3)],
        );
        let changes = plan.apply(&stock(&[(p, 50)])).unwrap();
        assert_eq!(after(&changes, p), Some(47));
    }

    #[test]
    fn test_create_restock_adds() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Restock,
            AdjustMode::Create,
            &[],
            &[StockLine::new(p, 30)],
        );
        assert_eq!(plan.delta(&p), 30);
    }

    #[test]
    fn test_update_reduces_line() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Sales,
            AdjustMode::Update,
            &[StockLine::new(p, 5)],
            &[StockLine::new(p, 2)],
        );
        let changes = plan.apply(&stock(&[(p, 45)])).unwrap();
        assert_eq!(after(&changes, p), Some(48));
    }

    #[test]
    fn test_update_swaps_parts() {
        let (p1, p2, p3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let plan = StockPlan::new(
            TransactionFamily::Sales,
            AdjustMode::Update,
            &[StockLine::new(p1, 3), StockLine::new(p2, 7)],
            &[StockLine::new(p1, 3), StockLine::new(p3, 4)],
        );
        let changes = plan
            .apply(&stock(&[(p1, 47), (p2, 43), (p3, 20)]))
            .unwrap();

        assert_eq!(after(&changes, p1), None, "unchanged part is not rewritten");
        assert_eq!(after(&changes, p2), Some(50));
        assert_eq!(after(&changes, p3), Some(16));
    }

    #[test]
    fn test_shortage_reports_available_and_requested() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Service,
            AdjustMode::Create,
            &[],
            &[StockLine::new(p, 3)],
        );
        assert_eq!(
            plan.apply(&stock(&[(p, 2)])),
            Err(AdjustError::Shortage(StockShortage {
                part_id: p,
                available: 2,
                requested: 3,
            }))
        );
    }

    #[test]
    fn test_shortage_tie_break_is_line_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // b is listed first, so it is reported even if a sorts lower
        let plan = StockPlan::new(
            TransactionFamily::Sales,
            AdjustMode::Create,
            &[],
            &[StockLine::new(b, 9), StockLine::new(a, 9)],
        );
        match plan.apply(&stock(&[(a, 1), (b, 1)])) {
            Err(AdjustError::Shortage(s)) => assert_eq!(s.part_id, b),
            other => panic!("expected shortage, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_restock_can_underflow() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Restock,
            AdjustMode::Delete,
            &[StockLine::new(p, 30)],
            &[],
        );
        assert_eq!(plan.apply(&stock(&[(p, 100)])).unwrap()[0].after, 70);
        assert!(matches!(
            plan.apply(&stock(&[(p, 10)])),
            Err(AdjustError::Shortage(_))
        ));
    }

    #[test]
    fn test_unknown_part() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Sales,
            AdjustMode::Create,
            &[],
            &[StockLine::new(p, 1)],
        );
        assert_eq!(plan.apply(&HashMap::new()), Err(AdjustError::UnknownPart(p)));
    }

    #[test]
    fn test_huge_restock_is_overflow_not_panic() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Restock,
            AdjustMode::Create,
            &[],
            &[StockLine::new(p, i64::MAX)],
        );
        assert_eq!(plan.apply(&stock(&[(p, 1)])), Err(AdjustError::Overflow(p)));
    }

    #[test]
    fn test_huge_sale_is_shortage_not_panic() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Sales,
            AdjustMode::Create,
            &[],
            &[StockLine::new(p, i64::MAX), StockLine::new(Uuid::new_v4(), 1)],
        );
        match plan.apply(&stock(&[(p, 5)])) {
            Err(AdjustError::Shortage(s)) => {
                assert_eq!(s.available, 5);
                assert_eq!(s.requested, i64::MAX);
            }
            other => panic!("expected shortage, got {:?}", other),
        }
    }

    #[test]
    fn test_part_ids_sorted() {
        let mut ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let lines: Vec<StockLine> = ids.iter().map(|id| StockLine::new(*id, 1)).collect();
        let plan = StockPlan::new(TransactionFamily::Sales, AdjustMode::Create, &[], &lines);
        ids.sort();
        assert_eq!(plan.part_ids(), ids);
    }

    #[test]
    fn test_delete_ignores_current() {
        let p = Uuid::new_v4();
        let plan = StockPlan::new(
            TransactionFamily::Sales,
            AdjustMode::Delete,
            &[StockLine::new(p, 4)],
            &[StockLine::new(p, 100)],
        );
        assert_eq!(plan.delta(&p), 4);
    }
}
