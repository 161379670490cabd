use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{Order, OrderStatus};

/// A batch of orders assigned to one driver for one delivery trip.
///
/// Runs are a derived grouping over order snapshots, not a persisted
/// entity of this core: membership is `delivery_run_id` on the orders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRun {
    pub id: Uuid,
    pub driver_id: Uuid,
}

impl DeliveryRun {
    pub fn new(driver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id,
        }
    }

    /// Orders belonging to this run, in snapshot order.
    pub fn members<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders
            .iter()
            .filter(|o| o.delivery_run_id == Some(self.id))
            .collect()
    }

    pub fn phase(&self, orders: &[Order]) -> RunPhase {
        RunPhase::derive(&self.members(orders))
    }
}

/// Lifecycle phase of a delivery run, derived from its members' statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum RunPhase {
    Draft,
    Active,
    Settled,
}

impl RunPhase {
    /// Derives the phase of a run from its member orders.
    ///
    /// Any member out for delivery makes the run `Active`. A run is
    /// `Settled` once nothing is out and every member is either completed
    /// with a withdrawal date or returned to storage. Everything else is
    /// `Draft` — including the ambiguous all-`Stored` run, which cannot be
    /// told apart from an unlaunched one without launch history, and a
    /// completed member still awaiting its withdrawal date (settlement in
    /// progress).
    pub fn derive(members: &[&Order]) -> RunPhase {
        if members
            .iter()
            .any(|o| o.status == OrderStatus::OutForDelivery)
        {
            return RunPhase::Active;
        }
        let any_completed = members.iter().any(|o| o.status == OrderStatus::Completed);
        let reconciled = members.iter().all(|o| match o.status {
            OrderStatus::Completed => o.withdrawal_date.is_some(),
            OrderStatus::Stored => true,
            _ => false,
        });
        if any_completed && reconciled {
            RunPhase::Settled
        } else {
            RunPhase::Draft
        }
    }
}
