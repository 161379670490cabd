use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus};
use crate::money::{or_zero, round_mru};
use crate::services::collections::CollectionLedger;

/// Who transfers cash to whom after a run is reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SettlementDirection {
    /// Driver hands the office this amount (zero included).
    DriverOwesOffice(Decimal),
    /// Office pays the driver this amount.
    OfficeOwesDriver(Decimal),
}

/// Per-order write the caller applies after settlement: stamp the
/// withdrawal date and mark the order paid in full.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClosingUpdate {
    pub order_id: Uuid,
    pub amount_paid: Decimal,
    pub withdrawal_date: DateTime<Utc>,
}

/// Totals reconciling the cash a driver physically collected against the
/// delivery fees they earned.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SettlementResult {
    /// Σ base debt over completed orders.
    pub total_base_debt_collected: Decimal,
    /// Σ delivery fees the driver collected at the door (prepaid fees
    /// stayed with the office and are not in the driver's hand).
    pub total_delivery_fees_from_client: Decimal,
    /// Σ delivery fees owed to the driver, regardless of who paid them.
    pub total_driver_earnings: Decimal,
    pub total_cash_in_hand: Decimal,
    /// Cash in hand minus earnings. Non-negative: driver owes the office;
    /// negative: the office owes the driver.
    pub net_total: Decimal,
    pub completed_order_count: usize,
    closing: Vec<ClosingUpdate>,
}

impl SettlementResult {
    pub fn direction(&self) -> SettlementDirection {
        if self.net_total >= Decimal::ZERO {
            SettlementDirection::DriverOwesOffice(self.net_total)
        } else {
            SettlementDirection::OfficeOwesDriver(-self.net_total)
        }
    }

    /// The batch update the caller persists for every completed order.
    pub fn closing_updates(&self) -> &[ClosingUpdate] {
        &self.closing
    }
}

/// Reconciles a delivery run once no order is left out for delivery.
#[derive(Clone, Debug, Default)]
pub struct SettlementService {
    ledger: CollectionLedger,
}

impl SettlementService {
    pub fn new(ledger: CollectionLedger) -> Self {
        Self { ledger }
    }

    /// Computes the driver settlement over a run's orders. Only orders in
    /// `Completed` enter the totals; returned orders are reconciled
    /// separately by putting them back into storage. Total function: an
    /// empty or all-returned run settles to all-zero.
    #[instrument(skip(self, run_orders), fields(order_count = run_orders.len()))]
    pub fn settle(&self, run_orders: &[Order]) -> SettlementResult {
        if run_orders
            .iter()
            .any(|o| o.status == OrderStatus::OutForDelivery)
        {
            warn!("run still has orders out for delivery; they are excluded from settlement");
        }

        let completed: Vec<&Order> = run_orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .collect();

        let mut total_base_debt_collected = Decimal::ZERO;
        let mut total_delivery_fees_from_client = Decimal::ZERO;
        let mut total_driver_earnings = Decimal::ZERO;
        for order in &completed {
            let fee = round_mru(or_zero(order.local_delivery_cost));
            total_base_debt_collected += self.ledger.base_debt(order);
            if !order.is_delivery_fee_prepaid {
                total_delivery_fees_from_client += fee;
            }
            total_driver_earnings += fee;
        }

        let total_cash_in_hand = total_base_debt_collected + total_delivery_fees_from_client;
        let net_total = total_cash_in_hand - total_driver_earnings;

        let withdrawal_date = Utc::now();
        let closing = completed
            .iter()
            .map(|order| ClosingUpdate {
                order_id: order.id,
                amount_paid: order.total_cost(),
                withdrawal_date,
            })
            .collect();

        info!(
            completed = completed.len(),
            cash_in_hand = %total_cash_in_hand,
            net = %net_total,
            "driver settlement computed"
        );

        SettlementResult {
            total_base_debt_collected,
            total_delivery_fees_from_client,
            total_driver_earnings,
            total_cash_in_hand,
            net_total,
            completed_order_count: completed.len(),
            closing,
        }
    }
}
