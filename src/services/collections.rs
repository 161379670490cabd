use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::models::order::Order;
use crate::money::{or_zero, round_mru};

/// Display/filtering classification of an order's payment state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Unpaid,
}

/// What one order received from a bulk payment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaymentAllocation {
    pub order_id: Uuid,
    pub prior_paid: Decimal,
    pub allocated: Decimal,
    pub new_amount_paid: Decimal,
    /// Due still open after this allocation; zero when covered in full.
    pub outstanding: Decimal,
}

/// Result of spreading one payment over several orders.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BulkPaymentResult {
    pub allocations: Vec<PaymentAllocation>,
    /// Pool remainder beyond all dues. The application layer drops this
    /// today rather than tracking a credit; it is surfaced here so the
    /// caller can see what it is dropping.
    pub unallocated: Decimal,
}

/// Per-order debt and collection arithmetic.
///
/// Every operation is a total function: absent financial fields coerce to
/// zero, amounts clamp at zero instead of going negative, and no input
/// combination produces an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollectionLedger;

impl CollectionLedger {
    pub fn new() -> Self {
        Self
    }

    /// Amount still owed for product + international shipping, excluding
    /// the local delivery fee.
    pub fn base_debt(&self, order: &Order) -> Decimal {
        let product_total = round_mru(or_zero(order.price_mru) + or_zero(order.commission));
        let shipping_total = round_mru(or_zero(order.shipping_cost));
        let order_base_value = product_total + shipping_total;
        (order_base_value - round_mru(or_zero(order.amount_paid))).max(Decimal::ZERO)
    }

    /// Cash the delivery driver must collect at the door. A prepaid
    /// delivery fee stays with the office, so the driver only chases the
    /// product/shipping balance.
    pub fn cash_to_collect(&self, order: &Order) -> Decimal {
        let debt = self.base_debt(order);
        if order.is_delivery_fee_prepaid {
            debt
        } else {
            debt + round_mru(or_zero(order.local_delivery_cost))
        }
    }

    /// Full order value including the delivery fee.
    pub fn grand_total(&self, order: &Order) -> Decimal {
        order.total_cost()
    }

    pub fn payment_status(&self, order: &Order) -> PaymentStatus {
        let grand_total = self.grand_total(order);
        let paid = round_mru(or_zero(order.amount_paid));
        let remaining = grand_total - paid;
        if remaining <= Decimal::ZERO && grand_total > Decimal::ZERO {
            PaymentStatus::Paid
        } else if paid > Decimal::ZERO && remaining > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }

    /// Spreads a single payment over several orders, in the order given:
    /// each order takes the smaller of its open due and the remaining
    /// pool until the pool runs dry. An order left short is a normal
    /// partial allocation, not an error.
    #[instrument(skip(self, orders), fields(pool = %pool, order_count = orders.len()))]
    pub fn allocate_bulk_payment(&self, pool: Decimal, orders: &[Order]) -> BulkPaymentResult {
        let mut remaining_pool = pool.max(Decimal::ZERO);
        let mut allocations = Vec::with_capacity(orders.len());

        for order in orders {
            let prior_paid = round_mru(or_zero(order.amount_paid));
            let due = (self.grand_total(order) - prior_paid).max(Decimal::ZERO);
            let allocated = remaining_pool.min(due);
            remaining_pool -= allocated;
            allocations.push(PaymentAllocation {
                order_id: order.id,
                prior_paid,
                allocated,
                new_amount_paid: prior_paid + allocated,
                outstanding: due - allocated,
            });
        }

        if remaining_pool > Decimal::ZERO {
            // Surplus beyond all dues; the caller drops it (no credit ledger).
            warn!(unallocated = %remaining_pool, "bulk payment exceeds total dues");
        }

        BulkPaymentResult {
            allocations,
            unallocated: remaining_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order_with(
        price: Decimal,
        commission: Decimal,
        shipping: Decimal,
        paid: Decimal,
        delivery: Decimal,
        prepaid: bool,
    ) -> Order {
        let mut order = Order::new("CMD-0001".to_string(), Uuid::new_v4(), None);
        order.price_mru = Some(price);
        order.commission = Some(commission);
        order.shipping_cost = Some(shipping);
        order.amount_paid = Some(paid);
        order.local_delivery_cost = Some(delivery);
        order.is_delivery_fee_prepaid = prepaid;
        order
    }

    // ========================================
    // Base debt and cash to collect
    // ========================================

    #[test]
    fn test_base_debt_excludes_delivery_fee() {
        let ledger = CollectionLedger::new();
        let order = order_with(
            dec!(1000),
            dec!(100),
            dec!(200),
            dec!(500),
            dec!(150),
            false,
        );
        assert_eq!(ledger.base_debt(&order), dec!(800));
        assert_eq!(ledger.cash_to_collect(&order), dec!(950));
    }

    #[test]
    fn test_prepaid_fee_is_not_collected_again() {
        let ledger = CollectionLedger::new();
        let order = order_with(dec!(1000), dec!(100), dec!(200), dec!(500), dec!(150), true);
        assert_eq!(ledger.cash_to_collect(&order), dec!(800));
    }

    #[test]
    fn test_overpaid_order_clamps_to_zero() {
        let ledger = CollectionLedger::new();
        let order = order_with(dec!(100), dec!(10), dec!(20), dec!(500), dec!(50), false);
        assert_eq!(ledger.base_debt(&order), Decimal::ZERO);
        // Delivery fee is still owed: it is outside the base debt.
        assert_eq!(ledger.cash_to_collect(&order), dec!(50));
    }

    #[test]
    fn test_missing_financials_coerce_to_zero() {
        let ledger = CollectionLedger::new();
        let order = Order::new("CMD-0002".to_string(), Uuid::new_v4(), None);
        assert_eq!(ledger.base_debt(&order), Decimal::ZERO);
        assert_eq!(ledger.cash_to_collect(&order), Decimal::ZERO);
        assert_eq!(ledger.grand_total(&order), Decimal::ZERO);
    }

    #[test]
    fn test_fractional_amounts_round_per_component() {
        let ledger = CollectionLedger::new();
        let order = order_with(
            dec!(100.4),
            dec!(0.2),
            dec!(10.5),
            dec!(0),
            dec!(49.5),
            false,
        );
        // product 100.6 -> 101, shipping 10.5 -> 11, delivery 49.5 -> 50
        assert_eq!(ledger.base_debt(&order), dec!(112));
        assert_eq!(ledger.cash_to_collect(&order), dec!(162));
    }

    // ========================================
    // Payment status classification
    // ========================================

    #[test]
    fn test_payment_status_classification() {
        let ledger = CollectionLedger::new();

        let unpaid = order_with(dec!(1000), dec!(0), dec!(0), dec!(0), dec!(0), false);
        assert_eq!(ledger.payment_status(&unpaid), PaymentStatus::Unpaid);

        let partial = order_with(dec!(1000), dec!(0), dec!(0), dec!(400), dec!(0), false);
        assert_eq!(ledger.payment_status(&partial), PaymentStatus::Partial);

        let paid = order_with(dec!(1000), dec!(0), dec!(0), dec!(1000), dec!(0), false);
        assert_eq!(ledger.payment_status(&paid), PaymentStatus::Paid);
    }

    #[test]
    fn test_zero_total_order_is_unpaid_not_paid() {
        let ledger = CollectionLedger::new();
        let order = Order::new("CMD-0003".to_string(), Uuid::new_v4(), None);
        assert_eq!(ledger.payment_status(&order), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_delivery_fee_counts_toward_grand_total() {
        let ledger = CollectionLedger::new();
        // Product fully paid but delivery fee open: still partial.
        let order = order_with(dec!(1000), dec!(0), dec!(0), dec!(1000), dec!(150), false);
        assert_eq!(ledger.payment_status(&order), PaymentStatus::Partial);
    }

    // ========================================
    // Bulk payment allocation
    // ========================================

    #[test]
    fn test_bulk_allocation_in_given_order() {
        let ledger = CollectionLedger::new();
        let orders = vec![
            order_with(dec!(600), dec!(0), dec!(0), dec!(0), dec!(0), false),
            order_with(dec!(300), dec!(0), dec!(0), dec!(0), dec!(0), false),
            order_with(dec!(500), dec!(0), dec!(0), dec!(0), dec!(0), false),
        ];
        let result = ledger.allocate_bulk_payment(dec!(1000), &orders);

        let allocated: Vec<Decimal> = result.allocations.iter().map(|a| a.allocated).collect();
        assert_eq!(allocated, vec![dec!(600), dec!(300), dec!(100)]);
        assert_eq!(result.allocations[2].outstanding, dec!(400));
        assert_eq!(result.allocations[2].new_amount_paid, dec!(100));
        assert_eq!(result.unallocated, Decimal::ZERO);
    }

    #[test]
    fn test_bulk_allocation_respects_prior_payments() {
        let ledger = CollectionLedger::new();
        let orders = vec![order_with(
            dec!(500),
            dec!(0),
            dec!(0),
            dec!(200),
            dec!(0),
            false,
        )];
        let result = ledger.allocate_bulk_payment(dec!(1000), &orders);
        assert_eq!(result.allocations[0].allocated, dec!(300));
        assert_eq!(result.allocations[0].new_amount_paid, dec!(500));
        assert_eq!(result.unallocated, dec!(700));
    }

    #[test]
    fn test_bulk_allocation_surfaces_surplus() {
        let ledger = CollectionLedger::new();
        let orders = vec![order_with(
            dec!(100),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
            false,
        )];
        let result = ledger.allocate_bulk_payment(dec!(250), &orders);
        assert_eq!(result.unallocated, dec!(150));
    }

    #[test]
    fn test_bulk_allocation_with_empty_pool() {
        let ledger = CollectionLedger::new();
        let orders = vec![order_with(
            dec!(100),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(0),
            false,
        )];
        let result = ledger.allocate_bulk_payment(Decimal::ZERO, &orders);
        assert_eq!(result.allocations[0].allocated, Decimal::ZERO);
        assert_eq!(result.allocations[0].outstanding, dec!(100));
    }

    #[test]
    fn test_allocation_includes_delivery_fee_in_due() {
        let ledger = CollectionLedger::new();
        let orders = vec![order_with(
            dec!(100),
            dec!(0),
            dec!(0),
            dec!(0),
            dec!(50),
            false,
        )];
        let result = ledger.allocate_bulk_payment(dec!(1000), &orders);
        assert_eq!(result.allocations[0].allocated, dec!(150));
    }
}
