use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::errors::ServiceError;
use crate::money;

/// Enum representing the possible statuses of an order.
///
/// The lifecycle is a strict linear progression with two exits:
/// `Cancelled` is reachable from every pre-dispatch state, and an order
/// out for delivery either completes or returns to storage.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum OrderStatus {
    New,
    Ordered,
    ShippedFromStore,
    ArrivedAtOffice,
    Stored,
    OutForDelivery,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether the lifecycle permits moving from `self` to `to`.
    ///
    /// The outer match is exhaustive over the current status so adding a
    /// variant fails to compile until every arm is revisited. Same-status
    /// transitions are accepted as no-ops.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            New => matches!(to, Ordered | Cancelled | New),
            Ordered => matches!(to, ShippedFromStore | Cancelled | Ordered),
            ShippedFromStore => matches!(to, ArrivedAtOffice | Cancelled | ShippedFromStore),
            ArrivedAtOffice => matches!(to, Stored | Cancelled | ArrivedAtOffice),
            Stored => matches!(to, OutForDelivery | Cancelled | Stored),
            // A launched order either completes or is returned to storage.
            OutForDelivery => matches!(to, Completed | Stored | OutForDelivery),
            Completed => matches!(to, Completed),
            Cancelled => matches!(to, Cancelled),
        }
    }

    /// Terminal statuses admit no further movement.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Reference to one numbered slot inside a drawer, rendered `"<Drawer>-<NN>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub drawer: String,
    pub number: u32,
}

impl SlotRef {
    pub fn new(drawer: impl Into<String>, number: u32) -> Self {
        Self {
            drawer: drawer.into(),
            number,
        }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.drawer, self.number)
    }
}

/// Where a stored order physically sits: a drawer slot, or the unlimited
/// `Floor` pseudo-location with no slot numbering.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageLocation {
    Slot(SlotRef),
    Floor,
}

const FLOOR_LABEL: &str = "Floor";

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Slot(slot) => slot.fmt(f),
            StorageLocation::Floor => f.write_str(FLOOR_LABEL),
        }
    }
}

impl FromStr for StorageLocation {
    type Err = ServiceError;

    /// Parses a location label. Splits on the last hyphen so drawer names
    /// may themselves contain hyphens (`"Top-Left-03"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == FLOOR_LABEL {
            return Ok(StorageLocation::Floor);
        }
        let (drawer, number) = s.rsplit_once('-').ok_or_else(|| {
            ServiceError::ValidationError(format!("malformed storage location: {}", s))
        })?;
        if drawer.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "storage location has an empty drawer name: {}",
                s
            )));
        }
        let number: u32 = number.parse().map_err(|_| {
            ServiceError::ValidationError(format!("malformed slot number in location: {}", s))
        })?;
        Ok(StorageLocation::Slot(SlotRef::new(drawer, number)))
    }
}

// Persisted as the bare label string (`"A-03"`, `"Floor"`), matching the
// stored representation the application layer already uses.
impl Serialize for StorageLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StorageLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// An order snapshot as supplied by the application layer.
///
/// Read-only to this core: services compute recommendations over it and
/// the caller writes results back through its own persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct Order {
    /// Primary key: unique identifier for the order.
    pub id: Uuid,

    /// Unique human-facing order number.
    #[validate(length(min = 1, max = 64))]
    pub order_number: String,

    /// Client who placed the order.
    pub client_id: Uuid,

    /// Inbound shipment this order travelled with, once known.
    pub shipment_id: Option<Uuid>,

    /// Store the goods were purchased from.
    pub store_id: Option<Uuid>,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// Product price converted to MRU.
    pub price_mru: Option<Decimal>,

    /// Service fee charged on top of the product price.
    pub commission: Option<Decimal>,

    /// International shipping cost.
    pub shipping_cost: Option<Decimal>,

    /// Last-mile delivery fee.
    pub local_delivery_cost: Option<Decimal>,

    /// Cumulative amount the client has paid so far.
    pub amount_paid: Option<Decimal>,

    /// Whether the client paid the delivery fee to the office up front.
    pub is_delivery_fee_prepaid: bool,

    /// Recorded package weight. Must be present and positive before the
    /// order may be dispatched or completed.
    #[validate(custom = "validate_weight")]
    pub weight_kg: Option<Decimal>,

    /// Physical location while the order is `Stored`.
    pub storage_location: Option<StorageLocation>,

    /// Delivery run the order is assigned to, if any.
    pub delivery_run_id: Option<Uuid>,

    /// Driver carrying the order, if dispatched.
    pub driver_id: Option<Uuid>,

    /// Set when the order is reconciled at driver settlement.
    pub withdrawal_date: Option<DateTime<Utc>>,

    /// Timestamp when the order was created.
    pub created_at: DateTime<Utc>,

    /// Timestamp when the order was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

fn validate_weight(weight: &Decimal) -> Result<(), ValidationError> {
    if *weight <= Decimal::ZERO {
        return Err(ValidationError::new("weight_not_positive"));
    }
    Ok(())
}

impl Order {
    /// Creates a fresh order snapshot in the `New` status.
    pub fn new(order_number: String, client_id: Uuid, store_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number,
            client_id,
            shipment_id: None,
            store_id,
            status: OrderStatus::New,
            price_mru: None,
            commission: None,
            shipping_cost: None,
            local_delivery_cost: None,
            amount_paid: None,
            is_delivery_fee_prepaid: false,
            weight_kg: None,
            storage_location: None,
            delivery_run_id: None,
            driver_id: None,
            withdrawal_date: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.status == OrderStatus::Stored
    }

    fn has_recorded_weight(&self) -> bool {
        self.weight_kg.map_or(false, |w| w > Decimal::ZERO)
    }

    /// Checks a proposed status change against the lifecycle table and the
    /// dispatch weight invariant: nothing moves into `OutForDelivery` or
    /// `Completed` without a positive recorded weight.
    pub fn validate_transition(&self, to: OrderStatus) -> Result<(), ServiceError> {
        if !self.status.can_transition(to) {
            return Err(ServiceError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        if matches!(to, OrderStatus::OutForDelivery | OrderStatus::Completed)
            && !self.has_recorded_weight()
        {
            return Err(ServiceError::MissingWeight(self.id));
        }
        Ok(())
    }

    /// Updates the status after validating the transition.
    pub fn update_status(&mut self, new_status: OrderStatus) -> Result<(), ServiceError> {
        self.validate_transition(new_status)?;
        self.status = new_status;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Records where the order was placed in storage.
    pub fn set_storage_location(&mut self, location: StorageLocation) {
        self.storage_location = Some(location);
        self.updated_at = Some(Utc::now());
    }

    /// Grand total of the order: rounded product + commission, rounded
    /// international shipping, and the rounded delivery fee.
    pub fn total_cost(&self) -> Decimal {
        let product_total =
            money::round_mru(money::or_zero(self.price_mru) + money::or_zero(self.commission));
        let shipping_total = money::round_mru(money::or_zero(self.shipping_cost));
        let delivery_fee = money::round_mru(money::or_zero(self.local_delivery_cost));
        product_total + shipping_total + delivery_fee
    }
}
