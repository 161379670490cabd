//! Cargodesk Core Library
//!
//! This crate provides the business-rule core of the Cargodesk
//! shipping-and-logistics order-management system: storage slot advising,
//! the collection ledger, and driver settlement. The surrounding
//! application layer owns persistence, auth, and transport; this crate
//! computes over immutable snapshots it is handed and never mutates them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod models;
pub mod money;
pub mod services;

pub use config::{AdvisorConfig, AppConfig, PricingConfig};
pub use errors::ServiceError;
pub use models::delivery_run::{DeliveryRun, RunPhase};
pub use models::order::{Order, OrderStatus, SlotRef, StorageLocation};
pub use models::storage_drawer::StorageDrawer;
pub use services::collections::{
    BulkPaymentResult, CollectionLedger, PaymentAllocation, PaymentStatus,
};
pub use services::pricing::{PriceQuote, QuickPriceCalculator};
pub use services::settlement::{
    ClosingUpdate, SettlementDirection, SettlementResult, SettlementService,
};
pub use services::storage_advisor::{SlotSuggestion, StorageSlotAdvisor};
