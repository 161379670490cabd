use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::AdvisorConfig;
use crate::models::order::{Order, SlotRef, StorageLocation};
use crate::models::storage_drawer::StorageDrawer;

const REASON_CLIENT_CLUSTER: &str = "cluster with client's existing orders";
const REASON_SHIPMENT_CLUSTER: &str = "cluster with same shipment";
const REASON_SAME_DRAWER_SLOT: &str = "empty slot in same drawer";
const REASON_ACTIVE_DRAWER: &str = "active drawer, optimize space";
const REASON_FIRST_EMPTY_DRAWER: &str = "first empty drawer available";
const REASON_EMPTY_SLOT: &str = "empty slot available";

const SCORE_CLIENT_CLUSTER: u32 = 100;
const SCORE_SHIPMENT_CLUSTER: u32 = 80;
const SCORE_ACTIVE_DRAWER: u32 = 50;
const SCORE_FALLBACK_DRAWER: u32 = 10;

/// Recommendation returned by the advisor. `location: None` with score 0
/// means no drawer has room; the caller falls back to manual selection or
/// the `Floor` pseudo-location.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlotSuggestion {
    pub location: Option<StorageLocation>,
    pub score: u32,
    pub reasons: Vec<String>,
}

impl SlotSuggestion {
    fn none() -> Self {
        Self {
            location: None,
            score: 0,
            reasons: Vec::new(),
        }
    }

    fn slot(slot: SlotRef, score: u32, reasons: &[&str]) -> Self {
        Self {
            location: Some(StorageLocation::Slot(slot)),
            score,
            reasons: reasons.iter().map(|r| (*r).to_string()).collect(),
        }
    }
}

/// Recommends the best empty storage slot for an order using a priority
/// cascade: cluster with the client's existing orders, cluster with the
/// same shipment, then pick the least-fragmenting drawer.
///
/// Pure over its inputs. The recommendation carries no reservation: the
/// caller must re-fetch the freshest snapshot before committing a slot and
/// retry with a new suggestion when someone else took it first.
#[derive(Clone, Debug)]
pub struct StorageSlotAdvisor {
    config: AdvisorConfig,
}

impl StorageSlotAdvisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self { config }
    }

    /// Suggests a slot for `order` given the full order set (for occupancy)
    /// and the configured drawers. First cascade rule to match wins.
    #[instrument(skip(self, order, all_orders, drawers), fields(order_id = %order.id))]
    pub fn suggest(
        &self,
        order: &Order,
        all_orders: &[Order],
        drawers: &[StorageDrawer],
    ) -> SlotSuggestion {
        let occupancy = OccupancyIndex::build(order.id, all_orders);

        let suggestion = self
            .cluster_with_client(order, all_orders, drawers, &occupancy)
            .or_else(|| self.cluster_with_shipment(order, all_orders, drawers, &occupancy))
            .or_else(|| self.least_fragmenting_drawer(drawers, &occupancy))
            .unwrap_or_else(SlotSuggestion::none);

        match &suggestion.location {
            Some(location) => {
                info!(slot = %location, score = suggestion.score, "storage slot suggested")
            }
            None => debug!("no drawer has room; caller falls back to manual or floor placement"),
        }
        suggestion
    }

    /// Rule 1: the slot this client already uses most. Capacity is not
    /// re-checked here — the business prefers keeping a client's parcels
    /// together over spreading them out — unless strict slot assignment is
    /// configured, in which case an occupied slot is skipped in favour of
    /// the first free slot of the same drawer.
    fn cluster_with_client(
        &self,
        order: &Order,
        all_orders: &[Order],
        drawers: &[StorageDrawer],
        occupancy: &OccupancyIndex,
    ) -> Option<SlotSuggestion> {
        let mut tally: Vec<(&SlotRef, usize)> = Vec::new();
        for other in all_orders {
            if other.id == order.id || !other.is_stored() || other.client_id != order.client_id {
                continue;
            }
            if let Some(StorageLocation::Slot(slot)) = &other.storage_location {
                match tally.iter_mut().find(|(s, _)| *s == slot) {
                    Some(entry) => entry.1 += 1,
                    None => tally.push((slot, 1)),
                }
            }
        }

        // Most frequent slot; first appearance wins ties.
        let mut best: Option<(&SlotRef, usize)> = None;
        for &(slot, count) in &tally {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((slot, count));
            }
        }
        let (slot, _) = best?;

        let drawer = drawers.iter().find(|d| d.name == slot.drawer)?;

        if self.config.strict_slot_assignment && occupancy.is_occupied(&slot.drawer, slot.number) {
            let free = self.first_free_slot(drawer, occupancy)?;
            return Some(SlotSuggestion::slot(
                free,
                SCORE_CLIENT_CLUSTER,
                &[REASON_CLIENT_CLUSTER, REASON_SAME_DRAWER_SLOT],
            ));
        }

        Some(SlotSuggestion::slot(
            slot.clone(),
            SCORE_CLIENT_CLUSTER,
            &[REASON_CLIENT_CLUSTER],
        ))
    }

    /// Rule 2: the drawer holding the most recently updated stored order of
    /// the same shipment, when it still has a free slot.
    fn cluster_with_shipment(
        &self,
        order: &Order,
        all_orders: &[Order],
        drawers: &[StorageDrawer],
        occupancy: &OccupancyIndex,
    ) -> Option<SlotSuggestion> {
        let shipment_id = order.shipment_id?;

        let mut latest: Option<&Order> = None;
        for other in all_orders {
            if other.id == order.id
                || !other.is_stored()
                || other.shipment_id != Some(shipment_id)
                || !matches!(other.storage_location, Some(StorageLocation::Slot(_)))
            {
                continue;
            }
            let timestamp = other.updated_at.unwrap_or(other.created_at);
            let is_newer = latest
                .map(|l| timestamp > l.updated_at.unwrap_or(l.created_at))
                .unwrap_or(true);
            if is_newer {
                latest = Some(other);
            }
        }

        let Some(StorageLocation::Slot(sibling_slot)) = &latest?.storage_location else {
            return None;
        };
        let drawer = drawers.iter().find(|d| d.name == sibling_slot.drawer)?;

        let capacity = self.capacity_of(drawer);
        if occupancy.occupied_count(&drawer.name) >= capacity {
            return None;
        }
        let free = self.first_free_slot(drawer, occupancy)?;
        Some(SlotSuggestion::slot(
            free,
            SCORE_SHIPMENT_CLUSTER,
            &[REASON_SHIPMENT_CLUSTER, REASON_SAME_DRAWER_SLOT],
        ))
    }

    /// Rule 3: score every non-full drawer by fill ratio and take the
    /// highest, ties broken by list order. Partially used drawers below
    /// 90 % fill win over empty ones so active drawers fill up before a
    /// fresh drawer is opened.
    fn least_fragmenting_drawer(
        &self,
        drawers: &[StorageDrawer],
        occupancy: &OccupancyIndex,
    ) -> Option<SlotSuggestion> {
        let mut best: Option<(u32, &StorageDrawer, &'static str)> = None;
        for drawer in drawers {
            let capacity = self.capacity_of(drawer);
            if capacity == 0 {
                continue;
            }
            let used = occupancy.occupied_count(&drawer.name);
            if used >= capacity {
                continue;
            }
            let (score, reason) = if used == 0 {
                (SCORE_FALLBACK_DRAWER, REASON_FIRST_EMPTY_DRAWER)
            } else if 10 * used < 9 * capacity {
                // fill ratio below 0.9
                (SCORE_ACTIVE_DRAWER, REASON_ACTIVE_DRAWER)
            } else {
                (SCORE_FALLBACK_DRAWER, REASON_EMPTY_SLOT)
            };
            if best.map_or(true, |(best_score, _, _)| score > best_score) {
                best = Some((score, drawer, reason));
            }
        }

        let (score, drawer, reason) = best?;
        let free = self.first_free_slot(drawer, occupancy)?;
        Some(SlotSuggestion::slot(free, score, &[reason]))
    }

    fn capacity_of(&self, drawer: &StorageDrawer) -> u32 {
        drawer.effective_capacity_with(self.config.default_rows, self.config.default_columns)
    }

    fn first_free_slot(&self, drawer: &StorageDrawer, occupancy: &OccupancyIndex) -> Option<SlotRef> {
        (1..=self.capacity_of(drawer))
            .find(|number| !occupancy.is_occupied(&drawer.name, *number))
            .map(|number| SlotRef::new(drawer.name.clone(), number))
    }
}

/// Occupancy derived from the order set: slots referenced by currently
/// stored orders, the candidate order itself excluded. Floor placements
/// never count. A slot may be referenced by more than one order.
struct OccupancyIndex {
    slots: HashMap<(String, u32), usize>,
}

impl OccupancyIndex {
    fn build(candidate_id: Uuid, orders: &[Order]) -> Self {
        let mut slots: HashMap<(String, u32), usize> = HashMap::new();
        for order in orders {
            if order.id == candidate_id || !order.is_stored() {
                continue;
            }
            if let Some(StorageLocation::Slot(slot)) = &order.storage_location {
                *slots.entry((slot.drawer.clone(), slot.number)).or_insert(0) += 1;
            }
        }
        Self { slots }
    }

    fn is_occupied(&self, drawer: &str, number: u32) -> bool {
        self.slots
            .get(&(drawer.to_string(), number))
            .map_or(false, |count| *count > 0)
    }

    /// Number of distinct occupied slots in a drawer.
    fn occupied_count(&self, drawer: &str) -> u32 {
        self.slots.keys().filter(|(d, _)| d == drawer).count() as u32
    }
}
