use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::order::SlotRef;

/// Fallbacks used when a drawer carries neither an explicit capacity nor a
/// full grid. One row of five slots is the canonical default.
pub const DEFAULT_ROWS: u32 = 1;
pub const DEFAULT_COLUMNS: u32 = 5;

/// A physical storage unit subdivided into numbered slots
/// `"<name>-01" .. "<name>-<capacity>"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct StorageDrawer {
    pub id: Uuid,

    /// Unique human label; the prefix of every slot in this drawer.
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Explicit slot count, when configured.
    pub capacity: Option<u32>,

    /// Grid dimensions, used when no explicit capacity is set.
    pub rows: Option<u32>,
    pub columns: Option<u32>,
}

impl StorageDrawer {
    pub fn new(name: impl Into<String>, capacity: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            capacity,
            rows: None,
            columns: None,
        }
    }

    /// Effective slot count: the explicit capacity when positive, else
    /// `rows * columns` with the canonical defaults filling the gaps.
    pub fn effective_capacity(&self) -> u32 {
        self.effective_capacity_with(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }

    /// Same as [`effective_capacity`](Self::effective_capacity) but with
    /// caller-configured grid defaults.
    pub fn effective_capacity_with(&self, default_rows: u32, default_columns: u32) -> u32 {
        match self.capacity {
            Some(capacity) if capacity > 0 => capacity,
            _ => {
                let rows = self.rows.filter(|r| *r > 0).unwrap_or(default_rows);
                let columns = self.columns.filter(|c| *c > 0).unwrap_or(default_columns);
                rows * columns
            }
        }
    }

    /// All slots of this drawer in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = SlotRef> + '_ {
        (1..=self.effective_capacity()).map(move |number| SlotRef::new(self.name.clone(), number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_capacity_wins() {
        let mut drawer = StorageDrawer::new("A", Some(12));
        drawer.rows = Some(2);
        drawer.columns = Some(3);
        assert_eq!(drawer.effective_capacity(), 12);
    }

    #[test]
    fn grid_capacity_when_no_explicit_count() {
        let mut drawer = StorageDrawer::new("B", None);
        drawer.rows = Some(3);
        drawer.columns = Some(4);
        assert_eq!(drawer.effective_capacity(), 12);
    }

    #[test]
    fn canonical_defaults_fill_missing_dimensions() {
        let drawer = StorageDrawer::new("C", None);
        assert_eq!(drawer.effective_capacity(), DEFAULT_ROWS * DEFAULT_COLUMNS);

        let mut partial = StorageDrawer::new("D", None);
        partial.rows = Some(2);
        assert_eq!(partial.effective_capacity(), 2 * DEFAULT_COLUMNS);
    }

    #[test]
    fn zero_capacity_falls_back_to_grid() {
        let drawer = StorageDrawer::new("E", Some(0));
        assert_eq!(drawer.effective_capacity(), DEFAULT_ROWS * DEFAULT_COLUMNS);
    }

    #[test]
    fn slots_are_labelled_ascending() {
        let drawer = StorageDrawer::new("A", Some(3));
        let labels: Vec<String> = drawer.slots().map(|s| s.to_string()).collect();
        assert_eq!(labels, vec!["A-01", "A-02", "A-03"]);
    }
}
