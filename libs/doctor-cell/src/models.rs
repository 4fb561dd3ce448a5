use serde::{Deserialize, Serialize};

/// Reference data for a bookable doctor. Owned by the catalog, never mutated
/// by the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    /// Time-of-day slots in `HH:MM`, in display order.
    pub available_slots: Vec<String>,
}

impl Doctor {
    pub fn new(id: &str, name: &str, specialty: &str, slots: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            specialty: specialty.to_string(),
            available_slots: slots.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn offers_slot(&self, time: &str) -> bool {
        self.available_slots.iter().any(|slot| slot == time)
    }
}
