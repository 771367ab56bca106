//! Fixed reference markers: New England state capitals
//! New Hampshire is intentionally absent from the service map.

use serde::Serialize;

use crate::models::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferencePoint {
    pub state: &'static str,
    pub state_name: &'static str,
    pub capital: &'static str,
    pub coordinates: Coordinates,
}

impl ReferencePoint {
    /// Popup text shown on the capital's marker
    pub fn label(&self) -> String {
        format!("{} (Capital)", self.capital)
    }
}

pub static STATE_CAPITALS: &[ReferencePoint] = &[
    ReferencePoint {
        state: "MA",
        state_name: "Massachusetts",
        capital: "Boston",
        coordinates: Coordinates::new(42.3601, -71.0589),
    },
    ReferencePoint {
        state: "ME",
        state_name: "Maine",
        capital: "Augusta",
        coordinates: Coordinates::new(44.3106, -69.7795),
    },
    ReferencePoint {
        state: "RI",
        state_name: "Rhode Island",
        capital: "Providence",
        coordinates: Coordinates::new(41.824, -71.4128),
    },
    ReferencePoint {
        state: "VT",
        state_name: "Vermont",
        capital: "Montpelier",
        coordinates: Coordinates::new(44.2601, -72.5754),
    },
];

/// Look up a capital by two-letter state code, case-insensitive.
pub fn by_state(code: &str) -> Option<&'static ReferencePoint> {
    let code = code.trim();
    STATE_CAPITALS
        .iter()
        .find(|p| p.state.eq_ignore_ascii_case(code))
}
