// Core ID types and type aliases

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

// === TYPE ALIASES ===

pub type Price = f64;
pub type Step = u64;

// === NEWTYPE IDS ===

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl WorkerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Grid cell of a firm. One firm per cell, so this is also the firm's identity.
#[derive(
    Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct FirmCoord {
    pub x: u32,
    pub y: u32,
}

impl FirmCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance (max of the axis distances).
    pub fn chebyshev(self, other: FirmCoord) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl std::fmt::Display for FirmCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

// === SECTORS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    FastFood,
    Other,
}

// === ZONES ===

/// Axis-aligned rectangle of cells, half-open on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Zone {
    pub x_start: u32,
    pub x_end: u32,
    pub y_start: u32,
    pub y_end: u32,
}

impl Zone {
    pub fn new(x: std::ops::Range<u32>, y: std::ops::Range<u32>) -> Self {
        Self {
            x_start: x.start,
            x_end: x.end,
            y_start: y.start,
            y_end: y.end,
        }
    }

    pub fn contains(&self, coord: FirmCoord) -> bool {
        (self.x_start..self.x_end).contains(&coord.x)
            && (self.y_start..self.y_end).contains(&coord.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance() {
        let a = FirmCoord::new(2, 2);
        assert_eq!(a.chebyshev(FirmCoord::new(2, 2)), 0);
        assert_eq!(a.chebyshev(FirmCoord::new(3, 3)), 1);
        assert_eq!(a.chebyshev(FirmCoord::new(0, 3)), 2);
    }

    #[test]
    fn test_zone_is_half_open() {
        let zone = Zone::new(0..5, 0..5);
        assert!(zone.contains(FirmCoord::new(0, 0)));
        assert!(zone.contains(FirmCoord::new(4, 4)));
        assert!(!zone.contains(FirmCoord::new(5, 0)));
        assert!(!zone.contains(FirmCoord::new(0, 5)));
    }
}
