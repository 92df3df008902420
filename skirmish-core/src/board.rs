//! Hex board geometry with axial coordinates

use serde::{Deserialize, Serialize};

/// Default board radius for scenarios that do not specify one
pub const DEFAULT_BOARD_RADIUS: i8 = 8;

/// Largest board whose every tile and ring around it stays addressable
pub const MAX_BOARD_RADIUS: i8 = 63;

/// Axial hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i8,
    pub r: i8,
}

impl Hex {
    pub const fn new(q: i8, r: i8) -> Self {
        Self { q, r }
    }

    /// Check if this hex lies within a board of the given radius
    pub fn within(&self, radius: i8) -> bool {
        let (q, r, radius) = (self.q as i16, self.r as i16, radius as i16);
        q.abs() <= radius && r.abs() <= radius && (q + r).abs() <= radius
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: Hex) -> u8 {
        let dq = (self.q as i16 - other.q as i16).abs();
        let dr = (self.r as i16 - other.r as i16).abs();
        let ds = ((self.q as i16 + self.r as i16) - (other.q as i16 + other.r as i16)).abs();
        ((dq + dr + ds) / 2) as u8
    }

    /// Get neighbor in direction (0-5)
    pub fn neighbor(&self, direction: u8) -> Hex {
        let (dq, dr) = DIRECTIONS[direction as usize % 6];
        Hex::new(self.q.saturating_add(dq), self.r.saturating_add(dr))
    }

    /// Nearest of the six directions pointing from this hex toward `other`.
    ///
    /// Ties resolve to the lowest direction index. Returns `None` for the
    /// same hex.
    pub fn direction_to(&self, other: Hex) -> Option<u8> {
        if *self == other {
            return None;
        }
        let (x, y) = to_cartesian(other.q as f32 - self.q as f32, other.r as f32 - self.r as f32);

        let mut best_dir = 0u8;
        let mut best_dot = f32::NEG_INFINITY;
        for (dir, &(dq, dr)) in DIRECTIONS.iter().enumerate() {
            let (dx, dy) = to_cartesian(dq as f32, dr as f32);
            let dot = x * dx + y * dy;
            if dot > best_dot + 1e-4 {
                best_dot = dot;
                best_dir = dir as u8;
            }
        }
        Some(best_dir)
    }

    /// All hexes at exactly `radius` steps, walking the ring clockwise from
    /// the north-west corner. Hexes outside the coordinate range are left
    /// out.
    pub fn ring(&self, radius: u8) -> Vec<Hex> {
        if radius == 0 {
            return vec![*self];
        }
        let mut out = Vec::with_capacity(6 * radius as usize);
        let (mut q, mut r) = (self.q as i16 - radius as i16, self.r as i16);
        for dir in 0..6usize {
            let (dq, dr) = DIRECTIONS[(dir + 1) % 6];
            for _ in 0..radius {
                if let (Ok(hq), Ok(hr)) = (i8::try_from(q), i8::try_from(r)) {
                    out.push(Hex::new(hq, hr));
                }
                q += dq as i16;
                r += dr as i16;
            }
        }
        out
    }

    /// All hexes within `radius` steps, center first then ring by ring
    pub fn spiral(&self, radius: u8) -> Vec<Hex> {
        (0..=radius).flat_map(|k| self.ring(k)).collect()
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Pointy-top axial to cartesian
fn to_cartesian(q: f32, r: f32) -> (f32, f32) {
    (3f32.sqrt() * (q + r / 2.0), 1.5 * r)
}

/// Direction vectors in axial coordinates (dq, dr)
/// Index: 0=N, 1=NE, 2=SE, 3=S, 4=SW, 5=NW
pub const DIRECTIONS: [(i8, i8); 6] = [
    (0, -1),  // N
    (1, -1),  // NE
    (1, 0),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // NW
];

/// Discrete cover level a tile offers in one direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverLevel {
    #[default]
    None = 0,
    Light = 1,
    Medium = 2,
    Heavy = 3,
}

impl CoverLevel {
    pub fn index(self) -> usize {
        self as usize
    }
}
