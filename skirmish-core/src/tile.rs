//! Per-tile scoring records and the per-evaluation tile map

use rustc_hash::FxHashMap;

use crate::board::{CoverLevel, Hex};

/// Score record for one candidate tile.
///
/// Criteria accumulate into the utility, safety and distance fields;
/// `final_score` stays zero until post-processing.
#[derive(Clone, Debug, PartialEq)]
pub struct TileScore {
    pub tile: Hex,
    /// Final destination when moving to `tile`
    pub ultimate_tile: Hex,
    /// Raw distance from the unit's current tile
    pub distance_to_current: f32,
    pub distance_score: f32,
    pub utility_score: f32,
    pub safety_score: f32,
    pub final_score: f32,
    /// Worst cover toward any known opponent
    pub cover: CoverLevel,
    /// Seen by at least one known opponent
    pub visible: bool,
}

impl TileScore {
    pub fn new(tile: Hex, ultimate_tile: Hex, distance_to_current: f32) -> Self {
        Self {
            tile,
            ultimate_tile,
            distance_to_current,
            distance_score: 0.0,
            utility_score: 0.0,
            safety_score: 0.0,
            final_score: 0.0,
            cover: CoverLevel::None,
            visible: false,
        }
    }

    /// Accumulate one criterion's contribution
    pub fn apply(&mut self, c: &Contribution) {
        self.utility_score += c.utility;
        self.safety_score += c.safety;
        self.distance_score += c.distance;
        if let Some(cover) = c.cover {
            self.cover = cover;
        }
        if let Some(visible) = c.visible {
            self.visible = visible;
        }
    }
}

/// What one criterion adds to one tile
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Contribution {
    pub utility: f32,
    pub safety: f32,
    pub distance: f32,
    pub cover: Option<CoverLevel>,
    pub visible: Option<bool>,
}

impl Contribution {
    pub fn utility(value: f32) -> Self {
        Self { utility: value, ..Default::default() }
    }

    pub fn safety(value: f32) -> Self {
        Self { safety: value, ..Default::default() }
    }

    pub fn distance(value: f32) -> Self {
        Self { distance: value, ..Default::default() }
    }

    pub fn is_finite(&self) -> bool {
        self.utility.is_finite() && self.safety.is_finite() && self.distance.is_finite()
    }
}

/// Insertion-ordered set of tile scores for one evaluation
#[derive(Clone, Debug, Default)]
pub struct TileMap {
    scores: Vec<TileScore>,
    index: FxHashMap<Hex, usize>,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile; returns false if it is already present
    pub fn insert(&mut self, score: TileScore) -> bool {
        if self.index.contains_key(&score.tile) {
            return false;
        }
        self.index.insert(score.tile, self.scores.len());
        self.scores.push(score);
        true
    }

    pub fn get(&self, tile: Hex) -> Option<&TileScore> {
        self.index.get(&tile).map(|&i| &self.scores[i])
    }

    pub fn get_mut(&mut self, tile: Hex) -> Option<&mut TileScore> {
        match self.index.get(&tile) {
            Some(&i) => Some(&mut self.scores[i]),
            None => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileScore> {
        self.scores.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TileScore> {
        self.scores.iter_mut()
    }

    /// Scores in iteration order, for chunked evaluation
    pub fn as_mut_slice(&mut self) -> &mut [TileScore] {
        &mut self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn clear(&mut self) {
        self.scores.clear();
        self.index.clear();
    }
}

impl<'a> IntoIterator for &'a TileMap {
    type Item = &'a TileScore;
    type IntoIter = std::slice::Iter<'a, TileScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
