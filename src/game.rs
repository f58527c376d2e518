//! Gamma game state and move execution.
//!
//! This module provides the core game logic for Gamma, including:
//! - Board state representation using a flat row-major array
//! - Ordinary stone placement under the per-player region limit
//! - The one-time golden capture move, with forest rebuild on removal
//! - Incremental per-player aggregates (regions, occupied cells,
//!   free-adjacent cells) backing the query surface
//!
//! Three aggregates must stay consistent under every move. Region counts are
//! maintained through a disjoint-set forest over cell indices; the
//! free-adjacent counters track, per player, how many empty cells border at
//! least one of that player's stones; occupied counters and the global busy
//! total tie the two together. A golden move may split the victim's region
//! into up to four pieces, so the forest is rebuilt from scratch before the
//! move is committed.

use std::fmt;

use crate::dsu::Forest;

/// Error returned by [`Game::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// A construction parameter was zero.
    InvalidParameters,
    /// Backing storage for the board could not be reserved.
    OutOfMemory,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GameError::InvalidParameters => {
                "width, height, players and areas must all be positive"
            }
            GameError::OutOfMemory => "board storage allocation failed",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for GameError {}

/// A Gamma game.
///
/// Cells hold player numbers (`0` = empty) in row-major order; the forest
/// partitions occupied cells into connected regions. All per-player arrays
/// are indexed by `player - 1`.
pub struct Game {
    width: u32,
    height: u32,
    players: u32,
    /// Most disjoint regions a single player may own.
    areas: u32,
    /// Cell values at `y * width + x`; 0 = empty.
    cells: Vec<u32>,
    forest: Forest,
    /// Connected-region count per player.
    regions: Vec<u32>,
    /// Occupied-cell count per player.
    occupied: Vec<u64>,
    /// Empty cells orthogonally adjacent to at least one stone of the player.
    free_adj: Vec<u64>,
    /// Whether the player has spent their golden move.
    golden_used: Vec<bool>,
    /// Occupied cells across all players.
    busy_total: u64,
}

/// Fallibly allocates a vector of `len` copies of `value`.
fn try_vec<T: Clone>(value: T, len: usize) -> Result<Vec<T>, GameError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| GameError::OutOfMemory)?;
    v.resize(len, value);
    Ok(v)
}

impl Game {
    /// Creates an empty game.
    ///
    /// All four parameters must be positive: board width and height, the
    /// number of players, and the maximum number of disjoint regions a
    /// single player may own.
    pub fn new(width: u32, height: u32, players: u32, areas: u32) -> Result<Game, GameError> {
        if width == 0 || height == 0 || players == 0 || areas == 0 {
            return Err(GameError::InvalidParameters);
        }
        let cell_count = usize::try_from(u64::from(width) * u64::from(height))
            .map_err(|_| GameError::OutOfMemory)?;
        let player_count = players as usize;
        Ok(Game {
            width,
            height,
            players,
            areas,
            cells: try_vec(0u32, cell_count)?,
            forest: Forest::new(cell_count).map_err(|_| GameError::OutOfMemory)?,
            regions: try_vec(0u32, player_count)?,
            occupied: try_vec(0u64, player_count)?,
            free_adj: try_vec(0u64, player_count)?,
            golden_used: try_vec(false, player_count)?,
            busy_total: 0,
        })
    }

    /// Board width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Board height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of players.
    pub fn players(&self) -> u32 {
        self.players
    }

    /// Value of the cell at (x, y). Callers must stay in bounds.
    pub(crate) fn cell(&self, x: u32, y: u32) -> u32 {
        self.cells[self.index(x, y)]
    }

    /// Attempts an ordinary move: `player` places a stone on the empty cell
    /// (x, y).
    ///
    /// The move is rejected (returning `false`, with no state change) when
    /// the player or coordinates are out of range, the cell is occupied, or
    /// the stone would start a new region for a player already at the region
    /// limit. Placing next to one or more own regions merges them.
    pub fn make_move(&mut self, player: u32, x: u32, y: u32) -> bool {
        if !self.player_in_range(player) || !self.in_bounds(x, y) || !self.is_free(x, y) {
            return false;
        }
        if self.is_isolated(player, x, y) && !self.below_region_limit(player) {
            return false;
        }
        // Distinct adjacent own regions, on the pre-move forest.
        let adjacent = self.distinct_regions_around(player, x, y);
        // Free-adjacent bookkeeping reads the pre-move board: first the
        // cells that newly border the player, then the claimed cell leaving
        // every bordering owner's free set (the mover included).
        self.extend_free_neighbours(player, x, y, true);
        self.claim_from_neighbours(x, y);
        let idx = self.index(x, y);
        self.cells[idx] = player;
        self.busy_total += 1;
        let pi = Self::pidx(player);
        self.occupied[pi] += 1;
        self.regions[pi] = self.regions[pi] + 1 - adjacent;
        self.local_union(x, y);
        true
    }

    /// Attempts the golden move: `player` removes the foreign stone at
    /// (x, y) and places their own there.
    ///
    /// Legal at most once per player, and only while both sides stay within
    /// the region limit: the executor nets `1 - exec_adj` regions, the
    /// victim's region splits into `vic_adj` pieces. Rejection leaves the
    /// game observably unchanged.
    pub fn golden_move(&mut self, player: u32, x: u32, y: u32) -> bool {
        if !self.player_in_range(player) || !self.in_bounds(x, y) || !self.golden_possible(player)
        {
            return false;
        }
        let idx = self.index(x, y);
        let victim = self.cells[idx];
        if victim == 0 || victim == player {
            return false;
        }
        if self.is_isolated(player, x, y) && !self.below_region_limit(player) {
            return false;
        }

        // Tentative removal; the forest must reflect the split topology
        // before either side can be judged.
        self.cells[idx] = 0;
        self.rebuild_forest();
        let exec_adj = self.distinct_regions_around(player, x, y);
        let vic_adj = self.distinct_regions_around(victim, x, y);
        let pi = Self::pidx(player);
        let vi = Self::pidx(victim);
        let exec_ok = self.regions[pi] + 1 - exec_adj <= self.areas;
        let vic_ok = self.regions[vi] + vic_adj - 1 <= self.areas;
        if !exec_ok || !vic_ok {
            self.cells[idx] = victim;
            self.local_union(x, y);
            return false;
        }

        self.regions[pi] = self.regions[pi] + 1 - exec_adj;
        self.occupied[pi] += 1;
        self.extend_free_neighbours(player, x, y, true);
        self.golden_used[pi] = true;
        self.regions[vi] = self.regions[vi] + vic_adj - 1;
        self.occupied[vi] -= 1;
        self.extend_free_neighbours(victim, x, y, false);
        self.cells[idx] = player;
        self.local_union(x, y);
        true
    }

    /// Number of cells occupied by `player`; 0 when out of range.
    pub fn busy_fields(&self, player: u32) -> u64 {
        if self.player_in_range(player) {
            self.occupied[Self::pidx(player)]
        } else {
            0
        }
    }

    /// Number of cells `player` may still take with an ordinary move.
    ///
    /// While the player can open a new region every empty cell qualifies;
    /// at the region limit only empty cells bordering an own stone do.
    pub fn free_fields(&self, player: u32) -> u64 {
        if !self.player_in_range(player) {
            return 0;
        }
        if self.below_region_limit(player) {
            u64::from(self.width) * u64::from(self.height) - self.busy_total
        } else {
            self.free_adj[Self::pidx(player)]
        }
    }

    /// Whether `player` can still execute some golden move.
    ///
    /// True when the player's golden move is unspent, a foreign stone
    /// exists, and at least one foreign stone passes the full two-sided
    /// region-limit check. Probing tentatively removes candidate stones;
    /// the board and the region partition are restored before returning.
    pub fn golden_possible(&mut self, player: u32) -> bool {
        if !self.player_in_range(player) {
            return false;
        }
        let pi = Self::pidx(player);
        if self.golden_used[pi] {
            return false;
        }
        if self.busy_total <= self.occupied[pi] {
            return false;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let victim = self.cells[self.index(x, y)];
                if victim == 0 || victim == player {
                    continue;
                }
                // A capture isolated from the player opens a new region,
                // which cannot pass at the limit.
                if self.is_isolated(player, x, y) && !self.below_region_limit(player) {
                    continue;
                }
                if self.probe_golden(player, victim, x, y) {
                    return true;
                }
            }
        }
        false
    }

    /// Two-sided legality of capturing the `victim` stone at (x, y).
    ///
    /// Removes the stone, rebuilds the forest, evaluates both region
    /// limits, then puts the stone back and re-stitches its component.
    fn probe_golden(&mut self, player: u32, victim: u32, x: u32, y: u32) -> bool {
        let idx = self.index(x, y);
        self.cells[idx] = 0;
        self.rebuild_forest();
        let exec_adj = self.distinct_regions_around(player, x, y);
        let vic_adj = self.distinct_regions_around(victim, x, y);
        self.cells[idx] = victim;
        self.local_union(x, y);
        self.regions[Self::pidx(player)] + 1 - exec_adj <= self.areas
            && self.regions[Self::pidx(victim)] + vic_adj - 1 <= self.areas
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (u64::from(y) * u64::from(self.width) + u64::from(x)) as usize
    }

    #[inline]
    fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn player_in_range(&self, player: u32) -> bool {
        player >= 1 && player <= self.players
    }

    /// Per-player array slot for a validated player number.
    #[inline]
    fn pidx(player: u32) -> usize {
        (player - 1) as usize
    }

    #[inline]
    fn is_free(&self, x: u32, y: u32) -> bool {
        self.cells[self.index(x, y)] == 0
    }

    #[inline]
    fn below_region_limit(&self, player: u32) -> bool {
        self.regions[Self::pidx(player)] < self.areas
    }

    /// In-bounds orthogonal neighbours of (x, y); off-board sides are `None`.
    fn neighbours(&self, x: u32, y: u32) -> [Option<(u32, u32)>; 4] {
        [
            (x > 0).then(|| (x - 1, y)),
            (x + 1 < self.width).then(|| (x + 1, y)),
            (y > 0).then(|| (x, y - 1)),
            (y + 1 < self.height).then(|| (x, y + 1)),
        ]
    }

    /// True when no orthogonal neighbour of (x, y) belongs to `player`.
    fn is_isolated(&self, player: u32, x: u32, y: u32) -> bool {
        self.neighbours(x, y)
            .into_iter()
            .flatten()
            .all(|(nx, ny)| self.cell(nx, ny) != player)
    }

    /// Number of distinct regions of `player` among the orthogonal
    /// neighbours of (x, y), deduplicated by forest root in a four-entry
    /// scratch.
    fn distinct_regions_around(&mut self, player: u32, x: u32, y: u32) -> u32 {
        let mut roots = [0usize; 4];
        let mut count = 0;
        for (nx, ny) in self.neighbours(x, y).into_iter().flatten() {
            let nidx = self.index(nx, ny);
            if self.cells[nidx] != player {
                continue;
            }
            let root = self.forest.find(nidx);
            if !roots[..count].contains(&root) {
                roots[count] = root;
                count += 1;
            }
        }
        count as u32
    }

    /// Adjusts `player`'s free-adjacent counter for every empty neighbour of
    /// (x, y) that currently borders none of the player's stones: those are
    /// exactly the cells whose adjacency flips when (x, y) changes hands.
    fn extend_free_neighbours(&mut self, player: u32, x: u32, y: u32, increase: bool) {
        let pi = Self::pidx(player);
        for (nx, ny) in self.neighbours(x, y).into_iter().flatten() {
            if self.is_free(nx, ny) && self.is_isolated(player, nx, ny) {
                if increase {
                    self.free_adj[pi] += 1;
                } else {
                    self.free_adj[pi] -= 1;
                }
            }
        }
    }

    /// The empty cell (x, y) is about to be occupied: every distinct owner
    /// of a bordering stone loses it as a free-adjacent cell.
    fn claim_from_neighbours(&mut self, x: u32, y: u32) {
        let mut owners = [0u32; 4];
        let mut count = 0;
        for (nx, ny) in self.neighbours(x, y).into_iter().flatten() {
            let value = self.cells[self.index(nx, ny)];
            if value != 0 && !owners[..count].contains(&value) {
                owners[count] = value;
                count += 1;
            }
        }
        for &owner in &owners[..count] {
            self.free_adj[Self::pidx(owner)] -= 1;
        }
    }

    /// Unions (x, y) with each orthogonal neighbour holding the same
    /// non-zero value.
    fn local_union(&mut self, x: u32, y: u32) {
        let idx = self.index(x, y);
        let value = self.cells[idx];
        if value == 0 {
            return;
        }
        for (nx, ny) in self.neighbours(x, y).into_iter().flatten() {
            let nidx = self.index(nx, ny);
            if self.cells[nidx] == value {
                self.forest.union(idx, nidx);
            }
        }
    }

    /// Rebuilds the forest from the current cells in a fixed traversal
    /// order. Required after a removal: union-find cannot split.
    fn rebuild_forest(&mut self) {
        self.forest.reset();
        for x in 0..self.width {
            for y in 0..self.height {
                self.local_union(x, y);
            }
        }
    }
}
