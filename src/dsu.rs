//! Disjoint-set forest over board cells.
//!
//! The forest tracks which occupied cells belong to the same connected
//! region. It is value-blind: callers must only union cells that actually
//! hold the same player. After a stone removal the whole forest is reset and
//! rebuilt by the move engine, so `reset` is as much a part of the lifecycle
//! as `find`/`union`.

use std::collections::TryReserveError;

/// Union-find structure with path compression and union by rank.
pub struct Forest {
    /// Parent link per cell; a root points at itself.
    parent: Vec<usize>,
    /// Rank (attachment-depth bound) per cell, meaningful for roots only.
    rank: Vec<u32>,
}

impl Forest {
    /// Creates a forest of `len` singleton sets.
    ///
    /// Fails when the backing storage cannot be reserved, which the game
    /// constructor reports as an out-of-memory condition.
    pub fn new(len: usize) -> Result<Forest, TryReserveError> {
        let mut parent = Vec::new();
        parent.try_reserve_exact(len)?;
        parent.extend(0..len);
        let mut rank = Vec::new();
        rank.try_reserve_exact(len)?;
        rank.resize(len, 0);
        Ok(Forest { parent, rank })
    }

    /// Returns every cell to its own singleton set.
    pub fn reset(&mut self) {
        for (i, parent) in self.parent.iter_mut().enumerate() {
            *parent = i;
        }
        self.rank.fill(0);
    }

    /// Root of `cell`'s set, with full path compression.
    ///
    /// Iterative two-pass: walk to the root, then repoint every node on the
    /// walked path directly at it. The recursive formulation is not
    /// stack-safe for boards with millions of cells.
    pub fn find(&mut self, cell: usize) -> usize {
        let mut root = cell;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = cell;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merges the sets containing `a` and `b`.
    ///
    /// The lower-rank root is attached under the higher-rank one; on equal
    /// rank `b`'s root goes under `a`'s and `a`'s rank grows.
    pub fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        if self.rank[root_a] < self.rank[root_b] {
            self.parent[root_a] = root_b;
        } else if self.rank[root_a] > self.rank[root_b] {
            self.parent[root_b] = root_a;
        } else {
            self.parent[root_b] = root_a;
            self.rank[root_a] += 1;
        }
    }
}
