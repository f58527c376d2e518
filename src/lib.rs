//! Gamma-Rust: a territorial board game engine.
//!
//! This crate provides the core engine of the board game Gamma, together
//! with its line-oriented protocol drivers.
//!
//! Players place numbered stones on a rectangular board. Every player may
//! own at most a fixed number of disjoint connected regions, and once per
//! game may play a "golden move" that captures an opposing stone. The
//! engine keeps region counts (through a disjoint-set forest), occupied
//! totals and free-adjacent budgets consistent under every move.
//!
//! ## Modules
//!
//! - [`game`] - Core game logic (board state, moves, queries)
//! - [`dsu`] - Disjoint-set forest backing the region counts
//! - [`protocol`] - Line-oriented framing and batch driver
//! - [`interactive`] - Raw-mode interactive terminal play
//!
//! ## Example
//!
//! ```
//! use gamma_rust::game::Game;
//!
//! let mut game = Game::new(4, 4, 2, 3).unwrap();
//! assert!(game.make_move(1, 0, 0));
//! assert!(game.make_move(2, 1, 0));
//! assert_eq!(game.busy_fields(1), 1);
//! println!("{}", game.board().unwrap());
//! ```

pub mod dsu;
pub mod game;
pub mod interactive;
pub mod protocol;
mod render;
