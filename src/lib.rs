//! Xiangqi Session Library
//!
//! This crate provides the client-side lobby and table state of a networked
//! xiangqi client.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Directory Sync** - A local cache of tables and players, published to UI
//!   observers once the first full table listing has arrived.
//!
//! - **Move History** - The moves of the active game with a replay cursor
//!   (step backward/forward, jump to start/end).
//!
//! - **Board Projection** - Rebuilds the board from any prefix of the history,
//!   deterministically.
//!
//! - **Seat Roles** - Keeps the local player's seat at the bottom of the board.
//!
//! # Design Principles
//!
//! 1. **One event at a time** - Network events are applied sequentially, each
//!    to completion.
//!
//! 2. **Views are collaborators** - Rendering goes through the `BoardRenderer`
//!    and `DirectoryObserver` traits; a torn-down view is skipped, not called.
//!
//! 3. **No networking** - This crate is pure state, no sockets or wire format.
//!
//! 4. **No rules** - Moves arrive already validated; legality is not checked.
//!
//! # Example
//!
//! ```rust
//! use xiangqi_session::state::{
//!     BoardRenderer, ClientState, Color, GameStatus, Move, NetworkEvent,
//! };
//!
//! #[derive(Default)]
//! struct View {
//!     black_on_top: bool,
//! }
//!
//! impl BoardRenderer for View {
//!     fn reset_board(&mut self) {}
//!     fn apply_move(&mut self, _mv: &Move, _animated: bool) {}
//!     fn highlight_last_move(&mut self, _mv: Option<&Move>) {}
//!     fn render_game_over(&mut self, _status: GameStatus) {}
//!     fn set_orientation(&mut self, black_on_top: bool) {
//!         self.black_on_top = black_on_top;
//!     }
//! }
//!
//! let mut client = ClientState::new(View { black_on_top: true });
//!
//! // Seated as Black: the board flips so Black is at the bottom
//! client
//!     .apply_event(NetworkEvent::SeatAssigned(Some(Color::Black)))
//!     .unwrap();
//! assert!(!client.session.renderer().black_on_top);
//!
//! let moves = vec![
//!     Move::parse("h2", "e2", GameStatus::Ongoing).unwrap(),
//!     Move::parse("h9", "g7", GameStatus::Ongoing).unwrap(),
//! ];
//! client.apply_event(NetworkEvent::HistoryRestored(moves)).unwrap();
//!
//! client.session.step_backward();
//! assert_eq!(client.session.cursor(), 1);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
