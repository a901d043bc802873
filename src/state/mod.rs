//! Client state for the lobby and the active table.
//!
//! This module provides the state types and the components that own them:
//!
//! - `directory` - Table and player directory (local cache)
//! - `sync` - Publishes directory changes to UI observers
//! - `history` - Move history with a replay cursor
//! - `board` - Board projection and the renderer contract
//! - `session` - One game's history, board and view
//! - `role` - Local seat and board orientation
//! - `config` - Session settings
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                           ClientState                                 │
//! │                                                                       │
//! │  NetworkEvent ──┬──▶ DirectorySynchronizer ──▶ DirectoryObserver(s)   │
//! │                 │      └─ DirectoryStore       (weak, token-guarded)  │
//! │                 │                                                     │
//! │                 ├──▶ BoardSession ──────────▶ BoardRenderer           │
//! │                 │      ├─ MoveHistory (cursor)      ▲                 │
//! │                 │      └─ BoardSnapshot             │ set_orientation │
//! │                 │                                   │                 │
//! │                 └──▶ SessionRoleCoordinator ────────┘                 │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events are processed one at a time, to completion.

pub mod board;
pub mod config;
pub mod directory;
pub mod history;
pub mod role;
pub mod session;
pub mod sync;

use tracing::debug;

// Re-export commonly used types
pub use board::{project_board, BoardRenderer, BoardSnapshot, Color, Piece, PieceKind};
pub use config::SessionConfig;
pub use directory::{
    DirectoryKind, DirectorySnapshot, DirectoryStore, DirectoryUpdate, Player, PlayerRecord,
    SeatOccupant, Table, TableRecord, TableStatus, UpdateSummary,
};
pub use history::{GameStatus, HistoryError, Move, MoveHistory, ParseSquareError, Square};
pub use role::{needs_reverse, PersistedOrientation, SeatPosition, SessionRoleCoordinator};
pub use session::BoardSession;
pub use sync::{DirectoryObserver, DirectorySynchronizer, LivenessToken};

/// Events delivered by the network layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    PlayersUpdated(DirectoryUpdate<PlayerRecord>),
    TablesUpdated(DirectoryUpdate<TableRecord>),
    /// A validated move at the active table
    MoveReceived(Move),
    /// Full history on joining or rejoining a table
    HistoryRestored(Vec<Move>),
    /// Local seat at the active table, `None` when observing
    SeatAssigned(Option<Color>),
    GameOver(GameStatus),
    /// New game at the same table
    GameReset,
}

/// Combined client state.
///
/// Optional convenience struct routing network events to the components.
/// The components can also be driven directly.
#[derive(Debug)]
pub struct ClientState<R> {
    pub directory: DirectorySynchronizer,
    pub session: BoardSession<R>,
    pub role: SessionRoleCoordinator,
}

impl<R: BoardRenderer> ClientState<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, &SessionConfig::default())
    }

    pub fn with_config(renderer: R, config: &SessionConfig) -> Self {
        Self {
            directory: DirectorySynchronizer::new(),
            session: BoardSession::new(renderer).with_animation(config.animate_moves),
            role: SessionRoleCoordinator::new(config.black_on_top),
        }
    }

    /// Apply one network event.
    pub fn apply_event(&mut self, event: NetworkEvent) -> Result<(), HistoryError> {
        match event {
            NetworkEvent::PlayersUpdated(update) => {
                self.directory.apply_players(update);
            }
            NetworkEvent::TablesUpdated(update) => {
                self.directory.apply_tables(update);
            }
            NetworkEvent::MoveReceived(mv) => {
                // A live move always lands on the latest position.
                if self.session.history().is_replaying() {
                    debug!(cursor = self.session.cursor(), "leaving replay for live move");
                    self.session.jump_to_end();
                }
                self.session.append(mv)?;
            }
            NetworkEvent::HistoryRestored(moves) => {
                self.session.restore(moves);
            }
            NetworkEvent::SeatAssigned(Some(color)) => {
                self.role
                    .on_local_player_joined(color, self.session.renderer_mut());
            }
            NetworkEvent::SeatAssigned(None) => {
                self.role.on_local_player_left();
            }
            NetworkEvent::GameOver(status) => {
                self.session.end_game(status);
            }
            NetworkEvent::GameReset => {
                self.session.reset();
            }
        }
        Ok(())
    }

    /// The "flip board" control.
    pub fn flip_board(&mut self) {
        self.role
            .on_manual_reverse_request(self.session.renderer_mut());
    }

    /// Re-apply a persisted orientation after the board view was rebuilt.
    pub fn restore_orientation(&mut self, persisted: PersistedOrientation) {
        self.role.restore(persisted, self.session.renderer_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::board::{RecordingRenderer, RenderCall};
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct TablesView {
        refreshes: Cell<usize>,
    }

    impl DirectoryObserver for TablesView {
        fn on_players_changed(&self, _directory: &DirectoryStore) {}

        fn on_tables_changed(&self, _directory: &DirectoryStore) {
            self.refreshes.set(self.refreshes.get() + 1);
        }
    }

    fn mv(from: &str, to: &str) -> Move {
        Move::parse(from, to, GameStatus::Ongoing).unwrap()
    }

    #[test]
    fn test_directory_events() {
        let mut state = ClientState::new(RecordingRenderer::default());
        let view = Rc::new(TablesView::default());
        let _token = state.directory.subscribe("tables", &view);

        state
            .apply_event(NetworkEvent::TablesUpdated(DirectoryUpdate::partial(vec![
                TableRecord::new("1"),
            ])))
            .unwrap();
        assert_eq!(view.refreshes.get(), 0);

        state
            .apply_event(NetworkEvent::TablesUpdated(DirectoryUpdate::full(vec![
                TableRecord::new("1"),
            ])))
            .unwrap();
        assert_eq!(view.refreshes.get(), 1);
        assert!(state.directory.is_loaded());
    }

    #[test]
    fn test_live_move_leaves_replay() {
        let mut state = ClientState::new(RecordingRenderer::default());
        state
            .apply_event(NetworkEvent::HistoryRestored(vec![mv("h2", "e2"), mv("h9", "g7")]))
            .unwrap();
        state.session.jump_to_start();

        state.apply_event(NetworkEvent::MoveReceived(mv("h0", "g2"))).unwrap();

        assert_eq!(state.session.cursor(), 3);
        assert_eq!(
            state.session.board(),
            &project_board(&[mv("h2", "e2"), mv("h9", "g7"), mv("h0", "g2")])
        );
    }

    #[test]
    fn test_seat_assignment_orients_board() {
        let mut state = ClientState::new(RecordingRenderer::default());

        state
            .apply_event(NetworkEvent::SeatAssigned(Some(Color::Black)))
            .unwrap();
        assert!(!state.role.is_black_on_top());
        assert_eq!(
            state.session.renderer_mut().take(),
            vec![RenderCall::Orientation(false)]
        );

        state.apply_event(NetworkEvent::SeatAssigned(None)).unwrap();
        assert_eq!(state.role.local_color(), None);
        assert!(!state.role.is_black_on_top());

        state.flip_board();
        assert!(state.role.is_black_on_top());
    }

    #[test]
    fn test_restore_orientation_after_rebuild() {
        let config = SessionConfig::from_json(r#"{"black_on_top": true}"#).unwrap();
        let mut state = ClientState::with_config(RecordingRenderer::default(), &config);
        state.restore_orientation(PersistedOrientation {
            black_on_top: false,
        });

        assert!(!state.role.is_black_on_top());
        assert_eq!(
            state.session.renderer_mut().take(),
            vec![RenderCall::Orientation(false)]
        );
    }

    #[test]
    fn test_game_over_and_reset() {
        let mut state = ClientState::new(RecordingRenderer::default());
        state.apply_event(NetworkEvent::MoveReceived(mv("h2", "e2"))).unwrap();
        state
            .apply_event(NetworkEvent::GameOver(GameStatus::BlackWin))
            .unwrap();
        assert_eq!(state.session.game_status(), GameStatus::BlackWin);

        state.apply_event(NetworkEvent::GameReset).unwrap();
        assert!(!state.session.is_game_over());
        assert!(state.session.history().is_empty());
    }
}
