//! Board session: move history, projected board and the view it drives.
//!
//! Forward steps apply one move to the current board. Backward steps and jumps
//! rebuild the board from the visible prefix, so the two directions cannot
//! disagree.

use tracing::{debug, info};

use super::board::{project_board, BoardRenderer, BoardSnapshot};
use super::history::{GameStatus, HistoryError, Move, MoveHistory};

/// One game's board state.
#[derive(Debug)]
pub struct BoardSession<R> {
    history: MoveHistory,
    board: BoardSnapshot,
    renderer: R,
    /// Animate moves arriving live
    animate: bool,
    /// Set by an explicit game-over event or a terminal move
    game_over: Option<GameStatus>,
}

impl<R: BoardRenderer> BoardSession<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            history: MoveHistory::new(),
            board: BoardSnapshot::initial(),
            renderer,
            animate: true,
            game_over: None,
        }
    }

    pub fn with_animation(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn board(&self) -> &BoardSnapshot {
        &self.board
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn cursor(&self) -> usize {
        self.history.cursor()
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.history.last_move()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_status(&self) -> GameStatus {
        self.game_over.unwrap_or_default()
    }

    /// Append a live move and render it as the last move.
    pub fn append(&mut self, mv: Move) -> Result<(), HistoryError> {
        self.history.append(mv)?;
        self.board.apply(&mv);

        debug!(mv = %mv, cursor = self.history.cursor(), "move appended");
        self.renderer.apply_move(&mv, self.animate);
        self.renderer.highlight_last_move(Some(&mv));

        if mv.status.is_terminal() {
            self.end_game(mv.status);
        }
        Ok(())
    }

    /// Load a full history (reconnect, spectator join).
    pub fn restore(&mut self, moves: Vec<Move>) {
        info!(moves = moves.len(), "restoring move history");
        self.history.restore(moves);

        let status = self.history.final_status();
        self.game_over = status.is_terminal().then_some(status);
        if let Some(status) = self.game_over {
            info!(status = status.as_str(), "restored a finished game");
        }
        self.redraw();
    }

    /// Returns false at the start.
    pub fn step_backward(&mut self) -> bool {
        if !self.history.step_backward() {
            return false;
        }
        self.redraw();
        true
    }

    /// Returns false at the end.
    pub fn step_forward(&mut self) -> bool {
        let mv = match self.history.step_forward() {
            Some(mv) => *mv,
            None => return false,
        };
        self.board.apply(&mv);
        self.renderer.apply_move(&mv, true);
        self.renderer.highlight_last_move(Some(&mv));
        self.rerender_game_over_at_end();
        true
    }

    pub fn jump_to_start(&mut self) -> bool {
        if !self.history.jump_to_start() {
            return false;
        }
        self.redraw();
        true
    }

    pub fn jump_to_end(&mut self) -> bool {
        if !self.history.jump_to_end() {
            return false;
        }
        self.redraw();
        true
    }

    /// Record a game-over reported outside of a move.
    pub fn end_game(&mut self, status: GameStatus) {
        if self.game_over == Some(status) {
            return;
        }
        info!(status = status.as_str(), "game over");
        self.game_over = Some(status);
        self.renderer.render_game_over(status);
    }

    /// Clear everything for a new game at the same table.
    pub fn reset(&mut self) {
        self.history.clear();
        self.board = BoardSnapshot::initial();
        self.game_over = None;
        self.renderer.reset_board();
    }

    /// Rebuild board and view from the visible prefix.
    fn redraw(&mut self) {
        let visible = self.history.visible();
        self.board = project_board(visible);

        self.renderer.reset_board();
        for mv in visible {
            self.renderer.apply_move(mv, false);
        }
        self.renderer.highlight_last_move(self.board.last_move());
        debug!(cursor = self.history.cursor(), len = self.history.len(), "board redrawn");
        self.rerender_game_over_at_end();
    }

    /// A reset view loses the game-over overlay; put it back on the final position.
    fn rerender_game_over_at_end(&mut self) {
        if !self.history.is_at_end() {
            return;
        }
        if let Some(status) = self.game_over {
            self.renderer.render_game_over(status);
        }
    }
}
