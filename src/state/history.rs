//! Move history with a replay cursor.
//!
//! # State Diagram
//!
//! ```text
//!            step_backward / jump_to_start
//!        ┌───────────────────────────────────┐
//!        ▼                                   │
//! ┌─────────────┐   step_forward    ┌─────────────────┐   append   ┌──────────┐
//! │ cursor == 0 │──────────────────▶│ 0 < cursor < len│───────X───▶│  error   │
//! └─────────────┘                   └────────┬────────┘            └──────────┘
//!        │                                   │ step_forward / jump_to_end
//!        │ jump_to_end                       ▼
//!        │                          ┌─────────────────┐
//!        └─────────────────────────▶│  cursor == len  │◀──┐
//!                                   └────────┬────────┘   │ append
//!                                            └────────────┘
//! ```
//!
//! The history only tracks positions; [`super::board::project_board`] turns a
//! prefix into a board.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Board width in files (a..i).
pub const BOARD_FILES: u8 = 9;

/// Board height in ranks (0..9).
pub const BOARD_RANKS: u8 = 10;

/// A board coordinate in ICCS notation: file `a`..`i`, rank `0`..`9`.
///
/// Rank 0 is Red's back rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Returns `None` when off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < BOARD_FILES && rank < BOARD_RANKS).then_some(Self { file, rank })
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank)
    }
}

/// Error parsing a square like `"e3"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid square: {0:?}")]
pub struct ParseSquareError(pub String);

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseSquareError(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'0');
        Square::new(file, rank).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// Game status carried by each move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Ongoing,
    RedWin,
    BlackWin,
    Draw,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::RedWin => "red_win",
            Self::BlackWin => "black_win",
            Self::Draw => "draw",
        }
    }

    /// Check if the game is over.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// A validated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// Status after this move
    #[serde(default)]
    pub status: GameStatus,
}

impl Move {
    pub fn new(from: Square, to: Square, status: GameStatus) -> Self {
        Self { from, to, status }
    }

    /// Parse `"a1"`, `"a2"` style squares.
    pub fn parse(from: &str, to: &str, status: GameStatus) -> Result<Self, ParseSquareError> {
        Ok(Self::new(from.parse()?, to.parse()?, status))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// History errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Append attempted while replaying an earlier position
    #[error("cannot append while replaying: cursor {cursor} of {len}")]
    SequenceViolation { cursor: usize, len: usize },
}

/// Ordered moves of one game plus the replay cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    moves: Vec<Move>,
    /// Number of moves reflected on the board
    cursor: usize,
}

impl MoveHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history positioned at its end.
    pub fn from_moves(moves: Vec<Move>) -> Self {
        let cursor = moves.len();
        Self { moves, cursor }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Check if the board is showing the latest position.
    pub fn is_at_end(&self) -> bool {
        self.cursor == self.moves.len()
    }

    /// Check if the user is looking at an earlier position.
    pub fn is_replaying(&self) -> bool {
        !self.is_at_end()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Moves currently reflected on the board.
    pub fn visible(&self) -> &[Move] {
        &self.moves[..self.cursor]
    }

    /// Move to highlight: the one just before the cursor.
    pub fn last_move(&self) -> Option<&Move> {
        self.cursor.checked_sub(1).and_then(|i| self.moves.get(i))
    }

    /// Status after the final recorded move.
    pub fn final_status(&self) -> GameStatus {
        self.moves.last().map(|m| m.status).unwrap_or_default()
    }

    /// Append a move at the end.
    pub fn append(&mut self, mv: Move) -> Result<(), HistoryError> {
        if !self.is_at_end() {
            return Err(HistoryError::SequenceViolation {
                cursor: self.cursor,
                len: self.moves.len(),
            });
        }
        self.moves.push(mv);
        self.cursor += 1;
        Ok(())
    }

    /// Returns false at the start.
    pub fn step_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Returns the move that became visible, or `None` at the end.
    pub fn step_forward(&mut self) -> Option<&Move> {
        if self.is_at_end() {
            return None;
        }
        self.cursor += 1;
        self.moves.get(self.cursor - 1)
    }

    /// Returns false if already at the start.
    pub fn jump_to_start(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    /// Returns false if already at the end.
    pub fn jump_to_end(&mut self) -> bool {
        let moved = !self.is_at_end();
        self.cursor = self.moves.len();
        moved
    }

    /// Replace the whole history, positioned at the end.
    pub fn restore(&mut self, moves: Vec<Move>) {
        *self = Self::from_moves(moves);
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.cursor = 0;
    }
}
