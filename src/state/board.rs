//! Board projection.
//!
//! A [`BoardSnapshot`] is never edited by hand: it is always the result of
//! [`project_board`] over a move prefix, so the same prefix always yields the
//! same board.

use serde::{Deserialize, Serialize};

use super::history::{GameStatus, Move, Square, BOARD_FILES, BOARD_RANKS};

/// Side / seat color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Black => "black",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

/// Piece kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Advisor,
    Elephant,
    Horse,
    Chariot,
    Cannon,
    Pawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }
}

type Cells = [[Option<Piece>; BOARD_FILES as usize]; BOARD_RANKS as usize];

const BACK_RANK: [PieceKind; BOARD_FILES as usize] = [
    PieceKind::Chariot,
    PieceKind::Horse,
    PieceKind::Elephant,
    PieceKind::Advisor,
    PieceKind::King,
    PieceKind::Advisor,
    PieceKind::Elephant,
    PieceKind::Horse,
    PieceKind::Chariot,
];

/// Board state derived from a move prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    cells: Cells,
    last_move: Option<Move>,
    move_count: usize,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

impl BoardSnapshot {
    /// Standard opening layout, Red on ranks 0-3.
    pub fn initial() -> Self {
        let mut cells: Cells = [[None; BOARD_FILES as usize]; BOARD_RANKS as usize];

        for (color, back, cannon, pawn) in [(Color::Red, 0, 2, 3), (Color::Black, 9, 7, 6)] {
            for (file, kind) in BACK_RANK.iter().enumerate() {
                cells[back][file] = Some(Piece::new(color, *kind));
            }
            cells[cannon][1] = Some(Piece::new(color, PieceKind::Cannon));
            cells[cannon][7] = Some(Piece::new(color, PieceKind::Cannon));
            for file in (0..BOARD_FILES as usize).step_by(2) {
                cells[pawn][file] = Some(Piece::new(color, PieceKind::Pawn));
            }
        }

        Self {
            cells,
            last_move: None,
            move_count: 0,
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.cells[square.rank() as usize][square.file() as usize]
    }

    /// Move to highlight, if any.
    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    /// Number of moves applied to reach this board.
    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Status after the last applied move.
    pub fn status(&self) -> GameStatus {
        self.last_move.map(|m| m.status).unwrap_or_default()
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(rank, row)| {
            row.iter().enumerate().filter_map(move |(file, cell)| {
                let piece = (*cell)?;
                Square::new(file as u8, rank as u8).map(|sq| (sq, piece))
            })
        })
    }

    /// Moving from an empty square leaves the board as is; legality is not
    /// checked here.
    pub(crate) fn apply(&mut self, mv: &Move) {
        if let Some(piece) = self.cells[mv.from.rank() as usize][mv.from.file() as usize].take() {
            self.cells[mv.to.rank() as usize][mv.to.file() as usize] = Some(piece);
        }
        self.last_move = Some(*mv);
        self.move_count += 1;
    }

    pub fn to_json(&self) -> serde_json::Value {
        let pieces: Vec<serde_json::Value> = self
            .pieces()
            .map(|(sq, p)| {
                serde_json::json!({
                    "square": sq.to_string(),
                    "color": p.color.as_str(),
                    "kind": format!("{:?}", p.kind).to_lowercase()
                })
            })
            .collect();

        serde_json::json!({
            "pieces": pieces,
            "last_move": self.last_move.map(|m| m.to_string()),
            "move_count": self.move_count,
            "status": self.status().as_str()
        })
    }
}

/// Rebuild the board from the opening position over `moves`.
pub fn project_board(moves: &[Move]) -> BoardSnapshot {
    let mut board = BoardSnapshot::initial();
    for mv in moves {
        board.apply(mv);
    }
    board
}

/// Board view the session renders into.
pub trait BoardRenderer {
    /// Back to the opening position, no highlight.
    fn reset_board(&mut self);

    fn apply_move(&mut self, mv: &Move, animated: bool);

    /// Highlight the last move, or clear the highlight with `None`.
    fn highlight_last_move(&mut self, mv: Option<&Move>);

    fn render_game_over(&mut self, status: GameStatus);

    fn set_orientation(&mut self, black_on_top: bool);
}

/// Renderer that records calls. Used by tests across the crate.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenderCall {
    Reset,
    Apply(String, bool),
    Highlight(Option<String>),
    GameOver(GameStatus),
    Orientation(bool),
}

#[cfg(test)]
impl RecordingRenderer {
    pub fn take(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }
}

#[cfg(test)]
impl BoardRenderer for RecordingRenderer {
    fn reset_board(&mut self) {
        self.calls.push(RenderCall::Reset);
    }

    fn apply_move(&mut self, mv: &Move, animated: bool) {
        self.calls.push(RenderCall::Apply(mv.to_string(), animated));
    }

    fn highlight_last_move(&mut self, mv: Option<&Move>) {
        self.calls.push(RenderCall::Highlight(mv.map(|m| m.to_string())));
    }

    fn render_game_over(&mut self, status: GameStatus) {
        self.calls.push(RenderCall::GameOver(status));
    }

    fn set_orientation(&mut self, black_on_top: bool) {
        self.calls.push(RenderCall::Orientation(black_on_top));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_initial_layout() {
        let board = BoardSnapshot::initial();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(
            board.piece_at(sq("e0")),
            Some(Piece::new(Color::Red, PieceKind::King))
        );
        assert_eq!(
            board.piece_at(sq("h7")),
            Some(Piece::new(Color::Black, PieceKind::Cannon))
        );
        assert_eq!(
            board.piece_at(sq("i6")),
            Some(Piece::new(Color::Black, PieceKind::Pawn))
        );
        assert_eq!(board.piece_at(sq("e4")), None);
        assert!(board.last_move().is_none());
    }

    #[test]
    fn test_move_and_capture() {
        let moves = vec![
            Move::parse("b2", "e2", GameStatus::Ongoing).unwrap(),
            Move::parse("e2", "e6", GameStatus::Ongoing).unwrap(),
        ];
        let board = project_board(&moves);

        assert_eq!(board.piece_at(sq("b2")), None);
        assert_eq!(
            board.piece_at(sq("e6")),
            Some(Piece::new(Color::Red, PieceKind::Cannon))
        );
        assert_eq!(board.pieces().count(), 31);
        assert_eq!(board.last_move(), moves.last());
        assert_eq!(board.move_count(), 2);
    }

    #[test]
    fn test_empty_origin_is_tolerated() {
        let board = project_board(&[Move::parse("a1", "a2", GameStatus::Ongoing).unwrap()]);
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.move_count(), 1);
        assert_eq!(board.last_move().map(|m| m.to_string()), Some("a1-a2".to_string()));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let moves = vec![
            Move::parse("h2", "e2", GameStatus::Ongoing).unwrap(),
            Move::parse("h9", "g7", GameStatus::Ongoing).unwrap(),
            Move::parse("e2", "e6", GameStatus::BlackWin).unwrap(),
        ];
        assert_eq!(project_board(&moves), project_board(&moves));
        assert_eq!(project_board(&moves).status(), GameStatus::BlackWin);
        assert_eq!(project_board(&[]), BoardSnapshot::initial());
    }

    #[test]
    fn test_to_json() {
        let board = project_board(&[Move::parse("h2", "e2", GameStatus::Ongoing).unwrap()]);
        let json = board.to_json();
        assert_eq!(json["last_move"], "h2-e2");
        assert_eq!(json["move_count"], 1);
        assert_eq!(json["status"], "ongoing");
        assert_eq!(json["pieces"].as_array().unwrap().len(), 32);
    }
}
