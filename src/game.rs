//! Turn tracking and algebraic move dispatch on top of [`Board`].
//!
//! `Game` is the thin driver that shells (desktop board, web board, CLI)
//! talk to: it resolves an algebraic (start, end, promotion) request against
//! the legal move list, applies it, and answers draw/mate queries. It owns
//! nothing the shells can't reconstruct from `Board` alone except the undo
//! stack needed for `undo()` and the applied-move log.

use crate::board::{Board, Color, Piece};
use crate::moves::execute::{generate_legal, make_move_basic, undo_move_basic};
use crate::moves::magic::MagicTables;
use crate::moves::magic::loader::load_magic_tables;
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, Undo};
use crate::square::Square;
use crate::status::{GameStatus, position_status};
use std::fmt;

/// Errors surfaced to callers of [`Game`]. Internal invariant violations
/// (missing king, bitboard/occupancy mismatch) are bugs and panic instead of
/// returning an error here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// `(start, end, promotion)` does not match any legal move in the
    /// current position.
    IllegalMove {
        start: String,
        end: String,
        promotion: Option<Piece>,
    },
    /// Algebraic square or FEN text failed syntactic validation.
    MalformedNotation(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::IllegalMove {
                start,
                end,
                promotion,
            } => write!(
                f,
                "illegal move {}{}{}",
                start,
                end,
                promotion
                    .map(|p| format!("={:?}", p))
                    .unwrap_or_default()
            ),
            GameError::MalformedNotation(s) => write!(f, "malformed notation: {}", s),
        }
    }
}

impl std::error::Error for GameError {}

/// Turn tracking, draw detection, and algebraic-move dispatch around a
/// [`Board`]. Owns its own copy of the (process-wide, immutable) attack
/// tables so it can generate moves without a caller threading them through.
pub struct Game {
    pub board: Board,
    tables: MagicTables,
    moves: Vec<Move>,
    undo_stack: Vec<Undo>,
}

impl Game {
    /// Standard starting position.
    pub fn new() -> Self {
        Game {
            board: Board::new(),
            tables: load_magic_tables(),
            moves: Vec::new(),
            undo_stack: Vec::new(),
        }
    }

    /// Position imported from FEN.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let board: Board = fen
            .parse()
            .map_err(|e| GameError::MalformedNotation(format!("{}", e)))?;
        Ok(Game {
            board,
            tables: load_magic_tables(),
            moves: Vec::new(),
            undo_stack: Vec::new(),
        })
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move
    }

    pub fn tables(&self) -> &MagicTables {
        &self.tables
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let mut scratch = Vec::with_capacity(256);
        generate_legal(&mut self.board, &self.tables, &mut moves, &mut scratch);
        moves
    }

    pub fn in_check(&self) -> bool {
        in_check(&self.board, self.board.side_to_move, &self.tables)
    }

    /// Parse, validate, and apply an algebraic move. `promotion` is required
    /// only when the move is itself a promotion; if omitted on a promoting
    /// move it defaults to Queen (Game-layer policy — the core never treats
    /// a missing promotion specifier as an error).
    pub fn make_move(
        &mut self,
        start_alg: &str,
        end_alg: &str,
        promotion: Option<Piece>,
    ) -> Result<Move, GameError> {
        let from = Square::from_algebraic(start_alg)
            .ok_or_else(|| GameError::MalformedNotation(start_alg.to_string()))?;
        let to = Square::from_algebraic(end_alg)
            .ok_or_else(|| GameError::MalformedNotation(end_alg.to_string()))?;

        let candidates = self.legal_moves();
        // A promoting move with no promotion specified defaults to Queen.
        let matched = candidates.iter().find(|m| {
            m.from == from
                && m.to == to
                && match promotion {
                    Some(p) => m.promotion == Some(p),
                    None => m.promotion.is_none() || m.promotion == Some(Piece::Queen),
                }
        });

        let mv = *matched.ok_or_else(|| GameError::IllegalMove {
            start: start_alg.to_string(),
            end: end_alg.to_string(),
            promotion,
        })?;

        let undo = make_move_basic(&mut self.board, mv);
        self.undo_stack.push(undo);
        self.moves.push(mv);
        Ok(mv)
    }

    /// Reverses the last applied move. Returns `None` (sentinel, not an
    /// error) when there is no history to undo.
    pub fn undo(&mut self) -> Option<Move> {
        let undo = self.undo_stack.pop()?;
        undo_move_basic(&mut self.board, undo);
        self.moves.pop()
    }

    pub fn applied_moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn is_checkmate(&mut self) -> bool {
        matches!(
            position_status(&mut self.board, &self.tables),
            GameStatus::Checkmate
        )
    }

    pub fn is_stalemate(&mut self) -> bool {
        matches!(
            position_status(&mut self.board, &self.tables),
            GameStatus::Stalemate
        )
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.board.halfmove_clock >= 100
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.board.is_threefold()
    }

    /// True when the side to move has no legal reply, or any draw condition
    /// holds (fifty-move, threefold, or the stricter FIDE-automatic draws).
    pub fn is_over(&mut self) -> bool {
        !matches!(
            position_status(&mut self.board, &self.tables),
            GameStatus::InPlay
        )
    }

    /// One of: "ongoing", "<color> in check", "<color> in checkmate",
    /// "stalemate", "draw by fifty-move rule", "draw by repetition", plus
    /// the stricter FIDE-automatic draws the core also detects.
    pub fn game_status(&mut self) -> String {
        let mover = self.board.side_to_move;
        match position_status(&mut self.board, &self.tables) {
            GameStatus::Checkmate => format!("{} in checkmate", color_name(mover)),
            GameStatus::Stalemate => "stalemate".to_string(),
            GameStatus::DrawFiftyMove => "draw by fifty-move rule".to_string(),
            GameStatus::DrawThreefold => "draw by repetition".to_string(),
            GameStatus::DrawFivefold => "draw by repetition".to_string(),
            GameStatus::DrawSeventyFiveMove => "draw by seventy-five-move rule".to_string(),
            GameStatus::DrawDeadPosition => "draw by insufficient material".to_string(),
            GameStatus::InPlay => {
                if in_check(&self.board, mover, &self.tables) {
                    format!("{} in check", color_name(mover))
                } else {
                    "ongoing".to_string()
                }
            }
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

fn color_name(c: Color) -> &'static str {
    match c {
        Color::White => "white",
        Color::Black => "black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fools_mate_reaches_checkmate() {
        let mut game = Game::new();
        game.make_move("f2", "f3", None).unwrap();
        game.make_move("e7", "e5", None).unwrap();
        game.make_move("g2", "g4", None).unwrap();
        game.make_move("d8", "h4", None).unwrap();

        assert_eq!(game.game_status(), "white in checkmate");
        assert!(game.is_over());
        assert!(game.is_checkmate());
    }

    #[test]
    fn illegal_move_is_rejected() {
        let mut game = Game::new();
        let err = game.make_move("e2", "e5", None).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { .. }));
    }

    #[test]
    fn malformed_square_is_rejected() {
        let mut game = Game::new();
        let err = game.make_move("z9", "e4", None).unwrap_err();
        assert!(matches!(err, GameError::MalformedNotation(_)));
    }

    #[test]
    fn undo_restores_position_and_history() {
        let mut game = Game::new();
        let before = game.board.zobrist;
        game.make_move("e2", "e4", None).unwrap();
        assert_ne!(game.board.zobrist, before);
        let undone = game.undo();
        assert!(undone.is_some());
        assert_eq!(game.board.zobrist, before);
        assert!(game.applied_moves().is_empty());
    }

    #[test]
    fn undo_with_empty_history_returns_none() {
        let mut game = Game::new();
        assert!(game.undo().is_none());
    }

    #[test]
    fn promotion_defaults_to_queen_when_unspecified() {
        // White pawn one step from promotion, nothing else contesting e8.
        let mut game = Game::from_fen("4k3/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mv = game.make_move("e7", "e8", None).unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
    }

    #[test]
    fn explicit_underpromotion_is_honored() {
        let mut game = Game::from_fen("4k3/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mv = game.make_move("e7", "e8", Some(Piece::Knight)).unwrap();
        assert_eq!(mv.promotion, Some(Piece::Knight));
    }

    #[test]
    fn threefold_repetition_is_detected() {
        let mut game = Game::new();
        for _ in 0..3 {
            game.make_move("g1", "f3", None).unwrap();
            game.make_move("g8", "f6", None).unwrap();
            game.make_move("f3", "g1", None).unwrap();
            game.make_move("f6", "g8", None).unwrap();
        }
        assert!(game.is_threefold_repetition());
        assert_eq!(game.game_status(), "draw by repetition");
    }
}
