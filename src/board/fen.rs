// src/board/fen.rs
// FEN import/export for `Board`. Minimal subset: piece placement, active
// color, castling rights, en-passant square, halfmove clock, fullmove number.

use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, Color, Piece};
use crate::board::castle_bits::*;
use crate::square::Square;

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Reset this board in place from a FEN string.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("FEN: missing piece placement field")?;
        let active_color = fields.next().unwrap_or("w");
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut next = Board::new_empty();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "FEN: expected 8 ranks in piece placement, got {}",
                ranks.len()
            ));
        }

        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top; // FEN ranks run 8 -> 1
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                    continue;
                }
                if file >= 8 {
                    return Err(format!("FEN: rank '{}' overflows 8 files", rank_str));
                }
                let (piece, color) = CHAR_TO_PC[ch as usize]
                    .ok_or_else(|| format!("FEN: invalid piece glyph '{}'", ch))?;
                let sq = Square::from_rank_file(rank as u8, file as u8);
                let bb = next.bb(color, piece) | (1u64 << sq.index());
                next.set_bb(color, piece, bb);
                file += 1;
            }
            if file != 8 {
                return Err(format!("FEN: rank '{}' does not cover 8 files", rank_str));
            }
        }

        next.side_to_move = match active_color {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("FEN: invalid active color '{}'", other)),
        };

        let mut rights = 0u8;
        if castling != "-" {
            for ch in castling.chars() {
                rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => return Err(format!("FEN: invalid castling flag '{}'", other)),
                };
            }
        }
        next.castling_rights = rights;

        next.en_passant = if ep == "-" {
            None
        } else {
            Some(Square::from_algebraic(ep).ok_or_else(|| format!("FEN: invalid ep square '{}'", ep))?)
        };

        next.halfmove_clock = halfmove
            .parse()
            .map_err(|_| format!("FEN: invalid halfmove clock '{}'", halfmove))?;
        next.fullmove_number = fullmove
            .parse()
            .map_err(|_| format!("FEN: invalid fullmove number '{}'", fullmove))?;

        next.history.clear();
        next.refresh_zobrist();

        *self = next;
        Ok(())
    }

    /// Render this board as a FEN string. Castling letters are emitted in
    /// canonical KQkq order.
    pub fn to_fen(&self) -> String {
        let mut placement = String::with_capacity(64);
        for rank_from_top in 0..8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u32;
            for file in 0..8 {
                let sq = Square::from_rank_file(rank, file);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        placement.push(PC_TO_CHAR[idx]);
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        let active_color = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.castling_rights & CASTLE_WK != 0 {
            castling.push('K');
        }
        if self.castling_rights & CASTLE_WQ != 0 {
            castling.push('Q');
        }
        if self.castling_rights & CASTLE_BK != 0 {
            castling.push('k');
        }
        if self.castling_rights & CASTLE_BQ != 0 {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = match self.en_passant {
            Some(sq) => sq.to_algebraic(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement, active_color, castling, ep, self.halfmove_clock, self.fullmove_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn startpos_round_trips() {
        let board = Board::from_str(STARTPOS_FEN).unwrap();
        assert_eq!(board.to_fen(), STARTPOS_FEN);
    }

    #[test]
    fn new_matches_startpos_fen() {
        let from_new = Board::new();
        let from_fen = Board::from_str(STARTPOS_FEN).unwrap();
        assert_eq!(from_new.to_fen(), from_fen.to_fen());
        assert_eq!(from_new.zobrist, from_fen.zobrist);
    }

    #[test]
    fn ep_square_round_trips() {
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";
        let board = Board::from_str(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn rejects_malformed_fen() {
        assert!(Board::from_str("not a fen").is_err());
        assert!(Board::from_str("8/8/8/8/8/8/8 w - - 0 1").is_err());
    }
}
