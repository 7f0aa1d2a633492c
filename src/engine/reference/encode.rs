//! Conversion between shakmaty moves and the 16-bit engine encoding.

use crate::core::{Move, MoveFlag, Promotion, Square};
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, CastlingSide, Chess, Position, Role};

pub(super) fn encode(mv: &shakmaty::Move) -> Move {
    let (from, to) = match mv.to_uci(CastlingMode::Standard) {
        UciMove::Normal { from, to, .. } => (from, to),
        _ => return Move::NULL,
    };
    let (from, to) = (from as u8, to as u8);

    let flag = if let Some(side) = mv.castling_side() {
        match side {
            CastlingSide::KingSide => MoveFlag::KingCastle,
            CastlingSide::QueenSide => MoveFlag::QueenCastle,
        }
    } else if mv.is_en_passant() {
        MoveFlag::EnPassant
    } else if let Some(role) = mv.promotion() {
        MoveFlag::promotion(promotion_piece(role), mv.is_capture())
    } else if mv.is_capture() {
        MoveFlag::Capture
    } else if mv.role() == Role::Pawn && from.abs_diff(to) == 16 {
        MoveFlag::DoublePawnPush
    } else {
        MoveFlag::Quiet
    };

    Move::new(Square(from), Square(to), flag)
}

fn promotion_piece(role: Role) -> Promotion {
    match role {
        Role::Knight => Promotion::Knight,
        Role::Bishop => Promotion::Bishop,
        Role::Rook => Promotion::Rook,
        _ => Promotion::Queen,
    }
}

/// Legal move of `pos` whose encoding is `bits`
pub(super) fn find_legal(pos: &Chess, bits: u16) -> Option<shakmaty::Move> {
    pos.legal_moves()
        .iter()
        .find(|mv| encode(mv).encode() == bits)
        .cloned()
}

pub(super) fn legal_moves(pos: &Chess) -> Vec<u16> {
    pos.legal_moves()
        .iter()
        .map(|mv| encode(mv).encode())
        .collect()
}

/// SAN with piece letters replaced by figurines, e.g. "♘f3" or "exd8=♕#"
pub(super) fn figurine(pos: &Chess, mv: &shakmaty::Move) -> String {
    let mut text: String = San::from_move(pos, mv)
        .to_string()
        .chars()
        .map(|c| match c {
            'K' => '♔',
            'Q' => '♕',
            'R' => '♖',
            'B' => '♗',
            'N' => '♘',
            other => other,
        })
        .collect();

    if let Ok(after) = pos.clone().play(mv) {
        if after.is_checkmate() {
            text.push('#');
        } else if after.is_check() {
            text.push('+');
        }
    }
    text
}
