//! Move representation
//!
//! Moves are exchanged with the engine in a compact 16-bit format:
//! - bits 10-15: from square (0-63)
//! - bits 4-9: to square (0-63)
//! - bits 0-3: flag nibble
//!
//! Flag nibble values:
//! - 0: quiet, 1: double pawn push
//! - 2: king-side castle, 3: queen-side castle
//! - 4: capture, 5: en passant
//! - 8..=11: promotion to knight, bishop, rook, queen
//! - 12..=15: capturing promotion to the same pieces
//!
//! The all-zero value is the null move. It is never legal and only marks the
//! absence of a move.

use super::board::Square;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named values of the flag nibble
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum MoveFlag {
    Quiet = 0,
    DoublePawnPush = 1,
    KingCastle = 2,
    QueenCastle = 3,
    Capture = 4,
    EnPassant = 5,
    KnightPromotion = 8,
    BishopPromotion = 9,
    RookPromotion = 10,
    QueenPromotion = 11,
    KnightPromotionCapture = 12,
    BishopPromotionCapture = 13,
    RookPromotionCapture = 14,
    QueenPromotionCapture = 15,
}

impl MoveFlag {
    /// Nibbles 6 and 7 have no assigned meaning.
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        Some(match nibble & 0xF {
            0 => MoveFlag::Quiet,
            1 => MoveFlag::DoublePawnPush,
            2 => MoveFlag::KingCastle,
            3 => MoveFlag::QueenCastle,
            4 => MoveFlag::Capture,
            5 => MoveFlag::EnPassant,
            8 => MoveFlag::KnightPromotion,
            9 => MoveFlag::BishopPromotion,
            10 => MoveFlag::RookPromotion,
            11 => MoveFlag::QueenPromotion,
            12 => MoveFlag::KnightPromotionCapture,
            13 => MoveFlag::BishopPromotionCapture,
            14 => MoveFlag::RookPromotionCapture,
            15 => MoveFlag::QueenPromotionCapture,
            _ => return None,
        })
    }

    /// Promotion flag for `piece`, optionally capturing
    pub const fn promotion(piece: Promotion, is_capture: bool) -> Self {
        match (piece, is_capture) {
            (Promotion::Knight, false) => MoveFlag::KnightPromotion,
            (Promotion::Bishop, false) => MoveFlag::BishopPromotion,
            (Promotion::Rook, false) => MoveFlag::RookPromotion,
            (Promotion::Queen, false) => MoveFlag::QueenPromotion,
            (Promotion::Knight, true) => MoveFlag::KnightPromotionCapture,
            (Promotion::Bishop, true) => MoveFlag::BishopPromotionCapture,
            (Promotion::Rook, true) => MoveFlag::RookPromotionCapture,
            (Promotion::Queen, true) => MoveFlag::QueenPromotionCapture,
        }
    }
}

/// Piece a pawn promotes to
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Promotion {
    Knight = 0,
    Bishop = 1,
    Rook = 2,
    Queen = 3,
}

impl Promotion {
    pub const fn to_char(self) -> char {
        match self {
            Promotion::Knight => 'n',
            Promotion::Bishop => 'b',
            Promotion::Rook => 'r',
            Promotion::Queen => 'q',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'n' => Some(Promotion::Knight),
            'b' => Some(Promotion::Bishop),
            'r' => Some(Promotion::Rook),
            'q' => Some(Promotion::Queen),
            _ => None,
        }
    }
}

/// A chess move encoded in 16 bits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    const FROM_SHIFT: u16 = 10;
    const TO_SHIFT: u16 = 4;
    const SQUARE_MASK: u16 = 0x3F;
    const FLAG_MASK: u16 = 0xF;

    const CAPTURE_BIT: u16 = 0b0100;
    const PROMOTION_BIT: u16 = 0b1000;
    const PROMOTION_PIECE_MASK: u16 = 0b1011;

    /// Wrap raw engine bits. Every 16-bit value decodes.
    #[inline]
    pub const fn decode(bits: u16) -> Self {
        Move(bits)
    }

    #[inline]
    pub const fn encode(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        Move(
            ((from.0 as u16 & Self::SQUARE_MASK) << Self::FROM_SHIFT)
                | ((to.0 as u16 & Self::SQUARE_MASK) << Self::TO_SHIFT)
                | flag as u16,
        )
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square(((self.0 >> Self::FROM_SHIFT) & Self::SQUARE_MASK) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square(((self.0 >> Self::TO_SHIFT) & Self::SQUARE_MASK) as u8)
    }

    /// Raw flag nibble
    #[inline]
    pub const fn nibble(self) -> u8 {
        (self.0 & Self::FLAG_MASK) as u8
    }

    #[inline]
    pub const fn flag(self) -> Option<MoveFlag> {
        MoveFlag::from_nibble(self.nibble())
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_quiet(self) -> bool {
        self.0 & (Self::CAPTURE_BIT | Self::PROMOTION_BIT) == 0
    }

    #[inline]
    pub const fn is_double_pawn_push(self) -> bool {
        self.nibble() == MoveFlag::DoublePawnPush as u8
    }

    #[inline]
    pub const fn is_king_castle(self) -> bool {
        self.nibble() == MoveFlag::KingCastle as u8
    }

    #[inline]
    pub const fn is_queen_castle(self) -> bool {
        self.nibble() == MoveFlag::QueenCastle as u8
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        self.is_king_castle() || self.is_queen_castle()
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        self.0 & Self::CAPTURE_BIT != 0
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        self.nibble() == MoveFlag::EnPassant as u8
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.0 & Self::PROMOTION_BIT != 0
    }

    /// Promotion piece, selected by the low two bits when bit 3 is set and
    /// bit 1 is clear
    #[inline]
    pub const fn promotion(self) -> Option<Promotion> {
        match self.0 & Self::PROMOTION_PIECE_MASK {
            8 => Some(Promotion::Knight),
            9 => Some(Promotion::Bishop),
            10 => Some(Promotion::Rook),
            11 => Some(Promotion::Queen),
            _ => None,
        }
    }

    /// Coordinate notation, e.g. "e2e4" or "e7e8q"
    pub fn to_algebraic(self) -> String {
        let mut s = format!("{}{}", self.from(), self.to());
        if self.is_promotion() {
            s.push(self.promotion().map_or('q', Promotion::to_char));
        }
        s
    }
}

impl From<u16> for Move {
    fn from(bits: u16) -> Self {
        Move::decode(bits)
    }
}

impl From<Move> for u16 {
    fn from(mv: Move) -> Self {
        mv.encode()
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({:#06x}: {})", self.0, self)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("0000")
        } else {
            f.write_str(&self.to_algebraic())
        }
    }
}
