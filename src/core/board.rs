//! Board snapshot parsed from FEN
//!
//! A [`Board`] is a pure transcription of the six FEN fields. It performs no
//! legality checks; the engine validates positions when they are submitted.

use crate::error::EngineError;
use std::fmt;
use std::str::FromStr;

/// Square representation (0-63, a1=0, h8=63)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Square(pub u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const C1: Square = Square(2);
    pub const E1: Square = Square(4);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const E2: Square = Square(12);
    pub const E4: Square = Square(28);
    pub const E7: Square = Square(52);
    pub const A8: Square = Square(56);
    pub const C8: Square = Square(58);
    pub const E8: Square = Square(60);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    #[inline]
    pub const fn new(sq: u8) -> Self {
        Square(sq)
    }

    #[inline]
    pub const fn from_file_rank(file: u8, rank: u8) -> Self {
        Square(rank * 8 + file)
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Parse a square from algebraic notation (e.g., "e4")
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let (file, rank) = (chars.next()?, chars.next()?);
        if chars.next().is_some() {
            return None;
        }
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Some(Square::from_file_rank(file as u8 - b'a', rank as u8 - b'1'))
    }

    /// Convert to algebraic notation
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        format!("{}{}", file, rank)
    }
}

impl FromStr for Square {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| EngineError::InvalidSquare(s.to_string()))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

/// Piece color
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// FEN side-to-move letter
    pub const fn to_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn from_fen(field: &str) -> Option<Self> {
        match field {
            "w" => Some(Color::White),
            "b" => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;
    fn not(self) -> Self::Output {
        self.opposite()
    }
}

/// Piece type
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum PieceType {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceType {
    pub const fn to_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }
}

/// A colored piece
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
}

impl Piece {
    #[inline]
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Piece { piece_type, color }
    }

    /// Uppercase for white, lowercase for black
    pub fn to_char(self) -> char {
        let c = self.piece_type.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let piece_type = PieceType::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(piece_type, color))
    }
}

/// Castling rights
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;
    pub const ALL: CastlingRights = CastlingRights(0xF);

    const LETTERS: [(char, u8); 4] = [
        ('K', Self::WHITE_KINGSIDE),
        ('Q', Self::WHITE_QUEENSIDE),
        ('k', Self::BLACK_KINGSIDE),
        ('q', Self::BLACK_QUEENSIDE),
    ];

    #[inline]
    pub const fn new(rights: u8) -> Self {
        CastlingRights(rights & 0xF)
    }

    #[inline]
    pub const fn has(self, right: u8) -> bool {
        (self.0 & right) != 0
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    pub fn can_castle_kingside(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_KINGSIDE),
            Color::Black => self.has(Self::BLACK_KINGSIDE),
        }
    }

    pub fn can_castle_queenside(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_QUEENSIDE),
            Color::Black => self.has(Self::BLACK_QUEENSIDE),
        }
    }

    /// Letters other than `KQkq` are ignored.
    pub fn from_fen(field: &str) -> Self {
        let bits = field
            .chars()
            .filter_map(|c| Self::LETTERS.iter().find(|(l, _)| *l == c))
            .fold(0, |acc, (_, bit)| acc | bit);
        CastlingRights(bits)
    }

    pub fn to_fen(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        Self::LETTERS
            .iter()
            .filter(|(_, bit)| self.has(*bit))
            .map(|(l, _)| *l)
            .collect()
    }
}

/// Position snapshot transcribed from a FEN string
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    /// Piece codes indexed by square, rank 1 first
    pub pieces: [Option<char>; 64],
    /// Side to move, `None` if the field was missing or not `w`/`b`
    pub turn: Option<Color>,
    pub castling: CastlingRights,
    /// En passant target square (if any)
    pub en_passant: Option<Square>,
    /// Halfmove clock (for the fifty-move rule), `None` if not numeric
    pub halfmove_clock: Option<u32>,
    /// Fullmove number, `None` if not numeric
    pub fullmove_number: Option<u32>,
}

impl Board {
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Create a new empty board
    pub fn empty() -> Self {
        Board {
            pieces: [None; 64],
            turn: None,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: None,
            fullmove_number: None,
        }
    }

    pub fn startpos() -> Self {
        Self::from_fen(Self::STARTPOS)
    }

    /// Transcribe a FEN string.
    ///
    /// Fields are separated by single spaces. Missing or malformed fields fall
    /// back to their empty value instead of failing; characters that would land
    /// outside the 8x8 grid are dropped.
    pub fn from_fen(fen: &str) -> Self {
        let mut board = Board::empty();
        let mut fields = fen.split(' ');

        let placement = fields.next().unwrap_or("");
        for (rank, row) in placement.split('/').rev().enumerate() {
            let mut file = 0usize;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    if rank < 8 && file < 8 {
                        board.pieces[rank * 8 + file] = Some(c);
                    }
                    file += 1;
                }
            }
        }

        board.turn = fields.next().and_then(Color::from_fen);
        board.castling = fields.next().map(CastlingRights::from_fen).unwrap_or_default();
        board.en_passant = fields.next().and_then(Square::from_algebraic);
        board.halfmove_clock = leading_number(fields.next());
        board.fullmove_number = leading_number(fields.next());

        board
    }

    /// Render the snapshot back to FEN; missing fields become `-`.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.pieces[rank * 8 + file] {
                    Some(c) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(c);
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(self.turn.map_or('-', Color::to_char));
        fen.push(' ');
        fen.push_str(&self.castling.to_fen());
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }
        for number in [self.halfmove_clock, self.fullmove_number] {
            fen.push(' ');
            match number {
                Some(n) => fen.push_str(&n.to_string()),
                None => fen.push('-'),
            }
        }

        fen
    }

    /// Raw piece code on a square
    #[inline]
    pub fn code_at(&self, sq: Square) -> Option<char> {
        self.pieces.get(sq.index()).copied().flatten()
    }

    /// Decoded piece on a square; unknown codes read as empty.
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.code_at(sq).and_then(Piece::from_char)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(PieceType::King, color);
        (0..64u8)
            .map(Square)
            .find(|&sq| self.piece_at(sq) == Some(king))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

/// Best-effort integer conversion: the leading run of digits, if any.
fn leading_number(field: Option<&str>) -> Option<u32> {
    let field = field?.trim_start();
    let end = field
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(field.len());
    field[..end].parse().ok()
}
