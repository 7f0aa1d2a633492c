//! Game outcome reported by the engine's status primitive

use super::board::Color;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Ongoing,
    /// Black is mated
    WhiteWins,
    /// White is mated
    BlackWins,
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl GameStatus {
    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => GameStatus::Ongoing,
            1 => GameStatus::WhiteWins,
            2 => GameStatus::BlackWins,
            3 => GameStatus::Stalemate,
            4 => GameStatus::FiftyMoveRule,
            5 => GameStatus::ThreefoldRepetition,
            6 => GameStatus::InsufficientMaterial,
            _ => return None,
        })
    }

    pub const fn code(self) -> i32 {
        match self {
            GameStatus::Ongoing => 0,
            GameStatus::WhiteWins => 1,
            GameStatus::BlackWins => 2,
            GameStatus::Stalemate => 3,
            GameStatus::FiftyMoveRule => 4,
            GameStatus::ThreefoldRepetition => 5,
            GameStatus::InsufficientMaterial => 6,
        }
    }

    pub const fn is_ongoing(self) -> bool {
        self.code() == 0
    }

    pub const fn is_game_over(self) -> bool {
        self.code() != 0
    }

    pub const fn is_checkmate(self) -> bool {
        matches!(self, GameStatus::WhiteWins | GameStatus::BlackWins)
    }

    pub const fn is_draw(self) -> bool {
        self.code() >= 3
    }

    pub const fn is_draw_by_stalemate(self) -> bool {
        matches!(self, GameStatus::Stalemate)
    }

    pub const fn is_draw_by_fifty_move_rule(self) -> bool {
        matches!(self, GameStatus::FiftyMoveRule)
    }

    pub const fn is_draw_by_threefold_repetition(self) -> bool {
        matches!(self, GameStatus::ThreefoldRepetition)
    }

    pub const fn is_draw_by_insufficient_material(self) -> bool {
        matches!(self, GameStatus::InsufficientMaterial)
    }

    pub const fn winner(self) -> Option<Color> {
        match self {
            GameStatus::WhiteWins => Some(Color::White),
            GameStatus::BlackWins => Some(Color::Black),
            _ => None,
        }
    }
}
