use std::fmt::Display;

use clickhouse::Row;
use serde::{Deserialize, Serialize};

pub mod opendota;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Side {
    Radiant,
    Dire,
}

impl From<Option<bool>> for Side {
    // unknown results count as a dire win, same as a plain `false`
    fn from(radiant_win: Option<bool>) -> Self {
        if radiant_win.unwrap_or(false) {
            Self::Radiant
        } else {
            Self::Dire
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Side::Radiant => "Radiant",
            Side::Dire => "Dire",
        };
        f.write_str(name)
    }
}

/// Collapsed view of the upstream lobby type: everything that isn't a normal lobby counts as ranked.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum LobbyType {
    Unranked,
    Ranked,
}

impl From<Option<i32>> for LobbyType {
    // a missing code is not a normal lobby either
    fn from(value: Option<i32>) -> Self {
        match value {
            Some(0) => Self::Unranked,
            _ => Self::Ranked,
        }
    }
}

impl Display for LobbyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LobbyType::Unranked => "Unranked",
            LobbyType::Ranked => "Ranked",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum GameMode {
    OldSchoolAllPick,
    CaptainsMode,
    RandomDraft,
    SingleDraft,
    AllRandom,
    HeroesForBeginners,
    Diretide,
    ReverseCaptainsMode,
    Greeviling,
    Tutorial,
    MidOnly,
    LeastPlayed,
    NewPlayerPool,
    AllPick,
    Unknown,
}

impl From<i32> for GameMode {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::OldSchoolAllPick,
            2 => Self::CaptainsMode,
            3 => Self::RandomDraft,
            4 => Self::SingleDraft,
            5 => Self::AllRandom,
            6 => Self::HeroesForBeginners,
            7 => Self::Diretide,
            8 => Self::ReverseCaptainsMode,
            9 => Self::Greeviling,
            10 => Self::Tutorial,
            11 => Self::MidOnly,
            12 => Self::LeastPlayed,
            13 => Self::NewPlayerPool,
            22 => Self::AllPick,
            _ => Self::Unknown,
        }
    }
}

impl From<Option<i32>> for GameMode {
    fn from(value: Option<i32>) -> Self {
        match value {
            Some(code) => code.into(),
            None => Self::Unknown,
        }
    }
}

impl Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameMode::OldSchoolAllPick => "Old School All Pick",
            GameMode::CaptainsMode => "Captain's Mode",
            GameMode::RandomDraft => "Random Draft",
            GameMode::SingleDraft => "Single Draft",
            GameMode::AllRandom => "All Random",
            GameMode::HeroesForBeginners => "Heroes for Beginners",
            GameMode::Diretide => "Diretide",
            GameMode::ReverseCaptainsMode => "Reverse Captain's Mode",
            GameMode::Greeviling => "The Greeviling",
            GameMode::Tutorial => "Tutorial",
            GameMode::MidOnly => "Mid Only",
            GameMode::LeastPlayed => "Least Played",
            GameMode::NewPlayerPool => "New Player Pool",
            GameMode::AllPick => "All Pick",
            GameMode::Unknown => "Unknown Game Mode",
        };
        f.write_str(name)
    }
}

/// Formats a duration in seconds as `MM:SS`.
///
/// Each part is left-padded to two digits, longer minute counts are kept as is.
pub fn format_duration(seconds: u64) -> String {
    format!("{:0>2}:{:0>2}", seconds / 60, seconds % 60)
}

/// A match as we display and persist it.
#[derive(Row, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: u64,
    pub winner: String,
    pub duration: String,
    pub lobby_type: String,
    pub game_mode: String,
}

impl From<&opendota::Match> for MatchRecord {
    fn from(value: &opendota::Match) -> Self {
        Self {
            match_id: value.match_id,
            winner: Side::from(value.radiant_win).to_string(),
            duration: format_duration(value.duration),
            lobby_type: LobbyType::from(value.lobby_type).to_string(),
            game_mode: GameMode::from(value.game_mode).to_string(),
        }
    }
}
