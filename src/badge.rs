use std::{fmt::Display, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized badge: {0}")]
pub struct UnknownBadge(pub String);

/// Numeric rank window accepted by the public matches filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RankRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Badge {
    Herald,
    Guardian,
    Crusader,
    Archon,
    Legend,
    Ancient,
    Divine,
    Immortal,
}

impl Badge {
    pub const ALL: [Badge; 8] = [
        Badge::Herald,
        Badge::Guardian,
        Badge::Crusader,
        Badge::Archon,
        Badge::Legend,
        Badge::Ancient,
        Badge::Divine,
        Badge::Immortal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Badge::Herald => "Herald",
            Badge::Guardian => "Guardian",
            Badge::Crusader => "Crusader",
            Badge::Archon => "Archon",
            Badge::Legend => "Legend",
            Badge::Ancient => "Ancient",
            Badge::Divine => "Divine",
            Badge::Immortal => "Immortal",
        }
    }

    pub fn rank_range(&self) -> RankRange {
        let (min, max) = match self {
            Badge::Herald => (10, 15),
            Badge::Guardian => (20, 25),
            Badge::Crusader => (30, 35),
            Badge::Archon => (40, 45),
            Badge::Legend => (50, 55),
            Badge::Ancient => (60, 65),
            Badge::Divine => (70, 75),
            Badge::Immortal => (80, 85),
        };
        RankRange { min, max }
    }
}

impl FromStr for Badge {
    type Err = UnknownBadge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Badge::ALL
            .into_iter()
            .find(|badge| badge.name() == s)
            .ok_or_else(|| UnknownBadge(s.to_string()))
    }
}

impl Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
