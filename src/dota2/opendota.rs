// response definitions of the OpenDota endpoints we call
// both /matches/{id} and /publicMatches carry many more fields, we only keep what we display

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Match {
    pub match_id: u64,
    // null for matches OpenDota hasn't parsed a result for
    #[serde(default)]
    pub radiant_win: Option<bool>,
    pub duration: u64,
    #[serde(default)]
    pub lobby_type: Option<i32>,
    #[serde(default)]
    pub game_mode: Option<i32>,
}
