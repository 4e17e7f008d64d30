// Players, roles and matches as delivered by the external data feed.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identity of a player within a match feed.
pub type PlayerId = u64;

/// Identity of a match.
pub type MatchId = u64;

/// Cricket playing roles used for quota accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Role {
    WicketKeeper,
    Batsman,
    AllRounder,
    Bowler,
}

impl Role {
    /// All roles in display order (WK, BAT, AR, BOWL).
    pub const ALL: [Role; 4] = [
        Role::WicketKeeper,
        Role::Batsman,
        Role::AllRounder,
        Role::Bowler,
    ];

    /// Parse a role string from the feed into a Role.
    ///
    /// Case, hyphens, spaces and underscores are ignored, so
    /// "Wicket-Keeper", "wicketkeeper" and "WICKET KEEPER" all parse.
    /// Short codes ("WK", "BAT", "AR", "BOWL") are accepted as well.
    pub fn from_str_role(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | ' ' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "wicketkeeper" | "wk" | "keeper" => Some(Role::WicketKeeper),
            "batsman" | "batter" | "bat" => Some(Role::Batsman),
            "allrounder" | "ar" => Some(Role::AllRounder),
            "bowler" | "bowl" => Some(Role::Bowler),
            _ => None,
        }
    }

    /// Short label used in counts and summaries.
    pub fn short_str(&self) -> &'static str {
        match self {
            Role::WicketKeeper => "WK",
            Role::Batsman => "BAT",
            Role::AllRounder => "AR",
            Role::Bowler => "BOWL",
        }
    }

    /// Full display name, matching the feed's canonical spelling.
    pub fn display_str(&self) -> &'static str {
        match self {
            Role::WicketKeeper => "Wicket-Keeper",
            Role::Batsman => "Batsman",
            Role::AllRounder => "All-Rounder",
            Role::Bowler => "Bowler",
        }
    }

    /// Plural lower-case noun used in user-facing messages.
    pub fn plural_str(&self) -> &'static str {
        match self {
            Role::WicketKeeper => "wicket-keepers",
            Role::Batsman => "batsmen",
            Role::AllRounder => "all-rounders",
            Role::Bowler => "bowlers",
        }
    }

    /// Stable index into per-role arrays.
    pub fn index(&self) -> usize {
        match self {
            Role::WicketKeeper => 0,
            Role::Batsman => 1,
            Role::AllRounder => 2,
            Role::Bowler => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Role::from_str_role(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown player role `{raw}`")))
    }
}

/// A player as listed for a match. Never mutated once ingested.
///
/// Field names follow the feed (`event_player_credit`, `event_total_points`)
/// on the wire; Rust-side names are the domain terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Feed-side player key. Informational only.
    #[serde(default)]
    pub player_id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub team_name: String,
    pub team_short_name: String,
    #[serde(default)]
    pub team_id: u64,
    pub role: Role,
    #[serde(rename = "event_player_credit", deserialize_with = "credit_value")]
    pub credit: f64,
    #[serde(rename = "event_total_points", default)]
    pub points: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub is_playing: bool,
}

/// Credits must be finite and non-negative; anything else would poison the
/// budget sums in the engine.
fn credit_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let credit = f64::deserialize(deserializer)?;
    if !credit.is_finite() || credit < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "invalid player credit `{credit}`"
        )));
    }
    Ok(credit)
}

/// A scheduled, live or completed match between two real teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub match_name: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub match_type: String,
    #[serde(default)]
    pub match_date: String,
    #[serde(default)]
    pub match_status: String,
    pub t1_name: String,
    pub t2_name: String,
    pub t1_short_name: String,
    pub t2_short_name: String,
    #[serde(default)]
    pub t1_image: String,
    #[serde(default)]
    pub t2_image: String,
    #[serde(default)]
    pub team_a_id: u64,
    #[serde(default)]
    pub team_b_id: u64,
}

/// Pick-list filter. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerFilter {
    pub role: Option<Role>,
    pub team_short_name: Option<String>,
    /// Case-insensitive substring of `name` or `short_name`.
    pub search: Option<String>,
}

impl PlayerFilter {
    pub fn matches(&self, player: &Player) -> bool {
        if let Some(role) = self.role {
            if player.role != role {
                return false;
            }
        }
        if let Some(team) = &self.team_short_name {
            if &player.team_short_name != team {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                player.name.to_lowercase().contains(&term)
                    || player.short_name.to_lowercase().contains(&term)
            }
        }
    }

    /// Apply the filter, preserving feed order.
    pub fn apply<'a>(&self, players: &'a [Player]) -> Vec<&'a Player> {
        players.iter().filter(|p| self.matches(p)).collect()
    }
}
