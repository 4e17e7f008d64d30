// Saved teams and the in-memory collection that holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::player::{MatchId, Player};

/// Points multiplier for the captain.
pub const CAPTAIN_MULTIPLIER: f64 = 2.0;
/// Points multiplier for the vice-captain.
pub const VICE_CAPTAIN_MULTIPLIER: f64 = 1.5;

/// A finalized fantasy team. Players are a frozen copy, independent of any
/// roster being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub match_id: MatchId,
    pub name: String,
    pub players: Vec<Player>,
    pub captain: Player,
    pub vice_captain: Player,
    /// Sum of player credits, computed once at save time.
    pub total_credits: f64,
    pub created_at: DateTime<Utc>,
    pub contests_joined: u32,
}

impl Team {
    /// Projected score: player points with captain 2x and vice-captain 1.5x.
    pub fn projected_points(&self) -> f64 {
        self.players
            .iter()
            .map(|p| {
                if p.id == self.captain.id {
                    p.points * CAPTAIN_MULTIPLIER
                } else if p.id == self.vice_captain.id {
                    p.points * VICE_CAPTAIN_MULTIPLIER
                } else {
                    p.points
                }
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamError {
    #[error("no team with id `{0}`")]
    NotFound(String),
}

/// Saved teams keyed by id, kept in save order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamCollection {
    teams: Vec<Team>,
}

impl TeamCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new team or replace the one with the same id in place.
    ///
    /// Returns `true` when an existing team was replaced.
    pub fn save(&mut self, team: Team) -> bool {
        match self.teams.iter_mut().find(|t| t.id == team.id) {
            Some(existing) => {
                info!(team_id = %team.id, match_id = team.match_id, "Team updated");
                *existing = team;
                true
            }
            None => {
                info!(team_id = %team.id, match_id = team.match_id, "Team saved");
                self.teams.push(team);
                false
            }
        }
    }

    /// Remove a team. Irreversible.
    pub fn remove(&mut self, team_id: &str) -> Option<Team> {
        let idx = self.teams.iter().position(|t| t.id == team_id)?;
        info!(team_id, "Team deleted");
        Some(self.teams.remove(idx))
    }

    /// Record one more contest entry for the team. Returns the new count.
    pub fn register(&mut self, team_id: &str) -> Result<u32, TeamError> {
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or_else(|| TeamError::NotFound(team_id.to_string()))?;
        team.contests_joined += 1;
        info!(team_id, contests_joined = team.contests_joined, "Team registered");
        Ok(team.contests_joined)
    }

    pub fn get(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    /// Teams built for the given match, in save order.
    pub fn for_match(&self, match_id: MatchId) -> Vec<&Team> {
        self.teams.iter().filter(|t| t.match_id == match_id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
