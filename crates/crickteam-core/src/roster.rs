// The team currently being built: selection, captaincy, and snapshotting
// into a saved Team.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::engine::{self, RejectReason, RoleCounts, TeamIssue};
use crate::player::{MatchId, Player, PlayerId};
use crate::rules::TeamRules;
use crate::team::Team;

static NEXT_TEAM_SEQ: AtomicU64 = AtomicU64::new(1);

/// Mint a team id unique within this process.
fn next_team_id() -> String {
    let seq = NEXT_TEAM_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("team-{}-{seq}", Utc::now().timestamp_millis())
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Selected players plus captain and vice-captain, referenced by player id.
///
/// Only [`RosterBuilder`] mutates a roster, so these hold at all times:
/// - players are unique by id and never exceed the squad size
/// - captain and vice-captain, when set, are selected players
/// - captain and vice-captain are different players
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
    captain: Option<PlayerId>,
    vice_captain: Option<PlayerId>,
}

impl Roster {
    /// Selected players in selection order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn captain(&self) -> Option<&Player> {
        self.captain.and_then(|id| self.player(id))
    }

    pub fn vice_captain(&self) -> Option<&Player> {
        self.vice_captain.and_then(|id| self.player(id))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Outcomes and errors
// ---------------------------------------------------------------------------

/// What a successful toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    /// The player was removed; flags report whether a captaincy went with them.
    Removed {
        cleared_captain: bool,
        cleared_vice_captain: bool,
    },
}

/// The two leadership slots of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderSlot {
    Captain,
    ViceCaptain,
}

impl fmt::Display for LeaderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderSlot::Captain => write!(f, "Captain"),
            LeaderSlot::ViceCaptain => write!(f, "Vice Captain"),
        }
    }
}

/// A captain or vice-captain assignment that was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptainError {
    #[error("{slot} must be one of the selected players")]
    NotSelected { slot: LeaderSlot, player_id: PlayerId },

    #[error("Captain and Vice Captain cannot be the same player")]
    SamePlayer { slot: LeaderSlot, player_id: PlayerId },
}

impl CaptainError {
    pub fn code(&self) -> &'static str {
        "INVALID_CAPTAIN"
    }
}

/// The roster cannot be saved yet. `issues` lists every failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("incomplete team: {}", join_issues(.issues))]
pub struct IncompleteTeam {
    pub issues: Vec<TeamIssue>,
}

impl IncompleteTeam {
    pub fn code(&self) -> &'static str {
        "INCOMPLETE_TEAM"
    }
}

fn join_issues(issues: &[TeamIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Read model
// ---------------------------------------------------------------------------

/// Point-in-time view of the roster for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterSummary {
    pub players: Vec<Player>,
    pub captain_id: Option<PlayerId>,
    pub vice_captain_id: Option<PlayerId>,
    pub credits_used: f64,
    pub credits_left: f64,
    pub role_counts: RoleCounts,
    /// Selected players per real team.
    pub team_counts: BTreeMap<String, usize>,
    pub is_complete: bool,
    pub editing_team_id: Option<String>,
}

// ---------------------------------------------------------------------------
// RosterBuilder
// ---------------------------------------------------------------------------

/// The saved team being edited, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditTarget {
    team_id: String,
    contests_joined: u32,
}

/// Owns the roster under construction. Every mutation goes through here.
#[derive(Debug, Clone)]
pub struct RosterBuilder {
    rules: TeamRules,
    roster: Roster,
    editing: Option<EditTarget>,
}

impl RosterBuilder {
    pub fn new(rules: TeamRules) -> Self {
        RosterBuilder {
            rules,
            roster: Roster::default(),
            editing: None,
        }
    }

    pub fn rules(&self) -> &TeamRules {
        &self.rules
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Id of the saved team being edited, if this roster was loaded from one.
    pub fn editing_team_id(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.team_id.as_str())
    }

    /// Select or deselect a player.
    ///
    /// A selected player is removed unconditionally, releasing the captaincy
    /// or vice-captaincy if they held one. An unselected player is added only
    /// if [`engine::can_add`] allows it; otherwise nothing changes and the
    /// reason is returned.
    pub fn toggle(&mut self, player: &Player) -> Result<ToggleOutcome, RejectReason> {
        if let Some(idx) = self.roster.players.iter().position(|p| p.id == player.id) {
            self.roster.players.remove(idx);
            let cleared_captain = self.roster.captain == Some(player.id);
            let cleared_vice_captain = self.roster.vice_captain == Some(player.id);
            if cleared_captain {
                self.roster.captain = None;
            }
            if cleared_vice_captain {
                self.roster.vice_captain = None;
            }
            debug!(player_id = player.id, cleared_captain, cleared_vice_captain, "player removed");
            return Ok(ToggleOutcome::Removed {
                cleared_captain,
                cleared_vice_captain,
            });
        }

        engine::can_add(&self.roster.players, player, &self.rules).inspect_err(|reason| {
            debug!(player_id = player.id, code = reason.code(), "player rejected");
        })?;
        self.roster.players.push(player.clone());
        debug!(player_id = player.id, selected = self.roster.players.len(), "player added");
        Ok(ToggleOutcome::Added)
    }

    /// Whether toggling `player` would succeed, without changing anything.
    ///
    /// Always `Ok` for a selected player, since removal is never blocked.
    pub fn check_toggle(&self, player: &Player) -> Result<(), RejectReason> {
        if self.roster.contains(player.id) {
            return Ok(());
        }
        engine::can_add(&self.roster.players, player, &self.rules)
    }

    pub fn set_captain(&mut self, player_id: PlayerId) -> Result<(), CaptainError> {
        self.assign(LeaderSlot::Captain, player_id)
    }

    pub fn set_vice_captain(&mut self, player_id: PlayerId) -> Result<(), CaptainError> {
        self.assign(LeaderSlot::ViceCaptain, player_id)
    }

    fn assign(&mut self, slot: LeaderSlot, player_id: PlayerId) -> Result<(), CaptainError> {
        if !self.roster.contains(player_id) {
            return Err(CaptainError::NotSelected { slot, player_id });
        }
        let other = match slot {
            LeaderSlot::Captain => self.roster.vice_captain,
            LeaderSlot::ViceCaptain => self.roster.captain,
        };
        if other == Some(player_id) {
            return Err(CaptainError::SamePlayer { slot, player_id });
        }
        match slot {
            LeaderSlot::Captain => self.roster.captain = Some(player_id),
            LeaderSlot::ViceCaptain => self.roster.vice_captain = Some(player_id),
        }
        debug!(player_id, %slot, "leader assigned");
        Ok(())
    }

    /// Replace the working roster with an independent copy of a saved team.
    pub fn load_for_edit(&mut self, team: &Team) {
        let players = team.players.clone();
        let member = |id: PlayerId| players.iter().any(|p| p.id == id).then_some(id);
        let captain = member(team.captain.id);
        let vice_captain = member(team.vice_captain.id).filter(|id| Some(*id) != captain);
        self.roster = Roster {
            players,
            captain,
            vice_captain,
        };
        self.editing = Some(EditTarget {
            team_id: team.id.clone(),
            contests_joined: team.contests_joined,
        });
        debug!(team_id = %team.id, "team loaded for edit");
    }

    /// Clear the roster and forget any team being edited.
    pub fn reset(&mut self) {
        self.roster = Roster::default();
        self.editing = None;
    }

    /// Freeze the roster into a [`Team`]. Does not reset the builder.
    ///
    /// An edited team keeps its id and contest count; a new team gets a fresh
    /// id and starts with no contests joined.
    pub fn finalize_for_save(
        &self,
        match_id: MatchId,
        name: impl Into<String>,
    ) -> Result<Team, IncompleteTeam> {
        let mut issues = engine::completeness_issues(&self.roster.players, &self.rules);
        let captain = self.roster.captain().cloned();
        let vice_captain = self.roster.vice_captain().cloned();
        if captain.is_none() {
            issues.push(TeamIssue::MissingCaptain);
        }
        if vice_captain.is_none() {
            issues.push(TeamIssue::MissingViceCaptain);
        }

        let (Some(captain), Some(vice_captain)) = (captain, vice_captain) else {
            return Err(IncompleteTeam { issues });
        };
        if !issues.is_empty() {
            return Err(IncompleteTeam { issues });
        }

        let (id, contests_joined) = match &self.editing {
            Some(edit) => (edit.team_id.clone(), edit.contests_joined),
            None => (next_team_id(), 0),
        };

        Ok(Team {
            id,
            match_id,
            name: name.into(),
            players: self.roster.players.clone(),
            captain,
            vice_captain,
            total_credits: engine::credits_used(&self.roster.players),
            created_at: Utc::now(),
            contests_joined,
        })
    }

    // --- queries ---

    pub fn role_counts(&self) -> RoleCounts {
        engine::role_counts(&self.roster.players)
    }

    pub fn credits_used(&self) -> f64 {
        engine::credits_used(&self.roster.players)
    }

    pub fn credits_left(&self) -> f64 {
        engine::credits_left(&self.roster.players, &self.rules)
    }

    pub fn is_complete(&self) -> bool {
        engine::is_complete(&self.roster.players, &self.rules)
    }

    pub fn completeness_issues(&self) -> Vec<TeamIssue> {
        engine::completeness_issues(&self.roster.players, &self.rules)
    }

    pub fn summary(&self) -> RosterSummary {
        let players = &self.roster.players;
        RosterSummary {
            players: players.clone(),
            captain_id: self.roster.captain,
            vice_captain_id: self.roster.vice_captain,
            credits_used: engine::credits_used(players),
            credits_left: engine::credits_left(players, &self.rules),
            role_counts: engine::role_counts(players),
            team_counts: engine::team_counts(players),
            is_complete: engine::is_complete(players, &self.rules),
            editing_team_id: self.editing_team_id().map(str::to_string),
        }
    }
}
