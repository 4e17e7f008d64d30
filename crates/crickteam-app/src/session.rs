// Session state: the current match, its player pool, the roster being built
// and the saved teams. Every user action goes through a method here, and
// every outcome the user should see is sent to the notifier.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crickteam_core::config::ContestConfig;
use crickteam_core::engine::RejectReason;
use crickteam_core::player::{Match, MatchId, Player, PlayerFilter, PlayerId};
use crickteam_core::roster::{
    CaptainError, IncompleteTeam, RosterBuilder, RosterSummary, ToggleOutcome,
};
use crickteam_core::rules::TeamRules;
use crickteam_core::team::{Team, TeamCollection};

use crate::notify::{Notifier, Severity};
use crate::provider::{MatchProvider, PlayerProvider};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("no match selected")]
    NoMatchSelected,

    #[error("unknown match {0}")]
    UnknownMatch(MatchId),

    #[error("player {0} is not in this match")]
    UnknownPlayer(PlayerId),

    #[error("no team with id `{0}`")]
    TeamNotFound(String),

    #[error("team `{team_id}` belongs to match {team_match}, not {current}")]
    MatchMismatch {
        team_id: String,
        team_match: MatchId,
        current: MatchId,
    },

    #[error(transparent)]
    Rejected(#[from] RejectReason),

    #[error(transparent)]
    InvalidCaptain(#[from] CaptainError),

    #[error(transparent)]
    Incomplete(#[from] IncompleteTeam),

    #[error("Please select at least one team to register")]
    NoTeamSelected,
}

/// Result of a successful contest registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub teams: u32,
    pub total_fee: u32,
}

pub struct Session {
    rules: TeamRules,
    contest: ContestConfig,
    match_source: Arc<dyn MatchProvider>,
    player_source: Arc<dyn PlayerProvider>,
    notifier: Arc<dyn Notifier>,
    matches: Vec<Match>,
    current_match: Option<Match>,
    players: Vec<Player>,
    builder: RosterBuilder,
    teams: TeamCollection,
}

impl Session {
    pub fn new(
        rules: TeamRules,
        contest: ContestConfig,
        match_source: Arc<dyn MatchProvider>,
        player_source: Arc<dyn PlayerProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Session {
            builder: RosterBuilder::new(rules.clone()),
            rules,
            contest,
            match_source,
            player_source,
            notifier,
            matches: Vec::new(),
            current_match: None,
            players: Vec::new(),
            teams: TeamCollection::new(),
        }
    }

    // --- matches and players ---

    /// Fetch the match list. An unavailable source yields an empty list.
    pub async fn load_matches(&mut self) -> &[Match] {
        self.matches = self.match_source.fetch_matches().await;
        info!(count = self.matches.len(), "Matches loaded");
        &self.matches
    }

    /// Make `match_id` current: fetch its players and start a fresh roster.
    pub async fn select_match(&mut self, match_id: MatchId) -> Result<&Match, SessionError> {
        let selected = self
            .matches
            .iter()
            .find(|m| m.id == match_id)
            .cloned()
            .ok_or(SessionError::UnknownMatch(match_id))?;

        let players = self.player_source.fetch_players(match_id).await;
        if players.is_empty() {
            warn!(match_id, "no players available for match");
        }
        info!(
            match_id,
            players = players.len(),
            "Match selected: {} vs {}",
            selected.t1_short_name,
            selected.t2_short_name
        );

        self.players = players;
        self.builder.reset();
        Ok(&*self.current_match.insert(selected))
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.current_match.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Players of the current match passing `filter`, in feed order.
    pub fn filtered_players(&self, filter: &PlayerFilter) -> Vec<&Player> {
        filter.apply(&self.players)
    }

    // --- roster ---

    /// Discard the working roster and start a new, unsaved team.
    pub fn start_new_team(&mut self) {
        self.builder.reset();
        debug!("new team started");
    }

    /// Load a saved team of the current match into the working roster.
    pub fn edit_team(&mut self, team_id: &str) -> Result<(), SessionError> {
        let current = self.current_match_id()?;
        let team = self
            .teams
            .get(team_id)
            .ok_or_else(|| SessionError::TeamNotFound(team_id.to_string()))?;
        if team.match_id != current {
            return Err(SessionError::MatchMismatch {
                team_id: team_id.to_string(),
                team_match: team.match_id,
                current,
            });
        }
        self.builder.load_for_edit(team);
        Ok(())
    }

    /// Select or deselect a player of the current match.
    pub fn toggle_player(&mut self, player_id: PlayerId) -> Result<ToggleOutcome, SessionError> {
        self.current_match_id()?;
        let player = self
            .players
            .iter()
            .find(|p| p.id == player_id)
            .ok_or(SessionError::UnknownPlayer(player_id))?;

        match self.builder.toggle(player) {
            Ok(outcome) => Ok(outcome),
            Err(reason) => {
                self.notifier
                    .notify("Cannot add player", &reason.to_string(), Severity::Error);
                Err(reason.into())
            }
        }
    }

    /// Whether toggling `player_id` would currently succeed.
    pub fn can_toggle(&self, player_id: PlayerId) -> Result<(), SessionError> {
        let player = self
            .players
            .iter()
            .find(|p| p.id == player_id)
            .ok_or(SessionError::UnknownPlayer(player_id))?;
        Ok(self.builder.check_toggle(player)?)
    }

    pub fn select_captain(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        let result = self.builder.set_captain(player_id);
        self.report_captain(result)
    }

    pub fn select_vice_captain(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        let result = self.builder.set_vice_captain(player_id);
        self.report_captain(result)
    }

    fn report_captain(&self, result: Result<(), CaptainError>) -> Result<(), SessionError> {
        result.map_err(|e| {
            self.notifier
                .notify("Invalid selection", &e.to_string(), Severity::Error);
            SessionError::from(e)
        })
    }

    /// Check the composition before moving on to captain selection.
    /// Captaincy is not part of this check.
    pub fn validate_selection(&self) -> Result<(), SessionError> {
        let issues = self.builder.completeness_issues();
        match issues.first() {
            None => Ok(()),
            Some(first) => {
                self.notifier
                    .notify("Invalid team", &first.to_string(), Severity::Error);
                Err(IncompleteTeam { issues }.into())
            }
        }
    }

    pub fn roster_summary(&self) -> RosterSummary {
        self.builder.summary()
    }

    // --- saved teams ---

    /// Finalize the working roster into the collection and start afresh.
    ///
    /// A new team is named `Team N`; an edited team keeps its name, id and
    /// contest count.
    pub fn save_team(&mut self) -> Result<Team, SessionError> {
        let match_id = self.current_match_id()?;
        let roster = self.builder.roster();
        let missing_leader = roster.captain().is_none() || roster.vice_captain().is_none();

        let existing = self
            .builder
            .editing_team_id()
            .and_then(|id| self.teams.get(id));
        let name = match existing {
            Some(team) => team.name.clone(),
            None => self.default_team_name(match_id),
        };
        // Registrations made while the edit was open still count.
        let contests_joined = existing.map(|t| t.contests_joined);

        let mut team = match self.builder.finalize_for_save(match_id, name) {
            Ok(team) => team,
            Err(incomplete) => {
                if missing_leader {
                    self.notifier.notify(
                        "Incomplete selection",
                        "Please select both Captain and Vice Captain",
                        Severity::Error,
                    );
                } else if let Some(first) = incomplete.issues.first() {
                    self.notifier
                        .notify("Invalid team", &first.to_string(), Severity::Error);
                }
                return Err(incomplete.into());
            }
        };
        if let Some(count) = contests_joined {
            team.contests_joined = count;
        }

        let replaced = self.teams.save(team.clone());
        self.builder.reset();
        if replaced {
            self.notifier.notify(
                "Team updated!",
                "Your team has been updated successfully",
                Severity::Success,
            );
        } else {
            self.notifier.notify(
                "Team saved!",
                "Your team has been created successfully",
                Severity::Success,
            );
        }
        Ok(team)
    }

    /// Remove a saved team. Editing it is abandoned as well.
    pub fn delete_team(&mut self, team_id: &str) -> Result<Team, SessionError> {
        let removed = self
            .teams
            .remove(team_id)
            .ok_or_else(|| SessionError::TeamNotFound(team_id.to_string()))?;
        if self.builder.editing_team_id() == Some(team_id) {
            self.builder.reset();
        }
        self.notifier.notify(
            "Team deleted",
            "Your team has been successfully deleted",
            Severity::Success,
        );
        Ok(removed)
    }

    /// Enter each listed team into a contest, charging the entry fee per team.
    ///
    /// All ids are checked before any count changes. Repeated ids count once.
    pub fn register_teams<S: AsRef<str>>(
        &mut self,
        team_ids: &[S],
    ) -> Result<Registration, SessionError> {
        if team_ids.is_empty() {
            self.notifier.notify(
                "No team selected",
                "Please select at least one team to register",
                Severity::Error,
            );
            return Err(SessionError::NoTeamSelected);
        }

        let mut ids: Vec<&str> = Vec::with_capacity(team_ids.len());
        for id in team_ids.iter().map(AsRef::as_ref) {
            if self.teams.get(id).is_none() {
                return Err(SessionError::TeamNotFound(id.to_string()));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        for id in &ids {
            self.teams
                .register(id)
                .map_err(|_| SessionError::TeamNotFound(id.to_string()))?;
        }

        let teams = ids.len() as u32;
        let total_fee = teams * self.contest.entry_fee;
        info!(teams, total_fee, "Teams registered");
        self.notifier.notify(
            "Registration successful!",
            &format!("{teams} team(s) registered for ₹{total_fee}"),
            Severity::Success,
        );
        Ok(Registration { teams, total_fee })
    }

    /// Saved teams of the current match, in save order.
    pub fn teams_for_match(&self) -> Vec<&Team> {
        match &self.current_match {
            Some(m) => self.teams.for_match(m.id),
            None => Vec::new(),
        }
    }

    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.get(team_id)
    }

    pub fn rules(&self) -> &TeamRules {
        &self.rules
    }

    // --- helpers ---

    fn current_match_id(&self) -> Result<MatchId, SessionError> {
        self.current_match
            .as_ref()
            .map(|m| m.id)
            .ok_or(SessionError::NoMatchSelected)
    }

    /// `Team N` with N one past the match's team count, skipping names in use.
    fn default_team_name(&self, match_id: MatchId) -> String {
        let existing = self.teams.for_match(match_id);
        let mut n = existing.len() + 1;
        loop {
            let name = format!("Team {n}");
            if !existing.iter().any(|t| t.name == name) {
                return name;
            }
            n += 1;
        }
    }
}
