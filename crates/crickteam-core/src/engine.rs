// Constraint checks over a roster snapshot. Pure functions, no state.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::player::{Player, Role};
use crate::rules::TeamRules;

// ---------------------------------------------------------------------------
// Rejection and issue types
// ---------------------------------------------------------------------------

/// Why a player could not be added. Display strings are user-facing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("Team is full")]
    RosterFull { max: usize },

    #[error("Not enough credits")]
    InsufficientCredits { credits_left: f64, needed: f64 },

    #[error("Max {max} players from one team")]
    TeamCapExceeded { team: String, max: usize },

    #[error("Max {} reached", .role.plural_str())]
    RoleCapExceeded { role: Role, max: usize },
}

impl RejectReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::RosterFull { .. } => "ROSTER_FULL",
            RejectReason::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            RejectReason::TeamCapExceeded { .. } => "TEAM_CAP_EXCEEDED",
            RejectReason::RoleCapExceeded { .. } => "ROLE_CAP_EXCEEDED",
        }
    }
}

/// A single rule a finished roster fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamIssue {
    #[error("Please select exactly {required} players. Currently selected: {selected}")]
    WrongPlayerCount { selected: usize, required: usize },

    #[error("Minimum {min} {} required, {count} selected", .role.plural_str())]
    BelowMinimum { role: Role, min: usize, count: usize },

    #[error("Maximum {max} {} allowed, {count} selected", .role.plural_str())]
    AboveMaximum { role: Role, max: usize, count: usize },

    #[error("Please select a Captain")]
    MissingCaptain,

    #[error("Please select a Vice Captain")]
    MissingViceCaptain,
}

// ---------------------------------------------------------------------------
// Tallies
// ---------------------------------------------------------------------------

/// Player count per role. Every role is present, defaulting to 0.
///
/// Serializes as a map keyed by short role label: `{"WK":1,"BAT":4,...}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    counts: [usize; 4],
}

impl RoleCounts {
    pub fn get(&self, role: Role) -> usize {
        self.counts[role.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(role, count)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, usize)> + '_ {
        Role::ALL.into_iter().map(|r| (r, self.get(r)))
    }
}

impl Serialize for RoleCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Role::ALL.len()))?;
        for (role, count) in self.iter() {
            map.serialize_entry(role.short_str(), &count)?;
        }
        map.end()
    }
}

pub fn role_counts(players: &[Player]) -> RoleCounts {
    let mut counts = RoleCounts::default();
    for p in players {
        counts.counts[p.role.index()] += 1;
    }
    counts
}

pub fn credits_used(players: &[Player]) -> f64 {
    players.iter().map(|p| p.credit).sum()
}

pub fn credits_left(players: &[Player], rules: &TeamRules) -> f64 {
    rules.max_credits - credits_used(players)
}

/// Number of selected players from the given real team.
pub fn team_count(players: &[Player], team_short_name: &str) -> usize {
    players
        .iter()
        .filter(|p| p.team_short_name == team_short_name)
        .count()
}

/// Selected players grouped by real team.
pub fn team_counts(players: &[Player]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for p in players {
        *counts.entry(p.team_short_name.clone()).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Slack on the budget comparison. Feed credits come in tenths, whose f64
/// sums can overshoot an exact total by a few ulps.
const CREDIT_TOLERANCE: f64 = 1e-6;

/// Whether `player` may be appended to `players`.
///
/// Checks run in a fixed order and the first failure wins: squad size,
/// credits, real-team cap, role maximum. Role minimums are not consulted;
/// they only gate saving (see [`is_complete`]).
///
/// Only meaningful for a player not already in `players`. Selecting an
/// already-picked player is a removal, which is never blocked; go through
/// `RosterBuilder::toggle` rather than calling this directly.
pub fn can_add(players: &[Player], player: &Player, rules: &TeamRules) -> Result<(), RejectReason> {
    if players.len() >= rules.total_players {
        return Err(RejectReason::RosterFull {
            max: rules.total_players,
        });
    }

    let used = credits_used(players);
    if used + player.credit > rules.max_credits + CREDIT_TOLERANCE {
        return Err(RejectReason::InsufficientCredits {
            credits_left: rules.max_credits - used,
            needed: player.credit,
        });
    }

    if team_count(players, &player.team_short_name) >= rules.max_per_real_team {
        return Err(RejectReason::TeamCapExceeded {
            team: player.team_short_name.clone(),
            max: rules.max_per_real_team,
        });
    }

    let max = rules.bounds(player.role).max;
    if role_counts(players).get(player.role) >= max {
        return Err(RejectReason::RoleCapExceeded {
            role: player.role,
            max,
        });
    }

    Ok(())
}

/// Every rule the roster fails, in order: squad size, role minimums, role
/// maximums. Empty exactly when [`is_complete`] holds.
pub fn completeness_issues(players: &[Player], rules: &TeamRules) -> Vec<TeamIssue> {
    let mut issues = Vec::new();

    if players.len() != rules.total_players {
        issues.push(TeamIssue::WrongPlayerCount {
            selected: players.len(),
            required: rules.total_players,
        });
    }

    let counts = role_counts(players);
    for (role, count) in counts.iter() {
        let min = rules.bounds(role).min;
        if count < min {
            issues.push(TeamIssue::BelowMinimum { role, min, count });
        }
    }
    for (role, count) in counts.iter() {
        let max = rules.bounds(role).max;
        if count > max {
            issues.push(TeamIssue::AboveMaximum { role, max, count });
        }
    }

    issues
}

/// Whether the roster has the full squad with every role inside its bounds.
pub fn is_complete(players: &[Player], rules: &TeamRules) -> bool {
    players.len() == rules.total_players
        && role_counts(players)
            .iter()
            .all(|(role, count)| rules.bounds(role).contains(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u64, team: &str, role: Role, credit: f64) -> Player {
        Player {
            id,
            player_id: String::new(),
            name: format!("Player {id}"),
            short_name: String::new(),
            team_name: String::new(),
            team_short_name: team.to_string(),
            team_id: 0,
            role,
            credit,
            points: 0.0,
            country: String::new(),
            is_playing: true,
        }
    }

    /// Build a squad with the given (WK, BAT, AR, BOWL) distribution,
    /// alternating real teams so the per-team cap never interferes.
    fn squad(wk: usize, bat: usize, ar: usize, bowl: usize) -> Vec<Player> {
        let mut out = Vec::new();
        let mut id = 1;
        for (role, n) in [
            (Role::WicketKeeper, wk),
            (Role::Batsman, bat),
            (Role::AllRounder, ar),
            (Role::Bowler, bowl),
        ] {
            for _ in 0..n {
                let team = if id % 2 == 0 { "IND" } else { "AUS" };
                out.push(p(id, team, role, 8.0));
                id += 1;
            }
        }
        out
    }

    #[test]
    fn role_counts_default_to_zero() {
        let counts = role_counts(&[]);
        for role in Role::ALL {
            assert_eq!(counts.get(role), 0);
        }
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn role_counts_serialize_as_role_map() {
        let json = serde_json::to_value(role_counts(&squad(1, 4, 3, 3))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"WK": 1, "BAT": 4, "AR": 3, "BOWL": 3})
        );
    }

    #[test]
    fn role_counts_tally_each_role() {
        let counts = role_counts(&squad(1, 4, 3, 3));
        assert_eq!(counts.get(Role::WicketKeeper), 1);
        assert_eq!(counts.get(Role::Batsman), 4);
        assert_eq!(counts.get(Role::AllRounder), 3);
        assert_eq!(counts.get(Role::Bowler), 3);
        assert_eq!(counts.total(), 11);
    }

    #[test]
    fn credits_used_and_left() {
        let rules = TeamRules::default();
        let players = vec![
            p(1, "IND", Role::Batsman, 9.5),
            p(2, "AUS", Role::Bowler, 8.0),
        ];
        assert!((credits_used(&players) - 17.5).abs() < f64::EPSILON);
        assert!((credits_left(&players, &rules) - 82.5).abs() < f64::EPSILON);
    }

    #[test]
    fn can_add_to_empty_roster() {
        let rules = TeamRules::default();
        assert_eq!(can_add(&[], &p(1, "IND", Role::Batsman, 10.0), &rules), Ok(()));
    }

    #[test]
    fn rejects_when_full() {
        let rules = TeamRules::default();
        let players = squad(1, 4, 3, 3);
        let err = can_add(&players, &p(99, "NZ", Role::Batsman, 1.0), &rules).unwrap_err();
        assert_eq!(err, RejectReason::RosterFull { max: 11 });
        assert_eq!(err.code(), "ROSTER_FULL");
        assert_eq!(err.to_string(), "Team is full");
    }

    #[test]
    fn rejects_over_budget() {
        let rules = TeamRules::default();
        // 10 players worth 99.0 credits in total.
        let mut players: Vec<Player> = squad(1, 3, 3, 3)
            .into_iter()
            .map(|mut pl| {
                pl.credit = 9.5;
                pl
            })
            .collect();
        players[0].credit = 13.5;
        assert_eq!(players.len(), 10);
        assert_eq!(credits_used(&players), 99.0);

        let candidate = p(99, "NZ", Role::Batsman, 1.5);
        let err = can_add(&players, &candidate, &rules).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_CREDITS");
        assert_eq!(err.to_string(), "Not enough credits");

        // Exactly hitting the budget is allowed.
        let exact = p(100, "NZ", Role::Batsman, 1.0);
        assert_eq!(can_add(&players, &exact, &rules), Ok(()));
    }

    #[test]
    fn tenth_step_credits_can_fill_the_budget_exactly() {
        let rules = TeamRules::default();
        let credits = [9.6, 10.0, 9.8, 10.0, 9.3, 8.6, 9.5, 7.4, 8.6, 9.4];
        let players: Vec<Player> = squad(1, 3, 3, 3)
            .into_iter()
            .zip(credits)
            .map(|(mut pl, c)| {
                pl.credit = c;
                pl
            })
            .collect();
        // 92.2 on paper, a hair above in f64.
        let candidate = p(99, "NZ", Role::Batsman, 7.8);
        assert!(credits_used(&players) + candidate.credit > 100.0);
        assert_eq!(can_add(&players, &candidate, &rules), Ok(()));

        let over = p(100, "NZ", Role::Batsman, 7.9);
        assert!(matches!(
            can_add(&players, &over, &rules),
            Err(RejectReason::InsufficientCredits { .. })
        ));
    }

    #[test]
    fn rejects_eighth_player_from_one_team() {
        let rules = TeamRules::default();
        let players: Vec<Player> = (1..=7)
            .map(|id| {
                let role = if id <= 3 { Role::Batsman } else { Role::Bowler };
                p(id, "IND", role, 5.0)
            })
            .collect();
        let err = can_add(&players, &p(8, "IND", Role::AllRounder, 5.0), &rules).unwrap_err();
        assert_eq!(
            err,
            RejectReason::TeamCapExceeded {
                team: "IND".into(),
                max: 7
            }
        );
        assert_eq!(err.to_string(), "Max 7 players from one team");

        // Other team still fine.
        assert_eq!(can_add(&players, &p(9, "AUS", Role::AllRounder, 5.0), &rules), Ok(()));
    }

    #[test]
    fn rejects_sixth_wicket_keeper() {
        let rules = TeamRules::default();
        let players = squad(5, 0, 0, 0);
        let err = can_add(&players, &p(99, "NZ", Role::WicketKeeper, 5.0), &rules).unwrap_err();
        assert_eq!(
            err,
            RejectReason::RoleCapExceeded {
                role: Role::WicketKeeper,
                max: 5
            }
        );
        assert_eq!(err.code(), "ROLE_CAP_EXCEEDED");
        assert_eq!(err.to_string(), "Max wicket-keepers reached");
    }

    #[test]
    fn check_order_full_before_credits() {
        let rules = TeamRules::default();
        let players = squad(1, 4, 3, 3);
        // Over budget too, but fullness is reported first.
        let err = can_add(&players, &p(99, "NZ", Role::Batsman, 50.0), &rules).unwrap_err();
        assert_eq!(err.code(), "ROSTER_FULL");
    }

    #[test]
    fn check_order_credits_before_team_cap() {
        let rules = TeamRules::default();
        let players: Vec<Player> = (1..=7).map(|id| p(id, "IND", Role::Bowler, 5.0)).collect();
        let err = can_add(&players, &p(8, "IND", Role::Bowler, 70.0), &rules).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_CREDITS");
    }

    #[test]
    fn check_order_team_cap_before_role_cap() {
        let rules = TeamRules::default();
        let players: Vec<Player> = (1..=7).map(|id| p(id, "IND", Role::Bowler, 5.0)).collect();
        let err = can_add(&players, &p(8, "IND", Role::Bowler, 5.0), &rules).unwrap_err();
        assert_eq!(err.code(), "TEAM_CAP_EXCEEDED");
    }

    #[test]
    fn below_minimum_does_not_block_adds() {
        let rules = TeamRules::default();
        // No keeper yet, ten slots filled with batsmen/bowlers: still addable.
        let players = squad(0, 5, 0, 5);
        assert_eq!(can_add(&players, &p(99, "NZ", Role::Bowler, 1.0), &rules), Ok(()));
    }

    #[test]
    fn is_complete_distribution_table() {
        let rules = TeamRules::default();
        let cases: &[((usize, usize, usize, usize), bool)] = &[
            ((1, 3, 0, 7), true),
            ((1, 4, 3, 3), true),
            ((5, 3, 0, 3), true),
            ((1, 3, 4, 3), true),
            ((0, 4, 3, 4), false), // no keeper
            ((1, 2, 4, 4), false), // too few batsmen
            ((1, 3, 5, 2), false), // too many all-rounders, too few bowlers
            ((6, 3, 0, 2), false), // too many keepers
            ((1, 3, 0, 6), false), // only 10 players
            ((1, 4, 3, 4), false), // 12 players
        ];
        for &((wk, bat, ar, bowl), expected) in cases {
            let players = squad(wk, bat, ar, bowl);
            assert_eq!(
                is_complete(&players, &rules),
                expected,
                "distribution WK={wk} BAT={bat} AR={ar} BOWL={bowl}"
            );
            assert_eq!(
                completeness_issues(&players, &rules).is_empty(),
                expected,
                "issues disagree for WK={wk} BAT={bat} AR={ar} BOWL={bowl}"
            );
        }
    }

    #[test]
    fn completeness_issues_name_each_failed_rule() {
        let rules = TeamRules::default();
        let issues = completeness_issues(&squad(0, 2, 5, 3), &rules);
        assert_eq!(
            issues,
            vec![
                TeamIssue::WrongPlayerCount {
                    selected: 10,
                    required: 11
                },
                TeamIssue::BelowMinimum {
                    role: Role::WicketKeeper,
                    min: 1,
                    count: 0
                },
                TeamIssue::BelowMinimum {
                    role: Role::Batsman,
                    min: 3,
                    count: 2
                },
                TeamIssue::AboveMaximum {
                    role: Role::AllRounder,
                    max: 4,
                    count: 5
                },
            ]
        );
        assert_eq!(
            issues[0].to_string(),
            "Please select exactly 11 players. Currently selected: 10"
        );
        assert_eq!(issues[1].to_string(), "Minimum 1 wicket-keepers required, 0 selected");
    }

    #[test]
    fn team_counts_group_by_real_team() {
        let players = vec![
            p(1, "IND", Role::Batsman, 8.0),
            p(2, "AUS", Role::Bowler, 8.0),
            p(3, "IND", Role::Bowler, 8.0),
        ];
        let counts = team_counts(&players);
        assert_eq!(counts.get("IND"), Some(&2));
        assert_eq!(counts.get("AUS"), Some(&1));
        assert_eq!(team_count(&players, "NZ"), 0);
    }
}
