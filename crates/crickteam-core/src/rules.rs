// Team-composition rules: squad size, credit budget, per-team cap, role quotas.

use serde::{Deserialize, Serialize};

use crate::player::Role;

/// Inclusive `[min, max]` count for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBounds {
    pub min: usize,
    pub max: usize,
}

impl RoleBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        RoleBounds { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

/// Per-role quotas. Keys in rules.toml are `wicket_keeper`, `batsman`,
/// `all_rounder` and `bowler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLimits {
    pub wicket_keeper: RoleBounds,
    pub batsman: RoleBounds,
    pub all_rounder: RoleBounds,
    pub bowler: RoleBounds,
}

impl RoleLimits {
    pub fn bounds(&self, role: Role) -> RoleBounds {
        match role {
            Role::WicketKeeper => self.wicket_keeper,
            Role::Batsman => self.batsman,
            Role::AllRounder => self.all_rounder,
            Role::Bowler => self.bowler,
        }
    }
}

impl Default for RoleLimits {
    fn default() -> Self {
        RoleLimits {
            wicket_keeper: RoleBounds::new(1, 5),
            batsman: RoleBounds::new(3, 7),
            all_rounder: RoleBounds::new(0, 4),
            bowler: RoleBounds::new(3, 7),
        }
    }
}

/// The constraint table every roster is checked against.
///
/// Loaded once at startup and shared read-only; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRules {
    pub total_players: usize,
    pub max_credits: f64,
    pub max_per_real_team: usize,
    pub roles: RoleLimits,
}

impl TeamRules {
    pub fn bounds(&self, role: Role) -> RoleBounds {
        self.roles.bounds(role)
    }
}

impl Default for TeamRules {
    fn default() -> Self {
        TeamRules {
            total_players: 11,
            max_credits: 100.0,
            max_per_real_team: 7,
            roles: RoleLimits::default(),
        }
    }
}
