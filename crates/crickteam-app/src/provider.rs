// Match and player sources.
//
// Providers never fail outward: any read or parse problem is logged and
// surfaces as an empty list, which callers treat as "nothing available".

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crickteam_core::config::Config;
use crickteam_core::player::{Match, MatchId, Player};

#[async_trait]
pub trait MatchProvider: Send + Sync {
    async fn fetch_matches(&self) -> Vec<Match>;
}

#[async_trait]
pub trait PlayerProvider: Send + Sync {
    async fn fetch_players(&self, match_id: MatchId) -> Vec<Player>;
}

// ---------------------------------------------------------------------------
// FileProvider
// ---------------------------------------------------------------------------

/// Reads the match list from a JSON file and per-match player lists from
/// `<players_dir>/<match_id>.json` or `<players_dir>/<match_id>.csv`.
#[derive(Debug, Clone)]
pub struct FileProvider {
    matches_path: PathBuf,
    players_dir: PathBuf,
}

impl FileProvider {
    pub fn new(matches_path: impl Into<PathBuf>, players_dir: impl Into<PathBuf>) -> Self {
        FileProvider {
            matches_path: matches_path.into(),
            players_dir: players_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.matches_path(), config.players_dir())
    }

    async fn read_matches(&self) -> anyhow::Result<Vec<Match>> {
        let text = tokio::fs::read_to_string(&self.matches_path)
            .await
            .with_context(|| format!("failed to read {}", self.matches_path.display()))?;
        parse_matches(&text)
    }

    async fn read_players(&self, match_id: MatchId) -> anyhow::Result<Vec<Player>> {
        let json_path = self.players_dir.join(format!("{match_id}.json"));
        if tokio::fs::try_exists(&json_path).await.unwrap_or(false) {
            let text = tokio::fs::read_to_string(&json_path)
                .await
                .with_context(|| format!("failed to read {}", json_path.display()))?;
            return parse_players_json(&text);
        }

        let csv_path = self.players_dir.join(format!("{match_id}.csv"));
        let bytes = tokio::fs::read(&csv_path)
            .await
            .with_context(|| format!("failed to read {}", csv_path.display()))?;
        parse_players_csv(&bytes, &csv_path)
    }
}

#[async_trait]
impl MatchProvider for FileProvider {
    async fn fetch_matches(&self) -> Vec<Match> {
        match self.read_matches().await {
            Ok(matches) => {
                debug!(count = matches.len(), "matches loaded");
                matches
            }
            Err(e) => {
                warn!("Error fetching matches: {e:#}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl PlayerProvider for FileProvider {
    async fn fetch_players(&self, match_id: MatchId) -> Vec<Player> {
        match self.read_players(match_id).await {
            Ok(players) => {
                let players = dedup_players(players);
                debug!(match_id, count = players.len(), "players loaded");
                players
            }
            Err(e) => {
                warn!(match_id, "Error fetching players: {e:#}");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Accepts either a bare array or the feed envelope `{"matches": {"cricket": [...]}}`.
fn parse_matches(text: &str) -> anyhow::Result<Vec<Match>> {
    let value: Value = serde_json::from_str(text).context("matches file is not valid JSON")?;
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut obj) => match obj
            .remove("matches")
            .and_then(|mut m| m.get_mut("cricket").map(Value::take))
        {
            Some(list @ Value::Array(_)) => list,
            _ => bail!("matches file has no `matches.cricket` array"),
        },
        _ => bail!("matches file must hold an array or an object"),
    };
    serde_json::from_value(list).context("failed to decode match list")
}

/// Player arrays are decoded entry by entry so one malformed player (say, an
/// unknown role) drops only that entry.
fn parse_players_json(text: &str) -> anyhow::Result<Vec<Player>> {
    let value: Value = serde_json::from_str(text).context("players file is not valid JSON")?;
    let Value::Array(entries) = value else {
        bail!("players file must hold an array");
    };
    let mut players = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Player>(entry) {
            Ok(p) => players.push(p),
            Err(e) => warn!(idx, "skipping player entry: {e}"),
        }
    }
    Ok(players)
}

fn parse_players_csv(bytes: &[u8], path: &Path) -> anyhow::Result<Vec<Player>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut players = Vec::new();
    for (idx, row) in reader.deserialize::<Player>().enumerate() {
        match row {
            Ok(p) => players.push(p),
            Err(e) => warn!(path = %path.display(), row = idx + 1, "skipping player row: {e}"),
        }
    }
    Ok(players)
}

/// Keep the first occurrence of each player id.
fn dedup_players(players: Vec<Player>) -> Vec<Player> {
    let mut seen = HashSet::new();
    players
        .into_iter()
        .filter(|p| {
            let fresh = seen.insert(p.id);
            if !fresh {
                warn!(player_id = p.id, "duplicate player in feed, keeping first");
            }
            fresh
        })
        .collect()
}
