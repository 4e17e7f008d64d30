// crickteam entry point.
//
// Usage:
//   crickteam                          list matches
//   crickteam <match_id>               list the match's players
//   crickteam <match_id> <ids...>      build and save a team; the first id
//                                      captains, the second is vice-captain
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build providers and the session
// 4. Run the requested command

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crickteam_app::notify::TracingNotifier;
use crickteam_app::provider::FileProvider;
use crickteam_app::session::Session;
use crickteam_core::config;
use crickteam_core::player::{MatchId, PlayerId, Role};

const DEFAULT_LOG_FILTER: &str = "crickteam=info,crickteam_core=info,crickteam_app=info,warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("crickteam starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} players, {} credits, entry fee {}",
        config.rules.total_players, config.rules.max_credits, config.contest.entry_fee
    );

    let provider = Arc::new(FileProvider::from_config(&config));
    let mut session = Session::new(
        config.rules.clone(),
        config.contest.clone(),
        provider.clone(),
        provider,
        Arc::new(TracingNotifier),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((match_arg, player_args)) = args.split_first() else {
        list_matches(&mut session).await;
        return Ok(());
    };

    let match_id: MatchId = match_arg
        .parse()
        .with_context(|| format!("invalid match id `{match_arg}`"))?;
    session.load_matches().await;
    let selected = session
        .select_match(match_id)
        .await
        .context("failed to select match")?;
    println!(
        "{} vs {} ({})",
        selected.t1_short_name, selected.t2_short_name, selected.match_name
    );

    if player_args.is_empty() {
        list_players(&session);
        return Ok(());
    }

    let ids = player_args
        .iter()
        .map(|s| {
            s.parse::<PlayerId>()
                .with_context(|| format!("invalid player id `{s}`"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    build_team(&mut session, &ids)
}

async fn list_matches(session: &mut Session) {
    let matches = session.load_matches().await;
    if matches.is_empty() {
        println!("No matches available.");
        return;
    }
    for m in matches {
        println!(
            "{:>8}  {:<4} vs {:<4}  {:<24} {}",
            m.id, m.t1_short_name, m.t2_short_name, m.match_name, m.match_date
        );
    }
}

fn list_players(session: &Session) {
    if session.players().is_empty() {
        println!("No players available.");
        return;
    }
    for role in Role::ALL {
        println!("\n{}", role.display_str());
        for p in session.players().iter().filter(|p| p.role == role) {
            println!(
                "{:>8}  {:<24} {:<4} {:>5.1} cr {:>6.1} pts",
                p.id, p.name, p.team_short_name, p.credit, p.points
            );
        }
    }
}

fn build_team(session: &mut Session, ids: &[PlayerId]) -> anyhow::Result<()> {
    for &id in ids {
        session
            .toggle_player(id)
            .with_context(|| format!("cannot select player {id}"))?;
    }
    session.validate_selection().context("invalid team")?;

    let [captain, vice_captain, ..] = ids else {
        bail!("a team needs a captain and a vice-captain");
    };
    session.select_captain(*captain).context("invalid captain")?;
    session
        .select_vice_captain(*vice_captain)
        .context("invalid vice-captain")?;

    let team = session.save_team().context("failed to save team")?;
    println!("{}", serde_json::to_string_pretty(&team)?);
    println!(
        "{}: {:.1} credits, {:.1} projected points",
        team.name,
        team.total_credits,
        team.projected_points()
    );
    Ok(())
}

/// Appends to `logs/crickteam.log`; stdout stays reserved for command output.
fn init_tracing() -> anyhow::Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir).context("failed to create logs directory")?;
    let log_path = log_dir.join("crickteam.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to set tracing subscriber: {e}"))
}
