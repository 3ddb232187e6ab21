use clap::Subcommand;
use pomodoro_core::storage::Database;

use super::CmdResult;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats (UTC day)
    Today,
    /// All-time stats
    All,
}

pub fn run(action: StatsAction) -> CmdResult {
    let db = Database::open()?;

    let stats = match action {
        StatsAction::Today => db.stats_today()?,
        StatsAction::All => db.stats_all()?,
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
