use chrono::Local;
use clap::Args;
use pomodoro_core::storage::Database;
use pomodoro_core::SessionRecord;

use super::CmdResult;

#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of sessions to show
    #[arg(long, short = 'n', default_value = "20")]
    limit: usize,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: HistoryArgs) -> CmdResult {
    let db = Database::open()?;
    let sessions = db.recent(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else {
        print_sessions(&sessions);
    }
    Ok(())
}

/// One line per session, in the order given.
pub fn print_sessions(sessions: &[SessionRecord]) {
    if sessions.is_empty() {
        println!("No sessions yet.");
        return;
    }
    for session in sessions {
        println!("{}", format_session(session));
    }
}

fn format_session(session: &SessionRecord) -> String {
    let start = session.start_time.with_timezone(&Local);
    let end = session.end_time.with_timezone(&Local);
    format!(
        "#{:<5} {} - {}  {:<11} {:>3} min",
        session.id,
        start.format("%Y-%m-%d %H:%M"),
        end.format("%H:%M"),
        session.mode.label(),
        session.duration_minutes,
    )
}
