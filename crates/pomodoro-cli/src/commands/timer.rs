use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pomodoro_core::sound::{available_tracks, SinkResult};
use pomodoro_core::storage::{sounds_dir, Database};
use pomodoro_core::{
    ConfigFile, Preferences, SessionLog, SessionRecord, SnapshotWatcher, SoundDirector, SoundSink,
    TimerMode, TimerService, TimerSnapshot,
};
use tokio::sync::{mpsc, watch};

use super::history::print_sessions;
use super::CmdResult;

const HISTORY_LINES: usize = 10;

const HELP: &str = "\
commands:
  s, space, <enter>   start / pause
  r                   reset
  w, short, long      switch mode (also: m <mode>)
  h                   recent sessions
  q                   quit";

#[derive(Args)]
pub struct TimerArgs {
    /// Mode to start in: work, short or long
    #[arg(long, short = 'm', default_value = "work")]
    mode: TimerMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Toggle,
    Reset,
    Mode(TimerMode),
    History,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        if line.trim().is_empty() {
            return Ok(Command::Toggle);
        }
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default().to_ascii_lowercase();
        match head.as_str() {
            "s" | "space" | "start" | "pause" => Ok(Command::Toggle),
            "r" | "reset" => Ok(Command::Reset),
            "w" => Ok(Command::Mode(TimerMode::Work)),
            "h" | "history" => Ok(Command::History),
            "?" | "help" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            "m" | "mode" => {
                let name = words.next().ok_or("usage: m <work|short|long>")?;
                name.parse().map(Command::Mode).map_err(|e| e.to_string())
            }
            other => other
                .parse()
                .map(Command::Mode)
                .map_err(|_| format!("unknown command: {other} (? for help)")),
        }
    }
}

/// Finish tone as the terminal bell; ambient cues only go to the log.
struct TerminalSink {
    sounds: Option<PathBuf>,
}

impl TerminalSink {
    fn check_track(&self, track: Option<&str>) -> SinkResult {
        let (Some(track), Some(dir)) = (track, &self.sounds) else {
            return Ok(());
        };
        if available_tracks(dir).iter().any(|t| t == track) {
            Ok(())
        } else {
            Err(format!("track {track} not found in {}", dir.display()).into())
        }
    }
}

impl SoundSink for TerminalSink {
    fn start_ambient(&mut self, track: Option<&str>) -> SinkResult {
        self.check_track(track)?;
        tracing::info!(track = track.unwrap_or("default"), "ambient sound started");
        Ok(())
    }

    fn stop_ambient(&mut self) -> SinkResult {
        tracing::info!("ambient sound stopped");
        Ok(())
    }

    fn play_finish_tone(&mut self, track: Option<&str>) -> SinkResult {
        let checked = self.check_track(track);
        let mut out = std::io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        checked
    }
}

pub fn run(args: TimerArgs) -> CmdResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(interactive(args.mode))
}

async fn interactive(mode: TimerMode) -> CmdResult {
    let db = Database::open()?;
    let prefs: Arc<dyn Preferences> = Arc::new(ConfigFile::open()?);
    let timer = TimerService::new(SessionLog::new(Arc::new(db)), prefs.clone());
    if mode != TimerMode::default() {
        timer.change_mode(mode).await;
    }

    let sink = TerminalSink {
        sounds: sounds_dir().ok(),
    };
    let sound = tokio::spawn(SoundDirector::new(sink, prefs).run(timer.observe_snapshot().await));
    let display = tokio::spawn(render(timer.observe_snapshot().await));
    let history = follow_history(&timer);

    println!("{HELP}");
    let mut lines = read_stdin_lines();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut interrupt => None,
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Ok(Command::Toggle) => {
                if timer.start_or_toggle().await.is_none() {
                    clear_line();
                    println!("Interval finished; reset or switch mode to start again.");
                }
            }
            Ok(Command::Reset) => {
                timer.reset().await;
            }
            Ok(Command::Mode(mode)) => {
                timer.change_mode(mode).await;
            }
            Ok(Command::History) => {
                clear_line();
                let recent: Vec<SessionRecord> =
                    history.borrow().iter().take(HISTORY_LINES).cloned().collect();
                print_sessions(&recent);
            }
            Ok(Command::Help) => {
                clear_line();
                println!("{HELP}");
            }
            Ok(Command::Quit) => break,
            Err(message) => {
                clear_line();
                println!("{message}");
            }
        }
        redraw(&timer.snapshot().await);
    }

    // The last handle going away closes every snapshot watcher.
    drop(timer);
    if let Err(e) = sound.await {
        tracing::warn!(error = %e, "sound task failed");
    }
    if let Err(e) = display.await {
        tracing::warn!(error = %e, "display task failed");
    }
    println!();
    Ok(())
}

/// Stdin lines from a plain thread, so a pending read never holds up
/// runtime shutdown. The thread is left blocked in `read` on exit.
fn read_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    break;
                }
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Keep the newest session list from the live query.
fn follow_history(timer: &TimerService) -> watch::Receiver<Vec<SessionRecord>> {
    let (tx, rx) = watch::channel(Vec::new());
    let mut live = timer.observe_sessions();
    tokio::spawn(async move {
        loop {
            match live.next().await {
                Ok(sessions) => {
                    if tx.send(sessions).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "session history unavailable");
                    return;
                }
            }
        }
    });
    rx
}

async fn render(mut watcher: SnapshotWatcher) {
    while let Some(snapshot) = watcher.recv().await {
        redraw(&snapshot);
        if snapshot.is_exhausted() {
            println!();
            println!("{} complete.", snapshot.mode.label());
        }
    }
}

fn status_line(snapshot: &TimerSnapshot) -> String {
    let state = if snapshot.running {
        "running"
    } else if snapshot.is_exhausted() {
        "done"
    } else {
        "paused"
    };
    format!(
        "{:<11} {}  [{state}]",
        snapshot.mode.label(),
        snapshot.format_remaining()
    )
}

fn redraw(snapshot: &TimerSnapshot) {
    clear_line();
    print!("{}", status_line(snapshot));
    let _ = std::io::stdout().flush();
}

fn clear_line() {
    print!("\r\x1b[2K");
}
