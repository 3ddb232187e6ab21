//! Ambient and finish-tone cues.
//!
//! The core never touches an audio device. [`SoundDirector`] watches timer
//! snapshots, decides which cues fire under the current preferences, and
//! forwards them to a [`SoundSink`]. Sink errors are logged and dropped so a
//! missing track or device never affects the timer.

use std::path::Path;
use std::sync::Arc;

use crate::storage::{Preferences, SoundConfig};
use crate::timer::{SnapshotWatcher, TimerSnapshot};

/// Highest numbered track looked up in the sounds directory.
pub const MAX_TRACKS: u32 = 50;

pub type SinkResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Audio output. `None` as a track means the sink's built-in fallback sound.
pub trait SoundSink: Send {
    fn start_ambient(&mut self, track: Option<&str>) -> SinkResult;
    fn stop_ambient(&mut self) -> SinkResult;
    fn play_finish_tone(&mut self, track: Option<&str>) -> SinkResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundCue {
    StartAmbient(Option<String>),
    StopAmbient,
    FinishTone(Option<String>),
}

/// Cues triggered by moving from `prev` to `next`.
///
/// Entering Running starts ambient (if enabled), leaving it stops ambient,
/// and the countdown reaching zero plays the finish tone (if enabled).
pub fn cues_for(prev: &TimerSnapshot, next: &TimerSnapshot, sound: &SoundConfig) -> Vec<SoundCue> {
    let mut cues = Vec::new();
    if !prev.running && next.running && sound.ambient_enabled {
        cues.push(SoundCue::StartAmbient(non_empty(&sound.ambient_track)));
    }
    if prev.running && !next.running {
        cues.push(SoundCue::StopAmbient);
    }
    if prev.seconds_remaining > 0 && next.seconds_remaining == 0 && sound.finish_tone_enabled {
        cues.push(SoundCue::FinishTone(non_empty(&sound.finish_tone)));
    }
    cues
}

fn non_empty(track: &Option<String>) -> Option<String> {
    track.as_deref().filter(|t| !t.is_empty()).map(str::to_string)
}

/// Drives a [`SoundSink`] from a stream of snapshots.
pub struct SoundDirector<S> {
    sink: S,
    prefs: Arc<dyn Preferences>,
}

impl<S: SoundSink> SoundDirector<S> {
    pub fn new(sink: S, prefs: Arc<dyn Preferences>) -> Self {
        Self { sink, prefs }
    }

    /// Apply the cues for one transition.
    pub fn observe(&mut self, prev: &TimerSnapshot, next: &TimerSnapshot) {
        // Cheap comparison first; preferences are only read on a real change.
        if prev.running == next.running && (prev.seconds_remaining == 0) == (next.seconds_remaining == 0) {
            return;
        }
        for cue in cues_for(prev, next, &self.prefs.sound()) {
            let result = match &cue {
                SoundCue::StartAmbient(track) => self.sink.start_ambient(track.as_deref()),
                SoundCue::StopAmbient => self.sink.stop_ambient(),
                SoundCue::FinishTone(track) => self.sink.play_finish_tone(track.as_deref()),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, ?cue, "sound cue failed");
            }
        }
    }

    /// Follow `watcher` until the timer goes away, then stop ambient.
    pub async fn run(mut self, mut watcher: SnapshotWatcher) -> S {
        let Some(mut prev) = watcher.recv().await else {
            return self.sink;
        };
        while let Some(next) = watcher.recv().await {
            self.observe(&prev, &next);
            prev = next;
        }
        if prev.running {
            if let Err(e) = self.sink.stop_ambient() {
                tracing::warn!(error = %e, "failed to stop ambient sound");
            }
        }
        self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Track ids `track_01`..`track_50` that have a file in `dir`, in order.
///
/// Any extension is accepted. A missing directory yields an empty list.
pub fn available_tracks(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let stems: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            entry
                .path()
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();

    (1..=MAX_TRACKS)
        .map(|i| format!("track_{i:02}"))
        .filter(|name| stems.iter().any(|stem| stem == name))
        .collect()
}
