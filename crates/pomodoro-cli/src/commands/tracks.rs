use pomodoro_core::sound::available_tracks;
use pomodoro_core::storage::sounds_dir;
use pomodoro_core::Config;

use super::CmdResult;

pub fn run() -> CmdResult {
    let dir = sounds_dir()?;
    let tracks = available_tracks(&dir);
    if tracks.is_empty() {
        println!("No tracks found in {}", dir.display());
        return Ok(());
    }

    let sound = Config::load()?.sound;
    for track in tracks {
        let mut tags = Vec::new();
        if sound.ambient_track.as_deref() == Some(track.as_str()) {
            tags.push("ambient");
        }
        if sound.finish_tone.as_deref() == Some(track.as_str()) {
            tags.push("finish tone");
        }
        if tags.is_empty() {
            println!("{track}");
        } else {
            println!("{track}  ({})", tags.join(", "));
        }
    }
    Ok(())
}
