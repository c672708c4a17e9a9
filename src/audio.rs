//! Audio collaborator contract
//!
//! The simulation never plays sound itself. It fires cue names at an
//! [`AudioSink`] and moves on; playback and mixing live in the host.

use std::fmt;
use std::sync::Mutex;

use crate::settings::Settings;

/// Named audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Intro sting at level start
    StageStart,
    /// Brick destroyed
    Brick,
    /// Points awarded
    Score,
    /// Lives exhausted
    GameOver,
    /// Back to the title (menu, or all levels cleared)
    Title,
    /// Ambient loop once the stage intro finishes
    Ambient,
}

impl Cue {
    /// Asset name the host maps to a sound
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::StageStart => "music_stage_start",
            Cue::Brick => "effect_brick",
            Cue::Score => "effect_score",
            Cue::GameOver => "music_gameover",
            Cue::Title => "music_title",
            Cue::Ambient => "ambient_bg",
        }
    }

    /// Which volume slider scales this cue
    pub fn channel(&self) -> CueChannel {
        match self {
            Cue::StageStart | Cue::GameOver | Cue::Title => CueChannel::Music,
            Cue::Brick | Cue::Score => CueChannel::Effect,
            Cue::Ambient => CueChannel::Ambient,
        }
    }
}

/// Volume groups for cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueChannel {
    Music,
    Effect,
    Ambient,
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an audio backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Backend isn't available (no device, not initialized)
    Unavailable,
    /// Backend-specific failure
    Backend(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Unavailable => write!(f, "Audio backend unavailable"),
            AudioError::Backend(msg) => write!(f, "Audio backend error: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {}

/// Fire-and-forget audio commands.
///
/// Called from the simulation thread and from the stage-music timer thread,
/// hence `Send + Sync`. Implementations must not block.
pub trait AudioSink: Send + Sync {
    fn play(&self, cue: Cue);
    fn stop(&self, cue: Cue);
    fn stop_all(&self) -> Result<(), AudioError>;
    fn start_background_alternating(&self);
    fn stop_background_alternating(&self) -> Result<(), AudioError>;
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&self, _cue: Cue) {}
    fn stop(&self, _cue: Cue) {}
    fn stop_all(&self) -> Result<(), AudioError> {
        Ok(())
    }
    fn start_background_alternating(&self) {}
    fn stop_background_alternating(&self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Logs cues with their effective volume (headless hosts)
#[derive(Debug, Clone)]
pub struct LogAudio {
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    ambient_volume: f32,
    muted: bool,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl LogAudio {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            music_volume: settings.music_volume.clamp(0.0, 1.0),
            ambient_volume: settings.ambient_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        }
    }

    /// Get effective volume
    pub fn effective_volume(&self, cue: Cue) -> f32 {
        if self.muted {
            return 0.0;
        }
        let channel = match cue.channel() {
            CueChannel::Music => self.music_volume,
            CueChannel::Effect => self.sfx_volume,
            CueChannel::Ambient => self.ambient_volume,
        };
        self.master_volume * channel
    }
}

impl AudioSink for LogAudio {
    fn play(&self, cue: Cue) {
        let vol = self.effective_volume(cue);
        if vol <= 0.0 {
            return;
        }
        log::debug!("play {cue} (volume {vol:.2})");
    }

    fn stop(&self, cue: Cue) {
        log::debug!("stop {cue}");
    }

    fn stop_all(&self) -> Result<(), AudioError> {
        log::debug!("stop all");
        Ok(())
    }

    fn start_background_alternating(&self) {
        log::debug!("background alternation on");
    }

    fn stop_background_alternating(&self) -> Result<(), AudioError> {
        log::debug!("background alternation off");
        Ok(())
    }
}

/// Recorded audio command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCommand {
    Play(Cue),
    Stop(Cue),
    StopAll,
    StartBackground,
    StopBackground,
}

/// Records every command; stop calls can be made to fail
#[derive(Debug, Default)]
pub struct CueRecorder {
    commands: Mutex<Vec<AudioCommand>>,
    fail_stops: bool,
}

impl CueRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose `stop_all`/`stop_background_alternating` return errors
    pub fn failing() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_stops: true,
        }
    }

    pub fn commands(&self) -> Vec<AudioCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Cues passed to `play`, in order
    pub fn played(&self) -> Vec<Cue> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                AudioCommand::Play(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut c) = self.commands.lock() {
            c.clear();
        }
    }

    fn record(&self, command: AudioCommand) {
        if let Ok(mut c) = self.commands.lock() {
            c.push(command);
        }
    }
}

impl AudioSink for CueRecorder {
    fn play(&self, cue: Cue) {
        self.record(AudioCommand::Play(cue));
    }

    fn stop(&self, cue: Cue) {
        self.record(AudioCommand::Stop(cue));
    }

    fn stop_all(&self) -> Result<(), AudioError> {
        self.record(AudioCommand::StopAll);
        if self.fail_stops {
            Err(AudioError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn start_background_alternating(&self) {
        self.record(AudioCommand::StartBackground);
    }

    fn stop_background_alternating(&self) -> Result<(), AudioError> {
        self.record(AudioCommand::StopBackground);
        if self.fail_stops {
            Err(AudioError::Backend("device lost".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_names() {
        assert_eq!(Cue::StageStart.as_str(), "music_stage_start");
        assert_eq!(Cue::Brick.as_str(), "effect_brick");
        assert_eq!(Cue::Score.as_str(), "effect_score");
        assert_eq!(Cue::GameOver.as_str(), "music_gameover");
        assert_eq!(Cue::Title.as_str(), "music_title");
        assert_eq!(Cue::Ambient.to_string(), "ambient_bg");
    }

    #[test]
    fn test_muted_volume() {
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        let audio = LogAudio::from_settings(&settings);
        assert_eq!(audio.effective_volume(Cue::Brick), 0.0);
        assert_eq!(audio.effective_volume(Cue::Title), 0.0);
    }

    #[test]
    fn test_ambient_has_own_volume() {
        let settings = Settings {
            master_volume: 1.0,
            sfx_volume: 0.9,
            music_volume: 0.5,
            ambient_volume: 0.25,
            ..Settings::default()
        };
        let audio = LogAudio::from_settings(&settings);
        assert_eq!(audio.effective_volume(Cue::Ambient), 0.25);
        assert_eq!(audio.effective_volume(Cue::StageStart), 0.5);
        assert_eq!(audio.effective_volume(Cue::Score), 0.9);

        let silent_ambient = LogAudio::from_settings(&Settings {
            ambient_volume: 0.0,
            ..Settings::default()
        });
        assert_eq!(silent_ambient.effective_volume(Cue::Ambient), 0.0);
        assert!(silent_ambient.effective_volume(Cue::Title) > 0.0);
    }

    #[test]
    fn test_recorder() {
        let rec = CueRecorder::failing();
        rec.play(Cue::Brick);
        assert!(rec.stop_all().is_err());
        assert_eq!(
            rec.commands(),
            vec![AudioCommand::Play(Cue::Brick), AudioCommand::StopAll]
        );
        assert_eq!(rec.played(), vec![Cue::Brick]);
    }
}
