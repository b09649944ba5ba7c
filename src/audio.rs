//! Sound cue routing
//!
//! The simulation only names cues. Synthesis happens behind `AudioBackend`,
//! so a host can plug in whatever sound system it has.

use serde::{Deserialize, Serialize};

/// Sound table indexed by a shape's sound special
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Start the title track
    TitleMusic,
    /// Start the boss track
    BossMusic,
    /// Stop whatever track is playing
    StopMusic,
    Title,
    Door,
    Killed,
    Trigger,
    Bite,
    SlimeChase,
    LavaRise,
    Stomp,
    Clock,
    Ghost,
    Ball,
    Wind,
    Bridge,
}

/// Looping background tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicTrack {
    Title,
    Boss,
}

/// What routing a cue amounts to
#[derive(Debug, Clone, Copy, PartialEq)]
enum CueAction {
    Music(MusicTrack),
    StopMusic,
    Effect,
}

impl SoundCue {
    pub const ALL: [SoundCue; 16] = [
        SoundCue::TitleMusic,
        SoundCue::BossMusic,
        SoundCue::StopMusic,
        SoundCue::Title,
        SoundCue::Door,
        SoundCue::Killed,
        SoundCue::Trigger,
        SoundCue::Bite,
        SoundCue::SlimeChase,
        SoundCue::LavaRise,
        SoundCue::Stomp,
        SoundCue::Clock,
        SoundCue::Ghost,
        SoundCue::Ball,
        SoundCue::Wind,
        SoundCue::Bridge,
    ];

    /// Cue for a sound index, `None` past the end of the table
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Playback volume (0.0 - 1.0) before user settings are applied
    pub fn volume(self) -> f32 {
        match self {
            SoundCue::TitleMusic => 0.7,
            SoundCue::BossMusic => 0.4,
            SoundCue::StopMusic => 0.0,
            SoundCue::Wind | SoundCue::Bridge => 0.2,
            _ => 0.75,
        }
    }

    /// Overlapping instances an effect may have in flight
    pub fn voices(self) -> usize {
        match self {
            SoundCue::Ghost | SoundCue::Ball => 3,
            _ => 1,
        }
    }

    pub fn is_music(self) -> bool {
        self.action() != CueAction::Effect
    }

    fn action(self) -> CueAction {
        match self {
            SoundCue::TitleMusic => CueAction::Music(MusicTrack::Title),
            SoundCue::BossMusic => CueAction::Music(MusicTrack::Boss),
            SoundCue::StopMusic => CueAction::StopMusic,
            _ => CueAction::Effect,
        }
    }
}

/// Sound output implemented by the host
pub trait AudioBackend {
    /// Fire a one-shot effect
    fn play_effect(&mut self, cue: SoundCue, volume: f32);
    /// Start a looping track from the beginning
    fn start_music(&mut self, track: MusicTrack, volume: f32);
    fn stop_music(&mut self, track: MusicTrack);
}

/// Backend that only writes cues to the log (headless runs)
#[derive(Debug, Default)]
pub struct LogBackend {
    pub effects_played: usize,
    pub tracks_started: usize,
}

impl AudioBackend for LogBackend {
    fn play_effect(&mut self, cue: SoundCue, volume: f32) {
        self.effects_played += 1;
        log::debug!("sfx {:?} at {:.2}", cue, volume);
    }

    fn start_music(&mut self, track: MusicTrack, volume: f32) {
        self.tracks_started += 1;
        log::info!("Music {:?} started at {:.2}", track, volume);
    }

    fn stop_music(&mut self, track: MusicTrack) {
        log::info!("Music {:?} stopped", track);
    }
}

/// Audio manager for the game
pub struct AudioManager<B: AudioBackend> {
    backend: B,
    /// Track selected last, kept while muted so it can resume
    current: Option<MusicTrack>,
    playing: bool,
    music_volume: f32,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: None,
            playing: false,
            music_volume: 0.5,
            master_volume: 1.0,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn current_music(&self) -> Option<MusicTrack> {
        self.current
    }

    pub fn music_playing(&self) -> bool {
        self.playing
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Route a cue to the backend
    pub fn play(&mut self, cue: SoundCue) {
        match cue.action() {
            CueAction::Music(track) => {
                self.music_volume = cue.volume();
                self.play_music(track);
            }
            CueAction::StopMusic => self.stop_music(true),
            CueAction::Effect => {
                if !self.muted {
                    let volume = cue.volume() * self.sfx_volume * self.master_volume;
                    self.backend.play_effect(cue, volume);
                }
            }
        }
    }

    /// Mute stops the track but remembers it; unmute resumes it
    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        if muted {
            self.stop_music(false);
        } else if let Some(track) = self.current {
            self.play_music(track);
        }
    }

    fn play_music(&mut self, track: MusicTrack) {
        if self.current == Some(track) && self.playing {
            return;
        }
        self.stop_music(true);
        self.current = Some(track);
        if !self.muted {
            self.backend
                .start_music(track, self.music_volume * self.master_volume);
            self.playing = true;
        }
    }

    fn stop_music(&mut self, clear: bool) {
        let Some(track) = self.current else { return };
        if self.playing {
            self.backend.stop_music(track);
        }
        if clear {
            self.current = None;
        }
        self.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Effect(SoundCue),
        Start(MusicTrack),
        Stop(MusicTrack),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl AudioBackend for Recorder {
        fn play_effect(&mut self, cue: SoundCue, _volume: f32) {
            self.calls.push(Call::Effect(cue));
        }

        fn start_music(&mut self, track: MusicTrack, _volume: f32) {
            self.calls.push(Call::Start(track));
        }

        fn stop_music(&mut self, track: MusicTrack) {
            self.calls.push(Call::Stop(track));
        }
    }

    #[test]
    fn test_table_order() {
        assert_eq!(SoundCue::from_index(0), Some(SoundCue::TitleMusic));
        assert_eq!(SoundCue::from_index(5), Some(SoundCue::Killed));
        assert_eq!(SoundCue::from_index(15), Some(SoundCue::Bridge));
        assert_eq!(SoundCue::from_index(16), None);
        for (i, cue) in SoundCue::ALL.iter().enumerate() {
            assert_eq!(cue.index() as usize, i);
        }
    }

    #[test]
    fn test_volumes() {
        assert_eq!(SoundCue::TitleMusic.volume(), 0.7);
        assert_eq!(SoundCue::Wind.volume(), 0.2);
        assert_eq!(SoundCue::Door.volume(), 0.75);
        assert_eq!(SoundCue::Ghost.voices(), 3);
        assert!(SoundCue::StopMusic.is_music());
        assert!(!SoundCue::Stomp.is_music());
    }

    #[test]
    fn test_same_track_is_not_restarted() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.play(SoundCue::TitleMusic);
        audio.play(SoundCue::TitleMusic);
        audio.play(SoundCue::BossMusic);
        assert_eq!(
            audio.backend().calls,
            vec![
                Call::Start(MusicTrack::Title),
                Call::Stop(MusicTrack::Title),
                Call::Start(MusicTrack::Boss),
            ]
        );
        audio.play(SoundCue::StopMusic);
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn test_mute_keeps_track_and_resumes() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.play(SoundCue::BossMusic);
        audio.toggle_mute();
        assert!(audio.is_muted());
        assert_eq!(audio.current_music(), Some(MusicTrack::Boss));
        assert!(!audio.music_playing());

        // Effects are dropped while muted
        audio.play(SoundCue::Door);
        audio.toggle_mute();
        assert!(audio.music_playing());
        assert_eq!(
            audio.backend().calls,
            vec![
                Call::Start(MusicTrack::Boss),
                Call::Stop(MusicTrack::Boss),
                Call::Start(MusicTrack::Boss),
            ]
        );
    }

    #[test]
    fn test_music_selected_while_muted_starts_on_unmute() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.set_muted(true);
        audio.play(SoundCue::TitleMusic);
        assert!(audio.backend().calls.is_empty());
        audio.set_muted(false);
        assert_eq!(audio.backend().calls, vec![Call::Start(MusicTrack::Title)]);
    }

    #[test]
    fn test_effects_reach_backend() {
        let mut audio = AudioManager::new(LogBackend::default());
        audio.play(SoundCue::Killed);
        audio.play(SoundCue::Trigger);
        assert_eq!(audio.backend().effects_played, 2);
        assert_eq!(audio.backend().tracks_started, 0);
    }
}
