//! Ambient soundtrack and click feedback.
//!
//! The sequencer only talks to an [`AudioCollaborator`]. [`AudioController`]
//! is the shipped implementation: it keeps the track table, mute flag and
//! playback bookkeeping, and hands the actual decoding and mixing to an
//! [`AudioBackend`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::scene::{SEQUENCE, SceneId};

/// What the scene sequencer needs from the sound system.
pub trait AudioCollaborator {
    /// Switch the looped ambient track to `scene`'s.
    fn play_scene_sound(&mut self, scene: SceneId);
    fn play_click_sound(&mut self);
    fn toggle_mute(&mut self);
    fn is_muted(&self) -> bool;
}

/// Scene tracks loop at half volume, the click is quieter.
pub const SCENE_VOLUME: f32 = 0.5;
pub const CLICK_VOLUME: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackId {
    Scene(SceneId),
    Click,
}

/// One loadable sound.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub path: PathBuf,
    pub volume: f32,
    pub looping: bool,
}

/// Decoding and mixing. Calls are fire-and-forget.
pub trait AudioBackend {
    /// Prepare a track. Returns false if it could not be loaded.
    fn load(&mut self, track: &Track) -> bool;
    /// Start a track from the beginning (or resume a looped one).
    fn play(&mut self, track: TrackId);
    fn stop(&mut self, track: TrackId);
    fn set_muted(&mut self, track: TrackId, muted: bool);
}

/// Backend that only logs what it is asked to do.
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn load(&mut self, track: &Track) -> bool {
        log::debug!(
            "[audio] load {:?} from {} (volume {}, loop {})",
            track.id,
            track.path.display(),
            track.volume,
            track.looping
        );
        true
    }

    fn play(&mut self, track: TrackId) {
        log::debug!("[audio] play {track:?}");
    }

    fn stop(&mut self, track: TrackId) {
        log::debug!("[audio] stop {track:?}");
    }

    fn set_muted(&mut self, track: TrackId, muted: bool) {
        log::debug!("[audio] {track:?} muted={muted}");
    }
}

/// Track table plus playback state over an [`AudioBackend`].
#[derive(Debug)]
pub struct AudioController<B: AudioBackend> {
    backend: B,
    tracks: Vec<Track>,
    playing: HashSet<TrackId>,
    muted: bool,
    loaded: bool,
    current: Option<SceneId>,
}

impl<B: AudioBackend> AudioController<B> {
    /// Build the track table for `sound_dir`. Nothing is loaded until [`load`](Self::load).
    pub fn new(backend: B, sound_dir: impl AsRef<Path>, muted: bool) -> Self {
        let dir = sound_dir.as_ref();
        let mut tracks: Vec<Track> = SEQUENCE
            .iter()
            .map(|&scene| Track {
                id: TrackId::Scene(scene),
                path: dir.join(format!("{}.mp3", scene.key())),
                volume: SCENE_VOLUME,
                looping: true,
            })
            .collect();
        tracks.push(Track {
            id: TrackId::Click,
            path: dir.join("click.mp3"),
            volume: CLICK_VOLUME,
            looping: false,
        });

        Self {
            backend,
            tracks,
            playing: HashSet::new(),
            muted,
            loaded: false,
            current: None,
        }
    }

    /// Hand every track to the backend. Tracks that fail to load are skipped
    /// with a warning; the controller counts as loaded either way.
    pub fn load(&mut self) {
        for track in &self.tracks {
            if !self.backend.load(track) {
                log::warn!("[audio] could not load {}", track.path.display());
                continue;
            }
            if self.muted {
                self.backend.set_muted(track.id, true);
            }
        }
        self.loaded = true;
        log::info!("[audio] {} tracks ready", self.tracks.len());

        // A scene asked for sound before loading finished.
        if let Some(scene) = self.current {
            self.play_scene_sound(scene);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn is_playing(&self, track: TrackId) -> bool {
        self.playing.contains(&track)
    }

    /// Scene whose track should be audible.
    pub fn current_scene(&self) -> Option<SceneId> {
        self.current
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stop every track.
    pub fn stop_all(&mut self) {
        for track in self.playing.drain() {
            self.backend.stop(track);
        }
    }
}

impl<B: AudioBackend> AudioCollaborator for AudioController<B> {
    fn play_scene_sound(&mut self, scene: SceneId) {
        self.current = Some(scene);
        if !self.loaded {
            return;
        }

        let others: Vec<TrackId> = self
            .playing
            .iter()
            .copied()
            .filter(|&id| matches!(id, TrackId::Scene(s) if s != scene))
            .collect();
        for id in others {
            self.backend.stop(id);
            self.playing.remove(&id);
        }

        let id = TrackId::Scene(scene);
        if !self.muted && self.playing.insert(id) {
            self.backend.play(id);
        }
    }

    fn play_click_sound(&mut self) {
        if self.loaded && !self.muted {
            self.backend.play(TrackId::Click);
        }
    }

    fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        log::info!("[audio] {}", if self.muted { "muted" } else { "unmuted" });
        for track in &self.tracks {
            self.backend.set_muted(track.id, self.muted);
        }

        // Navigating while muted never started the current track.
        if !self.muted && self.loaded {
            if let Some(scene) = self.current {
                let id = TrackId::Scene(scene);
                if self.playing.insert(id) {
                    self.backend.play(id);
                }
            }
        }
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recording {
        calls: Vec<String>,
        fail: Option<TrackId>,
    }

    impl AudioBackend for Recording {
        fn load(&mut self, track: &Track) -> bool {
            Some(track.id) != self.fail
        }
        fn play(&mut self, track: TrackId) {
            self.calls.push(format!("play {track:?}"));
        }
        fn stop(&mut self, track: TrackId) {
            self.calls.push(format!("stop {track:?}"));
        }
        fn set_muted(&mut self, track: TrackId, muted: bool) {
            self.calls.push(format!("mute {track:?} {muted}"));
        }
    }

    fn loaded(muted: bool) -> AudioController<Recording> {
        let mut audio = AudioController::new(Recording::default(), "sounds", muted);
        audio.load();
        audio.backend.calls.clear();
        audio
    }

    #[test]
    fn track_table_matches_scenes() {
        let audio = AudioController::new(LogBackend, "assets/sounds", false);
        assert_eq!(audio.tracks().len(), SEQUENCE.len() + 1);
        let solar = &audio.tracks()[2];
        assert_eq!(solar.path, Path::new("assets/sounds/solar-system.mp3"));
        assert!(solar.looping);
        assert_eq!(solar.volume, SCENE_VOLUME);
        let click = audio.tracks().last().map(|t| (t.id, t.volume, t.looping));
        assert_eq!(click, Some((TrackId::Click, CLICK_VOLUME, false)));
    }

    #[test]
    fn nothing_plays_before_loading() {
        let mut audio = AudioController::new(Recording::default(), "sounds", false);
        audio.play_scene_sound(SceneId::Opening);
        audio.play_click_sound();
        assert!(audio.backend().calls.is_empty());

        audio.load();
        assert!(audio.is_playing(TrackId::Scene(SceneId::Opening)));
    }

    #[test]
    fn switching_scenes_stops_the_previous_track() {
        let mut audio = loaded(false);
        audio.play_scene_sound(SceneId::Opening);
        audio.play_scene_sound(SceneId::Earth);
        assert_eq!(
            audio.backend().calls,
            vec!["play Scene(Opening)", "stop Scene(Opening)", "play Scene(Earth)"]
        );
        assert!(!audio.is_playing(TrackId::Scene(SceneId::Opening)));
    }

    #[test]
    fn replaying_the_same_scene_does_not_restart_it() {
        let mut audio = loaded(false);
        audio.play_scene_sound(SceneId::Earth);
        audio.play_scene_sound(SceneId::Earth);
        assert_eq!(audio.backend().calls, vec!["play Scene(Earth)"]);
    }

    #[test]
    fn toggle_mute_twice_restores_state() {
        let mut audio = loaded(false);
        audio.toggle_mute();
        assert!(audio.is_muted());
        audio.toggle_mute();
        assert!(!audio.is_muted());

        let mut audio = loaded(true);
        audio.toggle_mute();
        audio.toggle_mute();
        assert!(audio.is_muted());
    }

    #[test]
    fn muted_controller_stays_silent() {
        let mut audio = loaded(true);
        audio.play_scene_sound(SceneId::MilkyWay);
        audio.play_click_sound();
        assert!(audio.backend().calls.is_empty());
        assert_eq!(audio.current_scene(), Some(SceneId::MilkyWay));
    }

    #[test]
    fn unmute_resumes_current_scene() {
        let mut audio = loaded(true);
        audio.play_scene_sound(SceneId::Universe);
        audio.toggle_mute();
        assert!(audio.is_playing(TrackId::Scene(SceneId::Universe)));
        assert_eq!(
            audio.backend().calls.last().map(String::as_str),
            Some("play Scene(Universe)")
        );
    }

    #[test]
    fn mute_reaches_every_track() {
        let mut audio = loaded(false);
        audio.toggle_mute();
        let mutes = audio
            .backend()
            .calls
            .iter()
            .filter(|c| c.starts_with("mute") && c.ends_with("true"))
            .count();
        assert_eq!(mutes, SEQUENCE.len() + 1);
    }

    #[test]
    fn failed_track_does_not_block_loading() {
        let backend = Recording {
            fail: Some(TrackId::Click),
            ..Recording::default()
        };
        let mut audio = AudioController::new(backend, "sounds", false);
        audio.load();
        assert!(audio.is_loaded());
    }
}
