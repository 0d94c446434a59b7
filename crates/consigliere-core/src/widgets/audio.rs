use tracing::debug;

use crate::mode::Mode;

pub const DEFAULT_VOLUME: f32 = 0.5;

/// The vinyl player. Tracks are numbered from 1 and live under
/// `music/<mode>/track<N>.mp3`.
#[derive(Debug, Clone)]
pub struct Turntable {
    mode: Mode,
    total_tracks: u32,
    track: u32,
    playing: bool,
    volume: f32,
}

impl Turntable {
    pub fn new(mode: Mode, total_tracks: u32) -> Self {
        Self {
            mode,
            total_tracks: total_tracks.max(1),
            track: 1,
            playing: false,
            volume: DEFAULT_VOLUME,
        }
    }

    pub fn track(&self) -> u32 {
        self.track
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn source(&self) -> String {
        format!("music/{}/track{}.mp3", self.mode, self.track)
    }

    pub fn title(&self) -> String {
        match self.mode {
            Mode::Focus => format!("Focus Reel #{}", self.track),
            Mode::Relax => format!("Lounge Reel #{}", self.track),
        }
    }

    pub fn toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    /// Advances to the next track (wrapping) and starts playing.
    pub fn skip(&mut self) {
        self.advance();
        self.playing = true;
    }

    /// Called when the current track finishes; playback state is kept.
    pub fn track_ended(&mut self) {
        self.advance();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            DEFAULT_VOLUME
        };
    }

    /// Mode changes stop playback and rewind to track 1. Volume is kept.
    pub fn on_mode_change(&mut self, mode: Mode) {
        debug!(%mode, "turntable reset for new mode");
        self.mode = mode;
        self.track = 1;
        self.playing = false;
    }

    fn advance(&mut self) {
        self.track = if self.track >= self.total_tracks {
            1
        } else {
            self.track + 1
        };
    }
}
