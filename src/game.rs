//! Session controller
//!
//! Owns the simulation state and drives it with a fixed-timestep
//! accumulator. Events coming out of each tick are routed to audio and page
//! chrome here; the simulation itself never touches an output device.

use glam::Vec2;
use rand::Rng;

use crate::audio::{AudioManager, AudioSink, SoundEffect};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::persistence::{self, PersistenceError, Resume, SessionRecord, Storage};
use crate::platform::Chrome;
use crate::renderer::Renderer;
use crate::renderer::effects::FrameFx;
use crate::renderer::scene::render_frame;
use crate::settings::Settings;
use crate::sim::narrative::WELCOME_BACK;
use crate::sim::{GameEvent, GameState, TickInput, tick};
use crate::tuning::Tuning;

/// Text of the fake crash overlay
pub const CRASH_TEXT: &str =
    "FATAL ERROR: Memory corruption detected.\nGame state corrupted.\nAttempting recovery...";

/// Crash overlay corner is placed within this percentage of the viewport
const CRASH_POS_RANGE: f32 = 50.0;

/// A running session
pub struct Game<A: AudioSink, C: Chrome> {
    state: GameState,
    tuning: Tuning,
    settings: Settings,
    accumulator: f32,
    fx: FrameFx,
    audio: AudioManager<A>,
    chrome: C,
    /// Wall-clock seconds left in a fake crash halt
    halted_for: Option<f32>,
}

impl<A: AudioSink, C: Chrome> Game<A, C> {
    /// Build a session, carrying over what `resume` says from the last one
    pub fn new(
        seed: u64,
        tuning: Tuning,
        settings: Settings,
        sink: A,
        chrome: C,
        resume: Resume,
    ) -> Self {
        let mut state = GameState::with_deaths(seed, &tuning, resume.deaths);
        if resume.welcome_back {
            state
                .narrative
                .schedule_message(tuning.narrative.welcome_delay, WELCOME_BACK);
        }
        log::info!(
            "Session started (seed {seed}, {} deaths carried over, welcome back: {})",
            resume.deaths,
            resume.welcome_back
        );

        let audio = AudioManager::new(sink, settings.master_volume, settings.muted);
        Self {
            state,
            tuning,
            settings,
            accumulator: 0.0,
            fx: FrameFx::new(seed),
            audio,
            chrome,
            halted_for: None,
        }
    }

    /// Start the ambient drone. Browsers only allow this after user input.
    pub fn start(&mut self) {
        let intensity = self.state.intensity();
        self.audio
            .start_ambient(intensity, &self.tuning.audio, self.fx.rng());
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn chrome(&self) -> &C {
        &self.chrome
    }

    pub fn audio(&self) -> &AudioManager<A> {
        &self.audio
    }

    /// Simulation is frozen by a fake crash
    pub fn is_halted(&self) -> bool {
        self.halted_for.is_some()
    }

    /// Advance by one display frame of `dt` wall-clock seconds.
    /// Returns the number of simulation ticks run.
    pub fn frame(&mut self, dt: f32, input: &TickInput) -> u32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(left) = self.halted_for {
            let left = left - dt;
            if left > 0.0 {
                self.halted_for = Some(left);
            } else {
                self.recover();
            }
            return 0;
        }

        self.accumulator = (self.accumulator + dt.min(MAX_FRAME_DT)).min(MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let events = tick(&mut self.state, input, &self.tuning, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            for event in events {
                self.handle_event(event);
            }
            if self.is_halted() {
                break;
            }
        }
        substeps
    }

    fn handle_event(&mut self, event: GameEvent) {
        if let Some(effect) = SoundEffect::for_event(&event) {
            let intensity = self.state.intensity();
            self.audio
                .play(effect, intensity, &self.tuning.audio, self.fx.rng());
        }

        match event {
            GameEvent::MessageShown { text, offset } => self.chrome.show_message(&text, offset),
            GameEvent::MessageHidden => self.chrome.hide_message(),
            GameEvent::FakeCrash => self.crash(),
            _ => {}
        }
    }

    fn crash(&mut self) {
        if self.is_halted() {
            return;
        }
        let rng = self.fx.rng();
        let pos = Vec2::new(
            rng.random_range(0.0..CRASH_POS_RANGE),
            rng.random_range(0.0..CRASH_POS_RANGE),
        );
        self.chrome.show_error(CRASH_TEXT, pos);
        self.halted_for = Some(self.tuning.glitch.fake_crash_duration);
        log::debug!("Fake crash");
    }

    fn recover(&mut self) {
        self.halted_for = None;
        self.accumulator = 0.0;
        self.chrome.hide_error();
        self.state.record_restart(&self.tuning);
    }

    /// Throw the session away and start over from zero
    pub fn restart_session(&mut self, seed: u64) {
        self.state = GameState::new(seed, &self.tuning);
        self.fx = FrameFx::new(seed);
        self.accumulator = 0.0;
        self.halted_for = None;
        self.chrome.hide_message();
        self.chrome.hide_error();
        log::info!("Session restarted with seed {seed}");
    }

    /// Draw the current frame. The last frame stays up during a crash.
    pub fn render<Rd: Renderer + ?Sized>(&mut self, r: &mut Rd) {
        if self.is_halted() {
            return;
        }
        render_frame(
            r,
            &mut self.fx,
            &self.state,
            &self.tuning,
            self.settings.show_debug,
        );
    }

    pub fn toggle_debug(&mut self) {
        self.settings.show_debug = !self.settings.show_debug;
        log::info!("Debug overlay: {}", self.settings.show_debug);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        let intensity = self.state.intensity();
        self.audio
            .set_muted(muted, intensity, &self.tuning.audio, self.fx.rng());
    }

    /// Window focus changed. Silences the game while unfocused if the player
    /// asked for it; the saved mute preference is left alone.
    pub fn focus_changed(&mut self, focused: bool) {
        if !self.settings.mute_on_blur {
            return;
        }
        let muted = self.settings.muted || !focused;
        let intensity = self.state.intensity();
        self.audio
            .set_muted(muted, intensity, &self.tuning.audio, self.fx.rng());
    }

    /// Snapshot for the next session
    pub fn record(&self, now_ms: f64) -> SessionRecord {
        SessionRecord::capture(self.state.counters(), self.state.intensity(), now_ms)
    }

    /// Best-effort save of the session record and settings
    pub fn save<S: Storage + ?Sized>(
        &self,
        storage: &mut S,
        now_ms: f64,
    ) -> Result<(), PersistenceError> {
        persistence::save_session(storage, &self.record(now_ms))?;
        self.settings.save(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, PlaybackParams, Tone};
    use crate::persistence::MemoryStorage;
    use crate::platform::LogChrome;
    use crate::renderer::testing::RecordingRenderer;

    #[derive(Default)]
    struct CountingSink {
        played: Vec<SoundEffect>,
    }

    impl AudioSink for CountingSink {
        fn play(&mut self, effect: SoundEffect, _params: &PlaybackParams) -> Result<(), AudioError> {
            self.played.push(effect);
            Ok(())
        }

        fn play_tone(&mut self, _tone: Tone, _params: &PlaybackParams) -> Result<(), AudioError> {
            Ok(())
        }

        fn set_muted(&mut self, _muted: bool) {}

        fn set_master_volume(&mut self, _volume: f32) {}
    }

    fn game(resume: Resume) -> Game<CountingSink, LogChrome> {
        Game::new(
            3,
            Tuning::default(),
            Settings::default(),
            CountingSink::default(),
            LogChrome::new(),
            resume,
        )
    }

    #[test]
    fn test_accumulator_caps_substeps() {
        let mut g = game(Resume::default());
        assert_eq!(g.frame(SIM_DT * 3.0 + 1e-4, &TickInput::default()), 3);
        // A long stall is clamped, then capped per frame
        assert_eq!(g.frame(10.0, &TickInput::default()), MAX_SUBSTEPS);

        let mut g = game(Resume::default());
        assert_eq!(g.frame(f32::NAN, &TickInput::default()), 0);
        assert_eq!(g.frame(-1.0, &TickInput::default()), 0);
    }

    #[test]
    fn test_playtime_tracks_ticks() {
        let mut g = game(Resume::default());
        let mut ticks = 0;
        for _ in 0..120 {
            ticks += g.frame(1.0 / 60.0, &TickInput::default());
        }
        let expected = ticks as f32 * SIM_DT;
        assert!((g.state().counters().playtime_secs - expected).abs() < 1e-3);
    }

    #[test]
    fn test_fake_crash_halts_then_recovers() {
        let mut g = game(Resume::default());
        g.handle_event(GameEvent::FakeCrash);
        assert!(g.is_halted());
        assert_eq!(g.chrome().error(), Some(CRASH_TEXT));

        let before = g.state().counters().playtime_secs;
        assert_eq!(g.frame(1.0, &TickInput::default()), 0);
        assert_eq!(g.frame(1.0, &TickInput::default()), 0);
        assert_eq!(g.state().counters().playtime_secs, before);

        g.frame(1.5, &TickInput::default());
        assert!(!g.is_halted());
        assert_eq!(g.chrome().error(), None);
        assert_eq!(g.state().counters().restarts, 1);
        assert!(g.state().narrative.pending() > 0);
        assert_eq!(g.accumulator, 0.0);
    }

    #[test]
    fn test_events_reach_audio_and_chrome() {
        let mut g = game(Resume::default());
        g.handle_event(GameEvent::Jumped);
        g.handle_event(GameEvent::ExitTeleported);
        g.handle_event(GameEvent::MessageShown {
            text: "hi".into(),
            offset: Vec2::ZERO,
        });
        assert_eq!(g.audio().sink().played, [SoundEffect::Jump, SoundEffect::Glitch]);
        assert_eq!(g.chrome().message(), Some("hi"));
        g.handle_event(GameEvent::MessageHidden);
        assert_eq!(g.chrome().message(), None);
    }

    #[test]
    fn test_welcome_back_is_scheduled() {
        let mut g = game(Resume {
            welcome_back: true,
            deaths: 0,
        });
        let delay = g.tuning.narrative.welcome_delay;
        let mut t = 0.0;
        while t < delay + 0.5 {
            g.frame(SIM_DT, &TickInput::default());
            t += SIM_DT;
        }
        assert_eq!(g.chrome().message(), Some(WELCOME_BACK));
    }

    #[test]
    fn test_muted_session_is_silent() {
        let mut g = game(Resume::default());
        g.set_muted(true);
        g.start();
        g.handle_event(GameEvent::Jumped);
        assert!(g.audio().sink().played.is_empty());
        g.set_muted(false);
        assert_eq!(g.audio().sink().played, [SoundEffect::Ambient]);
    }

    #[test]
    fn test_blur_mutes_without_touching_settings() {
        let mut g = game(Resume::default());
        g.focus_changed(false);
        assert!(g.audio().is_muted());
        assert!(!g.settings().muted);
        g.focus_changed(true);
        assert!(!g.audio().is_muted());
    }

    #[test]
    fn test_render_freezes_during_crash() {
        let mut g = game(Resume::default());
        let mut r = RecordingRenderer::default();
        g.render(&mut r);
        let drawn = r.ops.len();
        assert!(drawn > 0);
        g.handle_event(GameEvent::FakeCrash);
        g.render(&mut r);
        assert_eq!(r.ops.len(), drawn);
    }

    #[test]
    fn test_save_round_trip() {
        let mut g = game(Resume {
            welcome_back: false,
            deaths: 4,
        });
        g.toggle_debug();
        let mut storage = MemoryStorage::new();
        g.save(&mut storage, 1000.0).unwrap();

        let record = persistence::load_session(&mut storage).unwrap().unwrap();
        assert_eq!(record.deaths, 4);
        assert_eq!(record.last_played_ms, 1000.0);
        assert!(Settings::load(&storage).show_debug);
    }

    #[test]
    fn test_restart_clears_everything() {
        let mut g = game(Resume {
            welcome_back: false,
            deaths: 4,
        });
        g.handle_event(GameEvent::FakeCrash);
        g.restart_session(9);
        assert!(!g.is_halted());
        assert_eq!(g.state().counters().deaths, 0);
        assert_eq!(g.state().intensity(), 0.0);
    }
}
