//! Sound playback with intensity-driven degradation
//!
//! Samples are played through an [`AudioSink`]. When a sample cannot be
//! played the manager falls back to a synthesized tone, so a missing file
//! never silences the game. The browser sink drives Web Audio oscillators and
//! HTML audio elements; native builds log instead.

use rand::Rng;
use thiserror::Error;

use crate::sim::GameEvent;
use crate::tuning::AudioTuning;
use crate::{chance, jitter};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Player left the ground
    Jump,
    /// Player fell out of the world
    Death,
    /// Glitch burst
    Glitch,
    /// Player touched the exit
    Exit,
    /// Background drone, looped for the whole session
    Ambient,
}

impl SoundEffect {
    pub const ALL: [SoundEffect; 5] = [
        SoundEffect::Jump,
        SoundEffect::Death,
        SoundEffect::Glitch,
        SoundEffect::Exit,
        SoundEffect::Ambient,
    ];

    /// Sample file, relative to the page
    pub fn sample_path(self) -> &'static str {
        match self {
            SoundEffect::Jump => "audio/jump.mp3",
            SoundEffect::Death => "audio/death.mp3",
            SoundEffect::Glitch => "audio/glitch.mp3",
            SoundEffect::Exit => "audio/exit.mp3",
            SoundEffect::Ambient => "audio/ambient.mp3",
        }
    }

    pub fn is_looping(self) -> bool {
        self == SoundEffect::Ambient
    }

    /// Synthesized stand-in used when the sample is unavailable
    pub fn fallback_tone(self) -> Tone {
        let (frequency, duration) = match self {
            SoundEffect::Jump => (200.0, 0.1),
            SoundEffect::Death => (100.0, 0.3),
            SoundEffect::Glitch => (50.0, 0.2),
            SoundEffect::Exit => (300.0, 0.2),
            SoundEffect::Ambient => (80.0, 1.0),
        };
        Tone {
            frequency,
            duration,
            looping: self.is_looping(),
        }
    }

    /// Cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Jumped => Some(SoundEffect::Jump),
            GameEvent::PlayerDied { .. } => Some(SoundEffect::Death),
            GameEvent::ExitReached => Some(SoundEffect::Exit),
            GameEvent::ExitTeleported | GameEvent::GlitchSound => Some(SoundEffect::Glitch),
            GameEvent::FakeCrash | GameEvent::MessageShown { .. } | GameEvent::MessageHidden => {
                None
            }
        }
    }
}

/// A sine tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Hz
    pub frequency: f32,
    /// Seconds; for looping tones, the length of one cycle
    pub duration: f32,
    pub looping: bool,
}

/// Per-play modifiers produced by [`degrade`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParams {
    /// Absolute volume in [0, 1]
    pub volume: f32,
    /// Sample playback rate multiplier
    pub rate: f32,
    /// Fallback tone frequency multiplier
    pub detune: f32,
}

impl PlaybackParams {
    pub fn clean(volume: f32) -> Self {
        Self {
            volume,
            rate: 1.0,
            detune: 1.0,
        }
    }
}

/// Audio backend failures. All of them are recoverable.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("sample for {0:?} could not be loaded")]
    MissingSample(SoundEffect),
    #[error("playback failed: {0}")]
    Playback(String),
}

/// Something that can make noise
pub trait AudioSink {
    /// Play the sample for `effect`
    fn play(&mut self, effect: SoundEffect, params: &PlaybackParams) -> Result<(), AudioError>;

    /// Play a synthesized tone
    fn play_tone(&mut self, tone: Tone, params: &PlaybackParams) -> Result<(), AudioError>;

    /// Muting stops everything currently playing
    fn set_muted(&mut self, muted: bool);

    fn set_master_volume(&mut self, volume: f32);
}

/// Corrupt a sound's parameters for the current intensity
pub fn degrade<R: Rng + ?Sized>(
    intensity: f32,
    base_volume: f32,
    tuning: &AudioTuning,
    rng: &mut R,
) -> PlaybackParams {
    let mut params = PlaybackParams::clean(base_volume);
    if intensity < tuning.onset {
        return params;
    }

    if chance(rng, intensity * tuning.volume_jitter_chance) {
        let r: f32 = rng.random();
        params.volume = base_volume * (1.0 - r * intensity * tuning.volume_jitter_scale);
    }

    if intensity > tuning.rate_onset && chance(rng, intensity * tuning.rate_jitter_chance) {
        params.rate = 1.0 + jitter(rng, intensity);
    }

    if intensity > tuning.detune_onset {
        params.detune = 1.0 + jitter(rng, tuning.detune_scale * intensity);
    }

    params.volume = params.volume.clamp(0.0, 1.0);
    params
}

/// Routes game sounds to a sink, applying degradation and tone fallback
pub struct AudioManager<S: AudioSink> {
    sink: S,
    master_volume: f32,
    muted: bool,
}

impl<S: AudioSink> AudioManager<S> {
    pub fn new(mut sink: S, master_volume: f32, muted: bool) -> Self {
        let master_volume = master_volume.clamp(0.0, 1.0);
        sink.set_master_volume(master_volume);
        sink.set_muted(muted);
        Self {
            sink,
            master_volume,
            muted,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Play `effect`, degraded for `intensity`. Never fails.
    pub fn play<R: Rng + ?Sized>(
        &mut self,
        effect: SoundEffect,
        intensity: f32,
        tuning: &AudioTuning,
        rng: &mut R,
    ) {
        if self.muted {
            return;
        }

        let params = degrade(intensity, self.master_volume, tuning, rng);
        if let Err(err) = self.sink.play(effect, &params) {
            log::debug!("{err}; using fallback tone");
            if let Err(err) = self.sink.play_tone(effect.fallback_tone(), &params) {
                log::debug!("Fallback tone for {effect:?} failed: {err}");
            }
        }
    }

    /// Start the session drone
    pub fn start_ambient<R: Rng + ?Sized>(&mut self, intensity: f32, tuning: &AudioTuning, rng: &mut R) {
        self.play(SoundEffect::Ambient, intensity, tuning, rng);
    }

    /// Mute or unmute. Unmuting restarts the ambient loop.
    pub fn set_muted<R: Rng + ?Sized>(
        &mut self,
        muted: bool,
        intensity: f32,
        tuning: &AudioTuning,
        rng: &mut R,
    ) {
        if muted == self.muted {
            return;
        }
        self.muted = muted;
        self.sink.set_muted(muted);
        if !muted {
            self.start_ambient(intensity, tuning, rng);
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.sink.set_master_volume(self.master_volume);
    }
}

/// Sink for headless runs: logs what would have played
#[derive(Debug, Default)]
pub struct LogSink {
    muted: bool,
}

impl AudioSink for LogSink {
    fn play(&mut self, effect: SoundEffect, params: &PlaybackParams) -> Result<(), AudioError> {
        if !self.muted {
            log::trace!("play {effect:?} vol={:.2} rate={:.2}", params.volume, params.rate);
        }
        Ok(())
    }

    fn play_tone(&mut self, tone: Tone, params: &PlaybackParams) -> Result<(), AudioError> {
        if !self.muted {
            log::trace!("tone {:.0} Hz for {:.2}s", tone.frequency * params.detune, tone.duration);
        }
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_master_volume(&mut self, _volume: f32) {}
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioSink;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::collections::HashMap;

    use web_sys::{
        AudioContext, GainNode, HtmlAudioElement, HtmlMediaElement, OscillatorNode, OscillatorType,
    };

    use super::{AudioError, AudioSink, PlaybackParams, SoundEffect, Tone};

    /// Web Audio oscillators plus one HTML audio element per sample
    pub struct WebAudioSink {
        ctx: Option<AudioContext>,
        samples: HashMap<SoundEffect, HtmlAudioElement>,
        /// Running looped tone, stopped on mute
        drone: Option<(OscillatorNode, GainNode)>,
        muted: bool,
    }

    impl Default for WebAudioSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudioSink {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - fallback tones disabled");
            }

            let mut samples = HashMap::new();
            for effect in SoundEffect::ALL {
                match HtmlAudioElement::new_with_src(effect.sample_path()) {
                    Ok(el) => {
                        el.set_loop(effect.is_looping());
                        samples.insert(effect, el);
                    }
                    Err(_) => log::debug!("No audio element for {effect:?}"),
                }
            }

            Self {
                ctx,
                samples,
                drone: None,
                muted: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn stop_drone(&mut self) {
            if let Some((osc, _)) = self.drone.take() {
                osc.stop().ok();
            }
        }
    }

    impl AudioSink for WebAudioSink {
        fn play(&mut self, effect: SoundEffect, params: &PlaybackParams) -> Result<(), AudioError> {
            if self.muted {
                return Ok(());
            }
            let el = self
                .samples
                .get(&effect)
                .ok_or(AudioError::MissingSample(effect))?;
            if el.network_state() == HtmlMediaElement::NETWORK_NO_SOURCE {
                return Err(AudioError::MissingSample(effect));
            }

            el.set_volume(params.volume as f64);
            el.set_playback_rate(params.rate as f64);
            el.set_current_time(0.0);
            el.play()
                .map(|_| ())
                .map_err(|e| AudioError::Playback(format!("{e:?}")))
        }

        fn play_tone(&mut self, tone: Tone, params: &PlaybackParams) -> Result<(), AudioError> {
            if self.muted {
                return Ok(());
            }
            let Some(ctx) = &self.ctx else {
                return Err(AudioError::Unavailable("no AudioContext".into()));
            };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let freq = tone.frequency * params.detune;
            let (osc, gain) = Self::create_osc(ctx, freq, OscillatorType::Sine)
                .ok_or_else(|| AudioError::Unavailable("oscillator graph".into()))?;
            let t = ctx.current_time();

            if tone.looping {
                gain.gain().set_value(params.volume * 0.3);
                osc.start()
                    .map_err(|e| AudioError::Playback(format!("{e:?}")))?;
                self.stop_drone();
                self.drone = Some((osc, gain));
            } else {
                gain.gain().set_value_at_time(params.volume * 0.5, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + tone.duration as f64)
                    .ok();
                osc.start()
                    .map_err(|e| AudioError::Playback(format!("{e:?}")))?;
                osc.stop_with_when(t + tone.duration as f64).ok();
            }
            Ok(())
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            if muted {
                self.stop_drone();
                for el in self.samples.values() {
                    el.pause().ok();
                    el.set_current_time(0.0);
                }
            }
        }

        fn set_master_volume(&mut self, volume: f32) {
            if let Some((_, gain)) = &self.drone {
                gain.gain().set_value(volume * 0.3);
            }
            if let Some(el) = self.samples.get(&SoundEffect::Ambient) {
                el.set_volume(volume as f64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Records calls; samples listed in `missing` fail to play
    #[derive(Default)]
    struct RecordingSink {
        missing: Vec<SoundEffect>,
        played: Vec<SoundEffect>,
        tones: Vec<Tone>,
        muted: bool,
    }

    impl AudioSink for RecordingSink {
        fn play(&mut self, effect: SoundEffect, _params: &PlaybackParams) -> Result<(), AudioError> {
            if self.missing.contains(&effect) {
                return Err(AudioError::MissingSample(effect));
            }
            self.played.push(effect);
            Ok(())
        }

        fn play_tone(&mut self, tone: Tone, _params: &PlaybackParams) -> Result<(), AudioError> {
            self.tones.push(tone);
            Ok(())
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn set_master_volume(&mut self, _volume: f32) {}
    }

    #[test]
    fn test_calm_sounds_are_untouched() {
        let tuning = AudioTuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..1000 {
            assert_eq!(degrade(0.19, 0.5, &tuning, &mut rng), PlaybackParams::clean(0.5));
        }
    }

    #[test]
    fn test_rate_and_detune_need_their_onsets() {
        let tuning = AudioTuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        for _ in 0..1000 {
            let p = degrade(0.25, 1.0, &tuning, &mut rng);
            assert_eq!(p.rate, 1.0);
            assert_eq!(p.detune, 1.0);
        }
        let detuned = (0..100)
            .map(|_| degrade(0.9, 1.0, &tuning, &mut rng))
            .filter(|p| p.detune != 1.0)
            .count();
        assert!(detuned > 90);
    }

    #[test]
    fn test_missing_sample_falls_back_to_tone() {
        let sink = RecordingSink {
            missing: vec![SoundEffect::Death],
            ..Default::default()
        };
        let mut audio = AudioManager::new(sink, 0.5, false);
        let mut rng = Pcg32::seed_from_u64(3);
        let tuning = AudioTuning::default();

        audio.play(SoundEffect::Jump, 0.0, &tuning, &mut rng);
        audio.play(SoundEffect::Death, 0.0, &tuning, &mut rng);

        assert_eq!(audio.sink().played, vec![SoundEffect::Jump]);
        assert_eq!(audio.sink().tones, vec![SoundEffect::Death.fallback_tone()]);
        assert_eq!(audio.sink().tones[0].frequency, 100.0);
    }

    #[test]
    fn test_mute_silences_and_unmute_restarts_ambient() {
        let mut audio = AudioManager::new(RecordingSink::default(), 0.5, false);
        let mut rng = Pcg32::seed_from_u64(4);
        let tuning = AudioTuning::default();

        audio.set_muted(true, 0.0, &tuning, &mut rng);
        assert!(audio.sink().muted);
        audio.play(SoundEffect::Jump, 0.0, &tuning, &mut rng);
        assert!(audio.sink().played.is_empty());

        audio.set_muted(false, 0.0, &tuning, &mut rng);
        assert!(!audio.sink().muted);
        assert_eq!(audio.sink().played, vec![SoundEffect::Ambient]);
    }

    #[test]
    fn test_event_cues() {
        assert_eq!(SoundEffect::for_event(&GameEvent::Jumped), Some(SoundEffect::Jump));
        assert_eq!(
            SoundEffect::for_event(&GameEvent::PlayerDied { deaths: 3 }),
            Some(SoundEffect::Death)
        );
        assert_eq!(SoundEffect::for_event(&GameEvent::ExitTeleported), Some(SoundEffect::Glitch));
        assert_eq!(SoundEffect::for_event(&GameEvent::MessageHidden), None);
        assert!(SoundEffect::Ambient.fallback_tone().looping);
        assert!(!SoundEffect::Exit.fallback_tone().looping);
    }

    proptest! {
        #[test]
        fn degraded_params_stay_sane(intensity in 0.0f32..=1.0, base in 0.0f32..=1.0, seed: u64) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = degrade(intensity, base, &AudioTuning::default(), &mut rng);
            prop_assert!(p.volume >= 0.0 && p.volume <= base + 1e-6);
            prop_assert!(p.rate >= 0.5 && p.rate <= 1.5);
            prop_assert!(p.detune >= 0.75 && p.detune <= 1.25);
        }
    }
}
