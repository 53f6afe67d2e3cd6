//! Fourth-wall messages
//!
//! A strict FIFO queue feeding a single display slot. Holding the slot is the
//! display lock: a message is shown only when the slot is empty, and the slot
//! empties itself when the message's display time runs out.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::intensity::IntensityBand;
use super::scheduler::Scheduler;
use super::state::{GameEvent, SessionCounters, SessionState};
use crate::tuning::NarrativeTuning;
use crate::{chance, jitter};

/// Message shown when a recent player comes back
pub const WELCOME_BACK: &str = "Welcome back. I've been waiting.";

/// Immutable message content, bucketed by intensity band and by event
#[derive(Debug, Clone, Copy)]
pub struct MessagePool {
    pub low: &'static [&'static str],
    pub mid: &'static [&'static str],
    pub high: &'static [&'static str],
    pub death: &'static [&'static str],
    pub exit: &'static [&'static str],
    pub restart: &'static [&'static str],
}

impl MessagePool {
    pub fn for_band(&self, band: IntensityBand) -> &'static [&'static str] {
        match band {
            IntensityBand::Low => self.low,
            IntensityBand::Mid => self.mid,
            IntensityBand::High => self.high,
        }
    }

    pub fn for_event(&self, event: StoryEvent) -> &'static [&'static str] {
        match event {
            StoryEvent::Death => self.death,
            StoryEvent::ExitReached => self.exit,
            StoryEvent::Restart => self.restart,
        }
    }
}

/// The game's script
pub const MESSAGES: MessagePool = MessagePool {
    low: &[
        "Did you think this would be easy?",
        "Keep trying. It won't help.",
        "I can see you.",
        "This isn't just a game.",
    ],
    mid: &[
        "I know your name.",
        "Are you enjoying this?",
        "Why do you persist?",
        "There is no winning here.",
        "Your efforts are meaningless.",
    ],
    high: &[
        "I remember all your deaths.",
        "The exit is a lie.",
        "I can feel you getting frustrated.",
        "Your determination is amusing.",
        "Do you think this is just a game?",
        "STOP PLAYING",
        "YOU CAN'T ESCAPE",
        "I'M INSIDE YOUR COMPUTER NOW",
        "CLOSE THE BROWSER. NOW.",
        "THIS IS YOUR FINAL WARNING",
        "I CAN SEE YOUR DESKTOP",
        "CHECK BEHIND YOU",
        "I'M SAVING YOUR PROGRESS FOREVER",
        "YOUR DEVICE BELONGS TO ME NOW",
    ],
    death: &[
        "Another failure.",
        "Did that hurt?",
        "I enjoy watching you die.",
        "Try again. And again. And again.",
        "Your persistence is amusing.",
    ],
    exit: &[
        "You thought that was the exit? Funny.",
        "The exit keeps moving. Just like your hopes.",
        "There is no escape.",
        "That exit was never real.",
        "Keep chasing the impossible.",
    ],
    restart: &[
        "Even restarting won't help you.",
        "I remember everything you've done.",
        "You can't escape by restarting.",
        "Your progress is an illusion.",
        "Starting over changes nothing.",
    ],
};

/// Discrete game events the narrator reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryEvent {
    Death,
    ExitReached,
    Restart,
}

/// The message currently holding the display
#[derive(Debug, Clone, PartialEq)]
pub struct ShownMessage {
    pub text: String,
    /// Positional jitter in pixels
    pub offset: Vec2,
    /// Simulation time the display lock is released
    pub expires_at: f32,
}

/// Message queue and display state
#[derive(Debug, Clone)]
pub struct Narrative {
    pool: MessagePool,
    queue: VecDeque<String>,
    showing: Option<ShownMessage>,
    delayed: Scheduler<String>,
}

impl Default for Narrative {
    fn default() -> Self {
        Self::new(MESSAGES)
    }
}

impl Narrative {
    pub fn new(pool: MessagePool) -> Self {
        Self {
            pool,
            queue: VecDeque::new(),
            showing: None,
            delayed: Scheduler::new(),
        }
    }

    /// Append to the queue. No deduplication, no priority.
    pub fn queue_message(&mut self, text: impl Into<String>) {
        self.queue.push_back(text.into());
    }

    /// Queue `text` once the simulation clock reaches `at`
    pub fn schedule_message(&mut self, at: f32, text: impl Into<String>) {
        self.delayed.schedule(at, text.into());
    }

    /// React to a game event. `counters` must already include the event.
    pub fn trigger<R: Rng + ?Sized>(
        &mut self,
        event: StoryEvent,
        counters: &SessionCounters,
        tuning: &NarrativeTuning,
        rng: &mut R,
    ) {
        if event == StoryEvent::Death {
            let cadence = tuning.death_message_cadence.max(1);
            if counters.deaths % cadence != 0 {
                return;
            }
        }
        self.queue_from(self.pool.for_event(event), rng);
    }

    /// Queue a message from the pool matching the current intensity band
    pub fn queue_for_band<R: Rng + ?Sized>(
        &mut self,
        intensity: f32,
        tuning: &NarrativeTuning,
        rng: &mut R,
    ) {
        let band = IntensityBand::from_tuning(intensity, tuning);
        self.queue_from(self.pool.for_band(band), rng);
    }

    fn queue_from<R: Rng + ?Sized>(&mut self, pool: &'static [&'static str], rng: &mut R) {
        if let Some(text) = pool.choose(rng) {
            self.queue_message(*text);
        }
    }

    /// Advance one tick: expire, promote delayed messages, maybe add an
    /// ambient one, then show the queue head if the display is free.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        session: &SessionState,
        dt: f32,
        tuning: &NarrativeTuning,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) {
        let now = session.clock;

        if self.showing.as_ref().is_some_and(|m| now >= m.expires_at) {
            self.showing = None;
            events.push(GameEvent::MessageHidden);
        }

        for text in self.delayed.drain_due(now) {
            self.queue_message(text);
        }

        let intensity = session.intensity;
        if intensity > tuning.ambient_onset
            && chance(rng, intensity * tuning.ambient_rate_per_sec * dt)
        {
            self.queue_for_band(intensity, tuning, rng);
        }

        if self.showing.is_none() {
            if let Some(text) = self.queue.pop_front() {
                let shown = self.display(text, session, tuning, rng);
                events.push(GameEvent::MessageShown {
                    text: shown.text.clone(),
                    offset: shown.offset,
                });
            }
        }
    }

    /// Take the display lock for `text`
    fn display<R: Rng + ?Sized>(
        &mut self,
        text: String,
        session: &SessionState,
        tuning: &NarrativeTuning,
        rng: &mut R,
    ) -> &ShownMessage {
        let intensity = session.intensity;
        let offset = if intensity > tuning.jitter_onset {
            let scale = tuning.jitter_scale * intensity;
            Vec2::new(jitter(rng, scale), jitter(rng, scale))
        } else {
            Vec2::ZERO
        };
        log::debug!("Narrator: {text}");
        self.showing.insert(ShownMessage {
            text,
            offset,
            expires_at: session.clock + tuning.display_time,
        })
    }

    pub fn showing(&self) -> Option<&ShownMessage> {
        self.showing.as_ref()
    }

    /// Whether a message holds the display
    pub fn is_locked(&self) -> bool {
        self.showing.is_some()
    }

    /// Messages waiting for the display
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn quiet() -> NarrativeTuning {
        NarrativeTuning {
            ambient_rate_per_sec: 0.0,
            ..Default::default()
        }
    }

    fn at(clock: f32) -> SessionState {
        SessionState {
            clock,
            ..Default::default()
        }
    }

    #[test]
    fn test_three_in_one_tick_shows_one() {
        let mut n = Narrative::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();

        n.queue_message("one");
        n.queue_message("two");
        n.queue_message("three");
        n.update(&at(0.0), 1.0 / 60.0, &quiet(), &mut rng, &mut events);

        assert_eq!(n.showing().map(|m| m.text.as_str()), Some("one"));
        assert_eq!(n.queued().collect::<Vec<_>>(), vec!["two", "three"]);
        assert_eq!(
            events,
            vec![GameEvent::MessageShown {
                text: "one".into(),
                offset: Vec2::ZERO
            }]
        );
    }

    #[test]
    fn test_burst_never_overlaps() {
        let tuning = quiet();
        let mut n = Narrative::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut events = Vec::new();

        for i in 0..12 {
            n.queue_message(format!("burst {i}"));
        }

        let dt = 1.0 / 60.0;
        let mut shown = Vec::new();
        for tick in 0..(60 * 70) {
            events.clear();
            n.update(&at(tick as f32 * dt), dt, &tuning, &mut rng, &mut events);
            let starts = events
                .iter()
                .filter(|e| matches!(e, GameEvent::MessageShown { .. }))
                .count();
            assert!(starts <= 1);
            if let Some(GameEvent::MessageShown { text, .. }) =
                events.iter().find(|e| matches!(e, GameEvent::MessageShown { .. }))
            {
                // Previous message must be gone before the next one shows
                assert!(n.is_locked());
                shown.push(text.clone());
            }
        }

        let expected: Vec<String> = (0..12).map(|i| format!("burst {i}")).collect();
        assert_eq!(shown, expected);
        assert_eq!(n.pending(), 0);
    }

    #[test]
    fn test_lock_holds_for_display_time() {
        let tuning = quiet();
        let mut n = Narrative::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut events = Vec::new();

        n.queue_message("first");
        n.update(&at(0.0), 0.1, &tuning, &mut rng, &mut events);
        n.queue_message("second");

        n.update(&at(4.9), 0.1, &tuning, &mut rng, &mut events);
        assert_eq!(n.showing().map(|m| m.text.as_str()), Some("first"));

        events.clear();
        n.update(&at(5.0), 0.1, &tuning, &mut rng, &mut events);
        assert_eq!(n.showing().map(|m| m.text.as_str()), Some("second"));
        assert_eq!(events[0], GameEvent::MessageHidden);
    }

    #[test]
    fn test_death_messages_every_other_death() {
        let tuning = quiet();
        let mut n = Narrative::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut counters = SessionCounters::default();

        for deaths in 1..=6 {
            counters.deaths = deaths;
            n.trigger(StoryEvent::Death, &counters, &tuning, &mut rng);
        }
        assert_eq!(n.pending(), 3);
        assert!(n.queued().all(|m| MESSAGES.death.contains(&m)));
    }

    #[test]
    fn test_exit_and_restart_always_queue() {
        let tuning = quiet();
        let mut n = Narrative::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let counters = SessionCounters::default();

        n.trigger(StoryEvent::ExitReached, &counters, &tuning, &mut rng);
        n.trigger(StoryEvent::Restart, &counters, &tuning, &mut rng);

        let queued: Vec<_> = n.queued().collect();
        assert!(MESSAGES.exit.contains(&queued[0]));
        assert!(MESSAGES.restart.contains(&queued[1]));
    }

    #[test]
    fn test_band_selection() {
        let tuning = quiet();
        let mut rng = Pcg32::seed_from_u64(6);
        for (intensity, pool) in [(0.1, MESSAGES.low), (0.45, MESSAGES.mid), (0.9, MESSAGES.high)] {
            let mut n = Narrative::default();
            n.queue_for_band(intensity, &tuning, &mut rng);
            let text = n.queued().next().unwrap();
            assert!(pool.contains(&text));
        }
    }

    #[test]
    fn test_delayed_message_arrives_on_time() {
        let tuning = quiet();
        let mut n = Narrative::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut events = Vec::new();

        n.schedule_message(5.0, WELCOME_BACK);
        n.update(&at(4.0), 0.1, &tuning, &mut rng, &mut events);
        assert!(!n.is_locked());

        n.update(&at(5.0), 0.1, &tuning, &mut rng, &mut events);
        assert_eq!(n.showing().map(|m| m.text.as_str()), Some(WELCOME_BACK));
    }

    #[test]
    fn test_jitter_only_when_corrupted() {
        let tuning = quiet();
        let mut rng = Pcg32::seed_from_u64(8);
        let mut events = Vec::new();

        let mut calm = Narrative::default();
        calm.queue_message("calm");
        calm.update(&at(0.0), 0.1, &tuning, &mut rng, &mut events);
        assert_eq!(calm.showing().map(|m| m.offset), Some(Vec2::ZERO));

        let mut wild = Narrative::default();
        wild.queue_message("wild");
        let session = SessionState {
            intensity: 1.0,
            ..Default::default()
        };
        wild.update(&session, 0.1, &tuning, &mut rng, &mut events);
        let offset = wild.showing().map(|m| m.offset).unwrap();
        assert!(offset.x.abs() <= 5.0 && offset.y.abs() <= 5.0);
    }
}
