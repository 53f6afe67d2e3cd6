//! Corruption simulation
//!
//! All gameplay logic lives here. This module stays free of rendering and
//! platform dependencies:
//! - Fixed timestep only
//! - One seeded RNG per session
//! - Timed reverts go through `Scheduler`, never wall-clock timers

pub mod collision;
pub mod color;
pub mod glitch;
pub mod intensity;
pub mod level;
pub mod narrative;
pub mod player;
pub mod rect;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use collision::{ContactSide, resolve_aabb, resolve_player_collisions};
pub use color::Color;
pub use glitch::{GlitchEffector, GlitchLevels, MajorGlitch, VisualEffect};
pub use intensity::{IntensityBand, compute_intensity};
pub use level::{Exit, Level, Platform};
pub use narrative::{Narrative, ShownMessage, StoryEvent, WELCOME_BACK};
pub use player::Player;
pub use rect::Rect;
pub use scheduler::Scheduler;
pub use state::{GameEvent, GameState, SessionCounters, SessionState};
pub use tick::{TickInput, tick};
