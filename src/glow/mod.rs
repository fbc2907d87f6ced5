//! RGB LED glow: fade between random fully-bright colours forever.
pub mod animation;
pub mod leds;

pub use animation::{animate, next_transition, play, Colour, Transition, BLACK, DUTY_CYCLE};
pub use leds::{LedChannels, RgbLeds};
