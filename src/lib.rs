//! Garden telemetry for a Raspberry Pi: a soil/weather poller that uploads to
//! ThingSpeak and an RGB LED glow animator.
pub mod config;
pub mod glow;
pub mod hardware;
pub mod models;
pub mod poller;
pub mod sampling;
pub mod thingspeak;
pub mod utils;
