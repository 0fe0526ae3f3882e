//! Distance field bridge: implements effect_api::FilterBackend using distance-field-renderer.

mod plugin;

pub use plugin::DistanceFieldPlugin;
