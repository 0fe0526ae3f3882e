//! Shared filter backend API.
//! Defines the frame types a host extracts each tick and the FilterBackend trait,
//! so a host can drive a GPU filter (prepare + render_frame) without touching wgpu.

mod backend;
mod extract;

pub use backend::{FilterBackend, FilterReadback};
pub use extract::{ExtractedFrame, FieldImage};
