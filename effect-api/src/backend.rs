//! Trait for filter backends. Host uses this to call prepare/render_frame uniformly.

use crate::{ExtractedFrame, FieldImage};

/// Filter backend that the host drives once per frame.
pub trait FilterBackend: Send {
    /// Prepare phase: upload the extracted frame to the GPU. Unusable frames are skipped.
    fn prepare(&mut self, frame: &ExtractedFrame);

    /// Run the filter on the last prepared frame. Submits work internally.
    fn render_frame(&mut self) -> Result<(), String>;
}

/// Extension for backends whose output can be copied back to the host.
pub trait FilterReadback: FilterBackend + Send {
    /// CPU copy of the last output, or None if nothing has been rendered yet.
    fn read_output(&mut self) -> Result<Option<FieldImage>, String>;
}
