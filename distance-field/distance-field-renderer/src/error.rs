//! Error type for distance field generation.

/// Errors from generator construction, input validation and readback.
#[derive(Debug, thiserror::Error)]
pub enum DistanceFieldError {
    #[error("invalid distance field config: {0}")]
    InvalidConfig(String),

    #[error("input texture is empty ({width}x{height})")]
    EmptyTexture { width: u32, height: u32 },

    #[error("input texture must be 2D, got {0:?}")]
    UnsupportedDimension(wgpu::TextureDimension),

    #[error("input texture must be single-sampled, got sample_count={0}")]
    Multisampled(u32),

    /// Depth/stencil, integer or otherwise not float-sampleable formats.
    #[error("unsupported input texture format {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("input texture lacks TEXTURE_BINDING usage (has {0:?})")]
    MissingUsage(wgpu::TextureUsages),

    #[error("input texture {width}x{height} exceeds device limit {max}")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("pixel data length {actual} does not match {width}x{height} RGBA8 ({expected} bytes)")]
    PixelCount { width: u32, height: u32, expected: usize, actual: usize },

    /// Shader or pipeline rejected by the device, typically an output format it cannot render to.
    #[error("cannot build distance field pipelines for {output_format:?}: {reason}")]
    PipelineCreation { output_format: wgpu::TextureFormat, reason: String },

    #[error("readback failed: {0}")]
    Readback(String),

    #[error("no GPU adapter available")]
    NoAdapter,

    #[error("failed to create GPU device: {0}")]
    DeviceCreation(String),
}

pub type Result<T> = std::result::Result<T, DistanceFieldError>;
