//! Distance field configuration: seed selection, output format, distance range.

use crate::error::{DistanceFieldError, Result};

/// Which source channel decides whether a texel is inside the shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedChannel {
    #[default]
    Alpha,
    /// Rec. 709 luma of the RGB channels.
    Luminance,
}

impl SeedChannel {
    pub(crate) fn as_u32(self) -> u32 {
        match self {
            SeedChannel::Alpha => 0,
            SeedChannel::Luminance => 1,
        }
    }
}

/// Generator configuration.
#[derive(Clone, Debug)]
pub struct DistanceFieldConfig {
    /// Render target format. Rgba16Float or Rgba32Float; the latter is not renderable on every adapter.
    pub output_format: wgpu::TextureFormat,
    pub seed_channel: SeedChannel,
    /// A texel is inside when its seed channel is >= threshold. Range [0, 1].
    pub threshold: f32,
    /// Distances are clamped to this many pixels. Also the value written when no seed exists.
    pub max_distance: f32,
    /// Divide distances by max_distance so they land in [0, 1] (signed: [-1, 1]).
    pub normalize: bool,
    /// Run one extra step-1 flood pass after the halving sequence (JFA+1).
    pub extra_pass: bool,
}

impl Default for DistanceFieldConfig {
    fn default() -> Self {
        Self {
            output_format: wgpu::TextureFormat::Rgba16Float,
            seed_channel: SeedChannel::default(),
            threshold: 0.5,
            max_distance: 256.0,
            normalize: false,
            extra_pass: true,
        }
    }
}

impl DistanceFieldConfig {
    pub fn validate(&self) -> Result<()> {
        match self.output_format {
            wgpu::TextureFormat::Rgba32Float | wgpu::TextureFormat::Rgba16Float => {}
            other => {
                return Err(DistanceFieldError::InvalidConfig(format!(
                    "output_format must be Rgba32Float or Rgba16Float, got {other:?}"
                )))
            }
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(DistanceFieldError::InvalidConfig(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(DistanceFieldError::InvalidConfig(format!(
                "max_distance must be finite and > 0, got {}",
                self.max_distance
            )));
        }
        Ok(())
    }

    /// Scale applied to every distance channel in the resolve pass.
    pub(crate) fn distance_scale(&self) -> f32 {
        if self.normalize { 1.0 / self.max_distance } else { 1.0 }
    }
}
