//! Distance field renderer: wgpu jump flood turning any 2D texture into a distance field render target.

pub mod config;
pub mod cpu;
pub mod effect;
pub mod error;
pub mod gpu;
pub mod readback;
pub mod render_target;
pub mod tracker;
pub mod upload;

use std::sync::Arc;

pub use config::{DistanceFieldConfig, SeedChannel};
pub use effect::Effect;
pub use error::{DistanceFieldError, Result};
pub use gpu::request_device;
pub use readback::{read_field, read_texture_tight};
pub use render_target::RenderTarget;
pub use tracker::ResourceTracker;
pub use upload::upload_rgba8;

/// Check that `texture` can be sampled by the seed pass. Returns its size.
fn validate_input(device: &wgpu::Device, texture: &wgpu::Texture) -> Result<(u32, u32)> {
    let (width, height) = (texture.width(), texture.height());
    if width == 0 || height == 0 {
        return Err(DistanceFieldError::EmptyTexture { width, height });
    }
    if texture.dimension() != wgpu::TextureDimension::D2 {
        return Err(DistanceFieldError::UnsupportedDimension(texture.dimension()));
    }
    if texture.sample_count() != 1 {
        return Err(DistanceFieldError::Multisampled(texture.sample_count()));
    }
    if !texture.usage().contains(wgpu::TextureUsages::TEXTURE_BINDING) {
        return Err(DistanceFieldError::MissingUsage(texture.usage()));
    }
    match texture.format().sample_type(None, Some(device.features())) {
        Some(wgpu::TextureSampleType::Float { .. }) => {}
        _ => return Err(DistanceFieldError::UnsupportedFormat(texture.format())),
    }
    let max = device.limits().max_texture_dimension_2d;
    if width > max || height > max {
        return Err(DistanceFieldError::TooLarge { width, height, max });
    }
    Ok((width, height))
}

/// Generates 2D distance fields. Owns one effect and one render target, both reused by every call.
///
/// `generate` takes `&mut self`: one generation at a time per instance. The returned
/// `Arc<RenderTarget>` is the same object on every call and may outlive the generator.
pub struct DistanceFieldGenerator2D {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: DistanceFieldConfig,
    effect: Box<Effect>,
    render_target: Arc<RenderTarget>,
    distance_field_texture: Option<Arc<wgpu::Texture>>,
}

impl DistanceFieldGenerator2D {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self> {
        Self::new_with_config(device, queue, DistanceFieldConfig::default())
    }

    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: DistanceFieldConfig) -> Result<Self> {
        Self::build(device, queue, config, None)
    }

    /// Like `new_with_config`, with the effect and render target counted by `tracker`.
    pub fn new_with_tracker(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: DistanceFieldConfig,
        tracker: &ResourceTracker,
    ) -> Result<Self> {
        Self::build(device, queue, config, Some(tracker))
    }

    fn build(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: DistanceFieldConfig,
        tracker: Option<&ResourceTracker>,
    ) -> Result<Self> {
        config.validate()?;
        let effect = Box::new(Effect::new_tracked(&device, &config, tracker)?);
        let render_target = Arc::new(RenderTarget::new_tracked(
            "distance_field_render_target",
            config.output_format,
            tracker,
        ));
        log::debug!("distance field generator ready ({:?})", config.output_format);
        Ok(Self {
            device,
            queue,
            config,
            effect,
            render_target,
            distance_field_texture: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device { &self.device }
    pub fn queue(&self) -> &wgpu::Queue { &self.queue }
    pub fn config(&self) -> &DistanceFieldConfig { &self.config }
    pub fn effect(&self) -> &Effect { &self.effect }
    pub fn render_target(&self) -> &Arc<RenderTarget> { &self.render_target }

    /// Backing texture written by the last generation, if any.
    pub fn distance_field_texture(&self) -> Option<&Arc<wgpu::Texture>> {
        self.distance_field_texture.as_ref()
    }

    /// Generate the distance field of `texture` and submit. The previous result is overwritten.
    pub fn generate(&mut self, texture: &wgpu::Texture) -> Result<Arc<RenderTarget>> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("distance_field_generate"),
        });
        let render_target = self.encode(&mut encoder, texture)?;
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(render_target)
    }

    /// Record the generation passes into `encoder` without submitting.
    /// The render target's generation counter advances at encode time. Several encodes may
    /// share one encoder; each records its own pass parameters.
    pub fn encode(&mut self, encoder: &mut wgpu::CommandEncoder, texture: &wgpu::Texture) -> Result<Arc<RenderTarget>> {
        let size = validate_input(&self.device, texture)?;
        let output = self.render_target.ensure_size(&self.device, size.0, size.1)?;
        let source_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("distance_field_source"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: 0,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(1),
            ..Default::default()
        });
        let output_view = output.create_view(&Default::default());
        let passes = self.effect.encode(encoder, &self.device, &source_view, &output_view, size, &self.config)?;
        self.distance_field_texture = Some(output);
        let generation = self.render_target.mark_rendered();
        log::debug!(
            "distance field {}x{}: {} passes, generation {}",
            size.0,
            size.1,
            passes,
            generation
        );
        Ok(Arc::clone(&self.render_target))
    }

    /// Read the current distance field back to the CPU (`[to_inside, to_outside, signed, mask]` per texel).
    pub fn read_back(&self) -> Result<Vec<[f32; 4]>> {
        read_field(&self.device, &self.queue, &self.render_target)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Headless device for GPU tests, or None when the machine has no adapter.
    pub(crate) fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
        crate::request_device().ok()
    }
}
