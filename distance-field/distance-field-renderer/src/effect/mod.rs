//! Distance field effect: seed, jump flood and resolve pipelines plus their scratch targets.

use wgpu::util::DeviceExt;
use wgpu::CommandEncoder;

use crate::config::DistanceFieldConfig;
use crate::error::{DistanceFieldError, Result};
use crate::tracker::{ResourceKind, ResourceTracker, TrackedResource};

const DISTANCE_FIELD_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/distance_field.wgsl"));

/// Seed textures hold integer texel coordinates (-1 = no seed), exact at any size.
pub const SEED_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Sint;

const PARAMS_SIZE: u64 = std::mem::size_of::<PassParams>() as u64;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct PassParams {
    size: [u32; 2],
    step: u32,
    seed_channel: u32,
    threshold: f32,
    max_distance: f32,
    distance_scale: f32,
    _pad: f32,
}

/// Step sizes of the flood passes for a `width`x`height` image, largest first.
pub fn flood_steps(width: u32, height: u32, extra_pass: bool) -> Vec<u32> {
    let mut steps = Vec::new();
    let mut step = width.max(height).next_power_of_two() / 2;
    while step >= 1 {
        steps.push(step);
        step /= 2;
    }
    if extra_pass {
        steps.push(1);
    }
    steps
}

/// Ping-pong pair of seed textures, cached by size.
struct SeedTargets {
    ping: wgpu::Texture,
    pong: wgpu::Texture,
    width: u32,
    height: u32,
}

impl SeedTargets {
    fn ensure_size(device: &wgpu::Device, existing: Option<Self>, width: u32, height: u32) -> Self {
        if let Some(t) = existing {
            if t.width == width && t.height == height { return t; }
        }
        log::debug!("distance_field_effect: allocating {}x{} seed targets", width, height);
        let make = |label: &str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SEED_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        Self { ping: make("distance_field_seeds_ping"), pong: make("distance_field_seeds_pong"), width, height }
    }
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

const PARAMS_ENTRY: wgpu::BindGroupLayoutEntry = wgpu::BindGroupLayoutEntry {
    binding: 1,
    visibility: wgpu::ShaderStages::FRAGMENT,
    ty: wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: true,
        min_binding_size: wgpu::BufferSize::new(PARAMS_SIZE),
    },
    count: None,
};

pub struct Effect {
    seed_pipeline: wgpu::RenderPipeline,
    flood_pipeline: wgpu::RenderPipeline,
    resolve_pipeline: wgpu::RenderPipeline,
    /// Source image (binding 0) + params; used by the seed pass.
    source_layout: wgpu::BindGroupLayout,
    /// Seed texture (binding 2) + params; used by flood and resolve.
    seed_layout: wgpu::BindGroupLayout,
    params_stride: u64,
    output_format: wgpu::TextureFormat,
    seeds: Option<SeedTargets>,
    _tracked: Option<TrackedResource>,
}

impl Effect {
    /// Compile the shader and build the three pipelines. `config.output_format` fixes the resolve target format.
    pub fn new(device: &wgpu::Device, config: &DistanceFieldConfig) -> Result<Self> {
        Self::new_tracked(device, config, None)
    }

    pub(crate) fn new_tracked(
        device: &wgpu::Device,
        config: &DistanceFieldConfig,
        tracker: Option<&ResourceTracker>,
    ) -> Result<Self> {
        config.validate()?;
        Self::with_output_format(device, config.output_format, tracker)
    }

    /// Validation errors (e.g. an output format the adapter cannot render to) are
    /// captured in an error scope and returned instead of reaching the device's
    /// uncaptured error handler.
    fn with_output_format(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        tracker: Option<&ResourceTracker>,
    ) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("distance_field_shader"),
            source: wgpu::ShaderSource::Wgsl(DISTANCE_FIELD_SHADER.into()),
        });
        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("distance_field_source_layout"),
            entries: &[texture_entry(0, wgpu::TextureSampleType::Float { filterable: false }), PARAMS_ENTRY],
        });
        let seed_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("distance_field_seed_layout"),
            entries: &[PARAMS_ENTRY, texture_entry(2, wgpu::TextureSampleType::Sint)],
        });
        let make_pipeline = |label: &str, layout: &wgpu::BindGroupLayout, entry_point: &str, format: wgpu::TextureFormat| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let seed_pipeline = make_pipeline("distance_field_seed_pipeline", &source_layout, "fs_seed", SEED_FORMAT);
        let flood_pipeline = make_pipeline("distance_field_flood_pipeline", &seed_layout, "fs_flood", SEED_FORMAT);
        let resolve_pipeline =
            make_pipeline("distance_field_resolve_pipeline", &seed_layout, "fs_resolve", output_format);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            log::warn!("distance_field_effect: pipeline creation failed for {:?}: {}", output_format, err);
            return Err(DistanceFieldError::PipelineCreation { output_format, reason: err.to_string() });
        }

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        Ok(Self {
            seed_pipeline,
            flood_pipeline,
            resolve_pipeline,
            source_layout,
            seed_layout,
            params_stride: PARAMS_SIZE.div_ceil(alignment) * alignment,
            output_format,
            seeds: None,
            _tracked: tracker.map(|t| t.track(ResourceKind::Effect)),
        })
    }

    pub fn output_format(&self) -> wgpu::TextureFormat { self.output_format }

    /// Per-pass parameters, one aligned slot per pass. Each encode gets its own buffer, so
    /// several encodes recorded into one encoder keep their own sizes and steps.
    fn params_buffer(&self, device: &wgpu::Device, pass_steps: &[u32], base: PassParams) -> wgpu::Buffer {
        let stride = self.params_stride as usize;
        let mut bytes = vec![0u8; stride * pass_steps.len()];
        for (slot, &step) in pass_steps.iter().enumerate() {
            let params = PassParams { step, ..base };
            bytes[slot * stride..slot * stride + PARAMS_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&params));
        }
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("distance_field_params"),
            contents: &bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    /// Encode seed, flood and resolve passes from `source_view` into `output_view`.
    /// Both must be `width`x`height`. Returns the number of passes recorded.
    pub fn encode(
        &mut self,
        encoder: &mut CommandEncoder,
        device: &wgpu::Device,
        source_view: &wgpu::TextureView,
        output_view: &wgpu::TextureView,
        (width, height): (u32, u32),
        config: &DistanceFieldConfig,
    ) -> Result<u32> {
        // Seed pass, flood steps, resolve pass. Step 0 marks the non-flood passes.
        let pass_steps: Vec<u32> = std::iter::once(0)
            .chain(flood_steps(width, height, config.extra_pass))
            .chain(std::iter::once(0))
            .collect();
        let base = PassParams {
            size: [width, height],
            step: 0,
            seed_channel: config.seed_channel.as_u32(),
            threshold: config.threshold,
            max_distance: config.max_distance,
            distance_scale: config.distance_scale(),
            _pad: 0.0,
        };
        let params = self.params_buffer(device, &pass_steps, base);

        let seeds = SeedTargets::ensure_size(device, self.seeds.take(), width, height);
        let ping_view = seeds.ping.create_view(&Default::default());
        let pong_view = seeds.pong.create_view(&Default::default());

        let last = pass_steps.len() - 1;
        let source = self.bind(device, &self.source_layout, 0, source_view, &params);
        self.draw(encoder, "distance_field_seed", &self.seed_pipeline, &source, &ping_view, 0);
        let (mut read, mut write) = (&ping_view, &pong_view);
        for slot in 1..last {
            let bind_group = self.bind(device, &self.seed_layout, 2, read, &params);
            self.draw(encoder, "distance_field_flood", &self.flood_pipeline, &bind_group, write, slot);
            std::mem::swap(&mut read, &mut write);
        }
        let bind_group = self.bind(device, &self.seed_layout, 2, read, &params);
        self.draw(encoder, "distance_field_resolve", &self.resolve_pipeline, &bind_group, output_view, last);

        self.seeds = Some(seeds);
        Ok(pass_steps.len() as u32)
    }

    fn bind(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture_binding: u32,
        input: &wgpu::TextureView,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("distance_field_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: texture_binding,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: params,
                        offset: 0,
                        size: wgpu::BufferSize::new(PARAMS_SIZE),
                    }),
                },
            ],
        })
    }

    fn draw(
        &self,
        encoder: &mut CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        output: &wgpu::TextureView,
        slot: usize,
    ) {
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rp.set_pipeline(pipeline);
        let dynamic_offset = (slot as u64 * self.params_stride) as u32;
        rp.set_bind_group(0, bind_group, &[dynamic_offset]);
        rp.draw(0..3, 0..1);
        drop(rp);
    }
}
