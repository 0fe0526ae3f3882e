//! Texture readback with row padding stripped, plus decoding of field texels.

use futures_intrusive::channel::shared::oneshot_channel;
use half::f16;

use crate::error::{DistanceFieldError, Result};
use crate::render_target::RenderTarget;

fn bytes_per_pixel(format: wgpu::TextureFormat) -> Result<usize> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Ok(4),
        wgpu::TextureFormat::Rgba16Float => Ok(8),
        wgpu::TextureFormat::Rgba32Float => Ok(16),
        other => Err(DistanceFieldError::Readback(format!("unsupported readback format {other:?}"))),
    }
}

/// Copy mip 0 of `texture` to the CPU. Rows are tightly packed in the result.
pub fn read_texture_tight(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Result<Vec<u8>> {
    let (width, height) = (texture.width(), texture.height());
    if texture.sample_count() != 1 {
        return Err(DistanceFieldError::Multisampled(texture.sample_count()));
    }
    if !texture.usage().contains(wgpu::TextureUsages::COPY_SRC) {
        return Err(DistanceFieldError::Readback("texture lacks COPY_SRC usage".to_string()));
    }
    let tight_bpr = bytes_per_pixel(texture.format())? * width as usize;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    let padded_bpr = tight_bpr.div_ceil(align) * align;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("distance_field_readback_staging"),
        size: (padded_bpr * height as usize) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("distance_field_readback"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    pollster::block_on(receiver.receive())
        .ok_or_else(|| DistanceFieldError::Readback("map_async callback channel dropped".to_string()))?
        .map_err(|e| DistanceFieldError::Readback(e.to_string()))?;

    let data = slice.get_mapped_range();
    let mut tight = vec![0u8; tight_bpr * height as usize];
    for row in 0..height as usize {
        let src = row * padded_bpr;
        let dst = row * tight_bpr;
        tight[dst..dst + tight_bpr].copy_from_slice(&data[src..src + tight_bpr]);
    }
    drop(data);
    staging.unmap();
    Ok(tight)
}

/// Decode tightly packed texels into RGBA f32. Unorm channels map to [0, 1].
pub fn decode_texels(bytes: &[u8], format: wgpu::TextureFormat) -> Result<Vec<[f32; 4]>> {
    let bpp = bytes_per_pixel(format)?;
    if bytes.len() % bpp != 0 {
        return Err(DistanceFieldError::Readback(format!(
            "{} bytes is not a whole number of {:?} texels",
            bytes.len(),
            format
        )));
    }
    let texels = bytes
        .chunks_exact(bpp)
        .map(|px| match bpp {
            4 => [0usize, 1, 2, 3].map(|i| px[i] as f32 / 255.0),
            8 => [0usize, 1, 2, 3].map(|i| f16::from_le_bytes([px[2 * i], px[2 * i + 1]]).to_f32()),
            _ => [0usize, 1, 2, 3].map(|i| {
                f32::from_le_bytes([px[4 * i], px[4 * i + 1], px[4 * i + 2], px[4 * i + 3]])
            }),
        })
        .collect();
    Ok(texels)
}

/// Read the current contents of a render target as RGBA f32 texels, row-major.
pub fn read_field(device: &wgpu::Device, queue: &wgpu::Queue, target: &RenderTarget) -> Result<Vec<[f32; 4]>> {
    let texture = target
        .texture()
        .ok_or_else(|| DistanceFieldError::Readback(format!("{} has no backing texture yet", target.label())))?;
    let bytes = read_texture_tight(device, queue, &texture)?;
    decode_texels(&bytes, texture.format())
}
