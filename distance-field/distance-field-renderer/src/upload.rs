//! Host pixel upload: RGBA8 bytes into sampled textures the generator accepts.

use crate::error::{DistanceFieldError, Result};

pub fn check_rgba8_len(pixels: &[u8], width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(DistanceFieldError::EmptyTexture { width, height });
    }
    let expected = 4 * width as usize * height as usize;
    if pixels.len() != expected {
        return Err(DistanceFieldError::PixelCount { width, height, expected, actual: pixels.len() });
    }
    Ok(())
}

/// Create an `Rgba8Unorm` source texture (TEXTURE_BINDING | COPY_DST | COPY_SRC) and fill it.
pub fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    width: u32,
    height: u32,
    label: &str,
) -> Result<wgpu::Texture> {
    check_rgba8_len(pixels, width, height)?;
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    write_rgba8(queue, &texture, pixels)?;
    Ok(texture)
}

/// Overwrite an existing RGBA8 texture's full extent.
pub fn write_rgba8(queue: &wgpu::Queue, texture: &wgpu::Texture, pixels: &[u8]) -> Result<()> {
    let (width, height) = (texture.width(), texture.height());
    check_rgba8_len(pixels, width, height)?;
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = check_rgba8_len(&[0u8; 12], 2, 2).unwrap_err();
        assert!(matches!(err, DistanceFieldError::PixelCount { expected: 16, actual: 12, .. }));
    }

    #[test]
    fn rejects_empty_extent() {
        assert!(matches!(
            check_rgba8_len(&[], 0, 4),
            Err(DistanceFieldError::EmptyTexture { width: 0, height: 4 })
        ));
    }

    #[test]
    fn accepts_exact_length() {
        assert!(check_rgba8_len(&[0u8; 24], 3, 2).is_ok());
    }
}
