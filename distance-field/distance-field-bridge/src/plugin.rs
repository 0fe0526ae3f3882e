//! Distance field plugin: implements FilterBackend for the host.

use std::sync::Arc;

use distance_field_renderer::{upload, DistanceFieldConfig, DistanceFieldGenerator2D, RenderTarget};
use effect_api::{ExtractedFrame, FieldImage, FilterBackend, FilterReadback};

/// GPU copy of the last prepared frame. Reused while the frame size is unchanged.
struct CachedSource {
    texture: wgpu::Texture,
    frame_id: u64,
}

/// Owns the generator (and through it the wgpu device/queue); implements FilterBackend.
pub struct DistanceFieldPlugin {
    generator: DistanceFieldGenerator2D,
    source: Option<CachedSource>,
    output: Option<(Arc<RenderTarget>, u64)>,
}

impl DistanceFieldPlugin {
    /// Create with wgpu device and queue (default config).
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, String> {
        Self::new_with_config(device, queue, DistanceFieldConfig::default())
    }

    pub fn new_with_config(device: wgpu::Device, queue: wgpu::Queue, config: DistanceFieldConfig) -> Result<Self, String> {
        let generator = DistanceFieldGenerator2D::new_with_config(device, queue, config).map_err(|e| e.to_string())?;
        Ok(Self { generator, source: None, output: None })
    }

    pub fn device(&self) -> &wgpu::Device {
        self.generator.device()
    }
    pub fn queue(&self) -> &wgpu::Queue {
        self.generator.queue()
    }
    pub fn generator(&self) -> &DistanceFieldGenerator2D {
        &self.generator
    }

    /// Shared render target holding the last output, for hosts that sample it on the GPU.
    pub fn output(&self) -> Option<Arc<RenderTarget>> {
        self.output.as_ref().map(|(rt, _)| Arc::clone(rt))
    }

    fn upload(&mut self, frame: &ExtractedFrame) -> Result<(), String> {
        if let Some(cached) = self.source.as_mut() {
            if cached.texture.width() == frame.width && cached.texture.height() == frame.height {
                upload::write_rgba8(self.generator.queue(), &cached.texture, &frame.pixels).map_err(|e| e.to_string())?;
                cached.frame_id = frame.frame_id;
                return Ok(());
            }
        }
        let texture = upload::upload_rgba8(
            self.generator.device(),
            self.generator.queue(),
            &frame.pixels,
            frame.width,
            frame.height,
            "distance_field_plugin_source",
        )
        .map_err(|e| e.to_string())?;
        self.source = Some(CachedSource { texture, frame_id: frame.frame_id });
        Ok(())
    }
}

impl FilterBackend for DistanceFieldPlugin {
    /// A malformed frame or a failed upload drops the cached source, so the next
    /// `render_frame` fails instead of re-rendering the previous frame under its old id.
    fn prepare(&mut self, frame: &ExtractedFrame) {
        if !frame.is_well_formed() {
            log::warn!(
                "distance_field_plugin: skipping frame {} ({}x{}, {} bytes)",
                frame.frame_id,
                frame.width,
                frame.height,
                frame.pixels.len()
            );
            self.source = None;
            return;
        }
        if let Err(e) = self.upload(frame) {
            log::warn!("distance_field_plugin: upload of frame {} failed: {}", frame.frame_id, e);
            self.source = None;
        }
    }

    fn render_frame(&mut self) -> Result<(), String> {
        let source = self.source.as_ref().ok_or("render_frame: no frame (call prepare first)")?;
        let rt = self.generator.generate(&source.texture).map_err(|e| e.to_string())?;
        self.output = Some((rt, source.frame_id));
        Ok(())
    }
}

impl FilterReadback for DistanceFieldPlugin {
    fn read_output(&mut self) -> Result<Option<FieldImage>, String> {
        let Some((rt, frame_id)) = self.output.as_ref() else {
            return Ok(None);
        };
        let (width, height) = rt.size().ok_or("read_output: render target has no texture")?;
        let texels = self.generator.read_back().map_err(|e| e.to_string())?;
        Ok(Some(FieldImage { frame_id: *frame_id, width, height, texels }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin() -> Option<DistanceFieldPlugin> {
        let (device, queue) = distance_field_renderer::request_device().ok()?;
        Some(DistanceFieldPlugin::new(device, queue).expect("plugin"))
    }

    fn square_frame(frame_id: u64, size: u32, lo: u32, hi: u32) -> ExtractedFrame {
        let mut pixels = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let inside = (lo..hi).contains(&x) && (lo..hi).contains(&y);
                pixels.extend_from_slice(&[0, 0, 0, if inside { 255 } else { 0 }]);
            }
        }
        ExtractedFrame::new(frame_id, size, size, pixels)
    }

    #[test]
    fn render_without_prepare_fails() {
        let Some(mut plugin) = plugin() else {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        };
        assert!(plugin.render_frame().is_err());
        assert_eq!(plugin.read_output().expect("read"), None);
    }

    #[test]
    fn malformed_frame_is_skipped() {
        let Some(mut plugin) = plugin() else {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        };
        plugin.prepare(&ExtractedFrame::new(7, 4, 4, vec![0; 3]));
        assert!(plugin.render_frame().is_err());
    }

    #[test]
    fn frame_loop_produces_field() {
        let Some(mut plugin) = plugin() else {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        };
        let frame = square_frame(1, 12, 4, 8);
        plugin.prepare(&frame);
        plugin.render_frame().expect("render");
        let image = plugin.read_output().expect("read").expect("output");
        assert_eq!((image.frame_id, image.width, image.height), (1, 12, 12));
        let expected = distance_field_renderer::cpu::distance_field(&frame.pixels, 12, 12, plugin.generator().config())
            .expect("cpu");
        for (gpu, cpu) in image.texels.iter().zip(&expected) {
            assert!((gpu[2] - cpu[2]).abs() < 2e-2, "gpu {gpu:?} cpu {cpu:?}");
        }
        assert!(image.signed_distance(6, 6).expect("center") < 0.0);
        assert!(image.signed_distance(0, 0).expect("corner") > 0.0);

        // Same size: source texture and render target are reused.
        let rt = plugin.output().expect("rt");
        plugin.prepare(&square_frame(2, 12, 0, 2));
        plugin.render_frame().expect("render");
        assert!(Arc::ptr_eq(&rt, &plugin.output().expect("rt")));
        assert_eq!(plugin.read_output().expect("read").expect("output").frame_id, 2);
        assert_eq!(rt.generation(), 2);
    }

    #[test]
    fn malformed_frame_after_valid_one_does_not_rerender_stale_source() {
        let Some(mut plugin) = plugin() else {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        };
        plugin.prepare(&square_frame(1, 8, 2, 6));
        plugin.render_frame().expect("render");
        let rt = plugin.output().expect("rt");

        plugin.prepare(&ExtractedFrame::new(2, 8, 8, vec![0; 5]));
        assert!(plugin.render_frame().is_err());
        // The last real output is still reported under its own frame id.
        assert_eq!(plugin.read_output().expect("read").expect("output").frame_id, 1);
        assert_eq!(rt.generation(), 1);

        // A later valid frame renders normally.
        plugin.prepare(&square_frame(3, 8, 0, 4));
        plugin.render_frame().expect("render");
        assert_eq!(plugin.read_output().expect("read").expect("output").frame_id, 3);
    }
}
