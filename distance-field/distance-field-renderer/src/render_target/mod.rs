//! Shared render target: a GPU surface the generator draws into and callers sample.
//!
//! The target object lives as long as any `Arc<RenderTarget>` does. Its backing
//! texture is itself an `Arc<wgpu::Texture>`, swapped only when the requested
//! size changes, so a caller holding an older texture keeps it alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{DistanceFieldError, Result};
use crate::tracker::{ResourceKind, ResourceTracker, TrackedResource};

struct Attachment {
    texture: Arc<wgpu::Texture>,
    width: u32,
    height: u32,
}

pub struct RenderTarget {
    label: String,
    format: wgpu::TextureFormat,
    attachment: RwLock<Option<Attachment>>,
    generation: AtomicU64,
    tracked: Option<TrackedResource>,
}

impl RenderTarget {
    /// Create an empty target. The backing texture is allocated by the first `ensure_size`.
    pub fn new(label: impl Into<String>, format: wgpu::TextureFormat) -> Self {
        Self::new_tracked(label, format, None)
    }

    pub(crate) fn new_tracked(
        label: impl Into<String>,
        format: wgpu::TextureFormat,
        tracker: Option<&ResourceTracker>,
    ) -> Self {
        Self {
            label: label.into(),
            format,
            attachment: RwLock::new(None),
            generation: AtomicU64::new(0),
            tracked: tracker.map(|t| t.track(ResourceKind::RenderTarget)),
        }
    }

    pub fn label(&self) -> &str { &self.label }
    pub fn format(&self) -> wgpu::TextureFormat { self.format }

    /// Number of generations encoded into this target. Advances when passes are recorded, before the GPU runs them.
    pub fn generation(&self) -> u64 { self.generation.load(Ordering::Acquire) }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.read().as_ref().map(|a| (a.width, a.height))
    }

    pub fn texture(&self) -> Option<Arc<wgpu::Texture>> {
        self.read().as_ref().map(|a| Arc::clone(&a.texture))
    }

    pub fn view(&self) -> Option<wgpu::TextureView> {
        self.read().as_ref().map(|a| a.texture.create_view(&Default::default()))
    }

    /// Return the backing texture for `width`x`height`, reallocating only when the size differs.
    pub fn ensure_size(&self, device: &wgpu::Device, width: u32, height: u32) -> Result<Arc<wgpu::Texture>> {
        if width == 0 || height == 0 {
            return Err(DistanceFieldError::EmptyTexture { width, height });
        }
        let mut attachment = self.write();
        if let Some(a) = attachment.as_ref() {
            if a.width == width && a.height == height {
                return Ok(Arc::clone(&a.texture));
            }
        }
        log::debug!("{}: allocating {}x{} {:?}", self.label, width, height, self.format);
        let texture = Arc::new(device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        }));
        if let Some(tracked) = &self.tracked {
            tracked.tracker().record_texture_allocation();
        }
        *attachment = Some(Attachment { texture: Arc::clone(&texture), width, height });
        Ok(texture)
    }

    pub(crate) fn mark_rendered(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Attachment>> {
        self.attachment.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Attachment>> {
        self.attachment.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTarget")
            .field("label", &self.label)
            .field("format", &self.format)
            .field("size", &self.size())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let rt = RenderTarget::new("rt", wgpu::TextureFormat::Rgba32Float);
        assert_eq!(rt.size(), None);
        assert!(rt.texture().is_none());
        assert!(rt.view().is_none());
        assert_eq!(rt.generation(), 0);
        assert_eq!(rt.format(), wgpu::TextureFormat::Rgba32Float);
    }

    #[test]
    fn mark_rendered_counts() {
        let rt = RenderTarget::new("rt", wgpu::TextureFormat::Rgba16Float);
        assert_eq!(rt.mark_rendered(), 1);
        assert_eq!(rt.mark_rendered(), 2);
        assert_eq!(rt.generation(), 2);
    }

    #[test]
    fn tracked_target_releases_on_drop() {
        let tracker = ResourceTracker::new();
        let rt = RenderTarget::new_tracked("rt", wgpu::TextureFormat::Rgba32Float, Some(&tracker));
        assert_eq!(tracker.live_render_targets(), 1);
        drop(rt);
        assert_eq!(tracker.live_render_targets(), 0);
    }

    #[test]
    fn reallocates_only_on_resize() {
        let Some((device, _queue)) = crate::test_support::device() else {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        };
        let tracker = ResourceTracker::new();
        let rt = RenderTarget::new_tracked("rt", wgpu::TextureFormat::Rgba32Float, Some(&tracker));
        let first = rt.ensure_size(&device, 16, 8).expect("alloc");
        let again = rt.ensure_size(&device, 16, 8).expect("reuse");
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(tracker.texture_allocations(), 1);
        let resized = rt.ensure_size(&device, 32, 8).expect("resize");
        assert!(!Arc::ptr_eq(&first, &resized));
        assert_eq!(tracker.texture_allocations(), 2);
        assert_eq!(rt.size(), Some((32, 8)));
        // The old texture survives while someone holds it.
        assert_eq!(first.width(), 16);
        assert!(matches!(
            rt.ensure_size(&device, 0, 8),
            Err(DistanceFieldError::EmptyTexture { .. })
        ));
    }
}
