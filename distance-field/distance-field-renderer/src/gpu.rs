//! Headless adapter and device request.

use crate::error::{DistanceFieldError, Result};

/// Request the default adapter and a device with default limits, blocking on wgpu's futures.
pub fn request_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
        .ok_or(DistanceFieldError::NoAdapter)?;
    let info = adapter.get_info();
    log::info!("distance field adapter: {} ({:?})", info.name, info.backend);
    pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor { label: Some("distance_field_device"), ..Default::default() },
        None,
    ))
    .map_err(|e| DistanceFieldError::DeviceCreation(e.to_string()))
}
