//! Minimal wgpu init (no window). Verifies distance-field-renderer and wgpu work.

fn main() -> Result<(), String> {
    env_logger::init();
    let (device, queue) = distance_field_renderer::request_device().map_err(|e| e.to_string())?;
    log::info!("device limits: max 2D texture {}", device.limits().max_texture_dimension_2d);
    let generator = distance_field_renderer::DistanceFieldGenerator2D::new(device, queue).map_err(|e| e.to_string())?;
    log::info!("output format {:?}", generator.config().output_format);
    println!("distance field minimal_wgpu: OK");
    Ok(())
}
