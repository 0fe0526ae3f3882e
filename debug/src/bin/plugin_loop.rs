//! Host loop: use effect_api types and DistanceFieldPlugin as FilterBackend (prepare + render_frame + read_output).

use effect_api::{ExtractedFrame, FilterReadback};

fn main() -> Result<(), String> {
    env_logger::init();
    let (device, queue) = distance_field_renderer::request_device().map_err(|e| e.to_string())?;
    let mut backend: Box<dyn FilterReadback> = Box::new(distance_field_bridge::DistanceFieldPlugin::new(device, queue)?);

    // A ring that shrinks over a few frames.
    let (width, height) = (64u32, 48u32);
    for frame_id in 0..4u64 {
        let outer = 20.0 - frame_id as f32 * 3.0;
        let inner = outer * 0.5;
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 - width as f32 / 2.0;
                let dy = y as f32 - height as f32 / 2.0;
                let r = (dx * dx + dy * dy).sqrt();
                let a = if r <= outer && r >= inner { 255 } else { 0 };
                pixels.extend_from_slice(&[255, 255, 255, a]);
            }
        }
        backend.prepare(&ExtractedFrame::new(frame_id, width, height, pixels));
        backend.render_frame()?;
        let image = backend.read_output()?.ok_or("no output after render_frame")?;
        let center = image.signed_distance(width / 2, height / 2).ok_or("center out of range")?;
        println!("frame {}: signed distance at center = {:.2}", image.frame_id, center);
    }
    println!("distance field plugin_loop: OK");
    Ok(())
}
