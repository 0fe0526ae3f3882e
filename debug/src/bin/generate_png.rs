//! Generate a distance field from a PNG and write it as a grayscale visualization.
//! Run from repo root: cargo run -p debug --bin generate_png -- input.png output.png [max_distance] [--cpu]
//! Inside maps above mid-gray, outside below; `--cpu` (or no adapter) uses the CPU jump flood.

use std::path::Path;

use distance_field_renderer::{
    cpu, request_device, upload_rgba8, DistanceFieldConfig, DistanceFieldError, DistanceFieldGenerator2D,
};

fn load_image_rgba(path: &Path) -> Result<(Vec<u8>, u32, u32), String> {
    let img = image::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    Ok((rgba.into_raw(), w, h))
}

fn generate_gpu(pixels: &[u8], width: u32, height: u32, config: DistanceFieldConfig) -> Result<Option<Vec<[f32; 4]>>, String> {
    let (device, queue) = match request_device() {
        Ok(pair) => pair,
        Err(DistanceFieldError::NoAdapter) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut generator = DistanceFieldGenerator2D::new_with_config(device, queue, config).map_err(|e| e.to_string())?;
    let source = upload_rgba8(generator.device(), generator.queue(), pixels, width, height, "generate_png_source")
        .map_err(|e| e.to_string())?;
    generator.generate(&source).map_err(|e| e.to_string())?;
    generator.read_back().map(Some).map_err(|e| e.to_string())
}

fn main() -> Result<(), String> {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let force_cpu = args.iter().any(|a| a == "--cpu");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let (input, output) = match positional.as_slice() {
        [input, output, ..] => (Path::new(input.as_str()), Path::new(output.as_str())),
        _ => return Err("usage: generate_png <input.png> <output.png> [max_distance] [--cpu]".to_string()),
    };
    let max_distance = match positional.get(2) {
        Some(s) => s.parse::<f32>().map_err(|e| format!("max_distance {s:?}: {e}"))?,
        None => 32.0,
    };
    let config = DistanceFieldConfig { max_distance, normalize: true, ..Default::default() };
    config.validate().map_err(|e| e.to_string())?;

    let (pixels, width, height) = load_image_rgba(input)?;
    let field = if force_cpu {
        None
    } else {
        generate_gpu(&pixels, width, height, config.clone())?
    };
    let field = match field {
        Some(f) => f,
        None => {
            log::info!("running CPU jump flood");
            cpu::distance_field(&pixels, width, height, &config).map_err(|e| e.to_string())?
        }
    };

    // signed is normalized to [-1, 1]; inside (negative) maps to bright.
    let gray: Vec<u8> = field
        .iter()
        .map(|t| ((0.5 - t[2] * 0.5).clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let out = image::GrayImage::from_raw(width, height, gray).ok_or("visualization buffer size mismatch")?;
    out.save(output).map_err(|e| format!("{}: {}", output.display(), e))?;
    println!("distance field {}x{} -> {}", width, height, output.display());
    Ok(())
}
