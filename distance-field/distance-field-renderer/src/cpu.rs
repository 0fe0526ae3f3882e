//! CPU jump flood: same seed/flood/resolve passes as the GPU effect, for hosts
//! without an adapter and for checking GPU output.

use crate::config::{DistanceFieldConfig, SeedChannel};
use crate::effect::flood_steps;
use crate::error::Result;
use crate::upload::check_rgba8_len;

const NONE: [i32; 2] = [-1, -1];

fn seed_value(px: &[u8], channel: SeedChannel) -> f32 {
    let c = |i: usize| px[i] as f32 / 255.0;
    match channel {
        SeedChannel::Alpha => c(3),
        SeedChannel::Luminance => c(0) * 0.2126 + c(1) * 0.7152 + c(2) * 0.0722,
    }
}

fn dist2(a: [i32; 2], p: [i32; 2]) -> i32 {
    let (dx, dy) = (a[0] - p[0], a[1] - p[1]);
    dx * dx + dy * dy
}

fn nearer(best: [i32; 2], cand: [i32; 2], p: [i32; 2]) -> [i32; 2] {
    if cand[0] < 0 {
        return best;
    }
    if best[0] < 0 || dist2(cand, p) < dist2(best, p) {
        return cand;
    }
    best
}

/// Compute the distance field of an RGBA8 image. Output texels match the GPU resolve pass:
/// `[to_inside, to_outside, signed, inside_mask]`, row-major.
pub fn distance_field(pixels: &[u8], width: u32, height: u32, config: &DistanceFieldConfig) -> Result<Vec<[f32; 4]>> {
    config.validate()?;
    check_rgba8_len(pixels, width, height)?;
    let (w, h) = (width as usize, height as usize);

    // seeds[i] = (nearest inside, nearest outside)
    let mut seeds: Vec<([i32; 2], [i32; 2])> = pixels
        .chunks_exact(4)
        .enumerate()
        .map(|(i, px)| {
            let p = [(i % w) as i32, (i / w) as i32];
            if seed_value(px, config.seed_channel) >= config.threshold { (p, NONE) } else { (NONE, p) }
        })
        .collect();

    let mut next = seeds.clone();
    for step in flood_steps(width, height, config.extra_pass) {
        let step = step as isize;
        for y in 0..h {
            for x in 0..w {
                let p = [x as i32, y as i32];
                let (mut inside, mut outside) = seeds[y * w + x];
                for dy in -1isize..=1 {
                    for dx in -1isize..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let qx = x as isize + dx * step;
                        let qy = y as isize + dy * step;
                        if qx < 0 || qy < 0 || qx >= w as isize || qy >= h as isize {
                            continue;
                        }
                        let (si, so) = seeds[qy as usize * w + qx as usize];
                        inside = nearer(inside, si, p);
                        outside = nearer(outside, so, p);
                    }
                }
                next[y * w + x] = (inside, outside);
            }
        }
        std::mem::swap(&mut seeds, &mut next);
    }

    let k = config.distance_scale();
    let resolve = |seed: [i32; 2], p: [i32; 2]| {
        if seed[0] < 0 { config.max_distance } else { (dist2(seed, p) as f32).sqrt().min(config.max_distance) }
    };
    let texels = seeds
        .iter()
        .enumerate()
        .map(|(i, &(inside, outside))| {
            let p = [(i % w) as i32, (i / w) as i32];
            let to_inside = resolve(inside, p);
            let to_outside = resolve(outside, p);
            let mask = if inside[0] >= 0 && to_inside == 0.0 { 1.0 } else { 0.0 };
            [to_inside * k, to_outside * k, (to_inside - to_outside) * k, mask]
        })
        .collect();
    Ok(texels)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DistanceFieldError;

    /// RGBA8 image, opaque where `inside(x, y)`.
    pub(crate) fn mask_image(width: u32, height: u32, inside: impl Fn(u32, u32) -> bool) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let a = if inside(x, y) { 255 } else { 0 };
                pixels.extend_from_slice(&[255, 255, 255, a]);
            }
        }
        pixels
    }

    /// Exact nearest-texel distances by exhaustive search.
    pub(crate) fn brute_force(width: u32, height: u32, inside: impl Fn(u32, u32) -> bool) -> Vec<(f32, f32)> {
        let mut out = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let mut to_inside = f32::MAX;
                let mut to_outside = f32::MAX;
                for qy in 0..height {
                    for qx in 0..width {
                        let d = ((qx as f32 - x as f32).powi(2) + (qy as f32 - y as f32).powi(2)).sqrt();
                        if inside(qx, qy) {
                            to_inside = to_inside.min(d);
                        } else {
                            to_outside = to_outside.min(d);
                        }
                    }
                }
                out.push((to_inside, to_outside));
            }
        }
        out
    }

    #[test]
    fn single_seed_is_exact() {
        let inside = |x: u32, y: u32| x == 3 && y == 2;
        let pixels = mask_image(8, 6, inside);
        let field = distance_field(&pixels, 8, 6, &DistanceFieldConfig::default()).unwrap();
        for (texel, (ti, to)) in field.iter().zip(brute_force(8, 6, inside)) {
            assert!((texel[0] - ti).abs() < 1e-5, "{texel:?} vs {ti}");
            assert!((texel[1] - to).abs() < 1e-5, "{texel:?} vs {to}");
        }
        assert_eq!(field[2 * 8 + 3][3], 1.0);
        assert_eq!(field[0][3], 0.0);
    }

    #[test]
    fn disc_matches_brute_force_closely() {
        let inside = |x: u32, y: u32| {
            let (dx, dy) = (x as f32 - 15.5, y as f32 - 11.0);
            dx * dx + dy * dy <= 36.0
        };
        let pixels = mask_image(32, 24, inside);
        let field = distance_field(&pixels, 32, 24, &DistanceFieldConfig::default()).unwrap();
        for (texel, (ti, to)) in field.iter().zip(brute_force(32, 24, inside)) {
            assert!((texel[0] - ti).abs() <= 1.0, "inside distance {} vs {}", texel[0], ti);
            assert!((texel[1] - to).abs() <= 1.0, "outside distance {} vs {}", texel[1], to);
            assert!((texel[2] - (texel[0] - texel[1])).abs() < 1e-5);
        }
    }

    #[test]
    fn signed_channel_is_negative_inside() {
        let pixels = mask_image(9, 9, |x, y| (3..6).contains(&x) && (3..6).contains(&y));
        let field = distance_field(&pixels, 9, 9, &DistanceFieldConfig::default()).unwrap();
        let center = field[4 * 9 + 4];
        assert_eq!(center[0], 0.0);
        assert_eq!(center[1], 2.0);
        assert_eq!(center[2], -2.0);
        let corner = field[0];
        assert!((corner[0] - 18f32.sqrt()).abs() < 1e-5);
        assert!(corner[2] > 0.0);
    }

    #[test]
    fn empty_image_reports_max_distance() {
        let config = DistanceFieldConfig { max_distance: 10.0, ..Default::default() };
        let pixels = mask_image(4, 4, |_, _| false);
        let field = distance_field(&pixels, 4, 4, &config).unwrap();
        assert!(field.iter().all(|t| *t == [10.0, 0.0, 10.0, 0.0]));
    }

    #[test]
    fn normalize_and_clamp() {
        let config = DistanceFieldConfig { max_distance: 2.0, normalize: true, ..Default::default() };
        let pixels = mask_image(8, 1, |x, _| x == 0);
        let field = distance_field(&pixels, 8, 1, &config).unwrap();
        assert_eq!(field[1][0], 0.5);
        assert_eq!(field[7][0], 1.0);
        assert_eq!(field[0][1], 0.5);
    }

    #[test]
    fn luminance_channel_seeds_on_brightness() {
        let config = DistanceFieldConfig { seed_channel: SeedChannel::Luminance, ..Default::default() };
        // opaque black then transparent white: luminance ignores alpha
        let pixels = [0, 0, 0, 255, 255, 255, 255, 0];
        let field = distance_field(&pixels, 2, 1, &config).unwrap();
        assert_eq!(field[0][3], 0.0);
        assert_eq!(field[1][3], 1.0);
    }

    #[test]
    fn rejects_bad_input() {
        let config = DistanceFieldConfig::default();
        assert!(matches!(
            distance_field(&[0u8; 8], 3, 1, &config),
            Err(DistanceFieldError::PixelCount { .. })
        ));
        let bad = DistanceFieldConfig { threshold: -1.0, ..Default::default() };
        assert!(matches!(
            distance_field(&[0u8; 4], 1, 1, &bad),
            Err(DistanceFieldError::InvalidConfig(_))
        ));
    }
}
