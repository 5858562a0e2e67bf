use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Non-local-means denoising for grayscale buffers.
///
/// For every pixel, patches inside the search window are compared against
/// the patch around the pixel; similar patches contribute their center
/// value with a weight of `exp(-distance / strength^2)`. A `strength` of
/// zero returns the image unchanged.
pub fn non_local_means(
    image: &GrayImage,
    strength: f32,
    template_window: u32,
    search_window: u32,
) -> GrayImage {
    if strength <= 0.0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let luma: Vec<f32> = image.as_raw().iter().map(|&v| v as f32).collect();

    let patch_radius = (template_window / 2) as i32;
    let search_radius = (search_window / 2) as i32;
    let h2 = strength * strength;

    let mut out = vec![0u8; (w * h) as usize];
    out.par_chunks_mut(w as usize).enumerate().for_each(|(y, row)| {
        for (x, slot) in row.iter_mut().enumerate() {
            let (x, y) = (x as i32, y as i32);
            let mut acc = 0.0f32;
            let mut weight_sum = 0.0f32;
            for sy in -search_radius..=search_radius {
                for sx in -search_radius..=search_radius {
                    let d = patch_distance(&luma, w, h, x, y, x + sx, y + sy, patch_radius);
                    let weight = (-d / h2).exp();
                    acc += weight * sample(&luma, w, h, x + sx, y + sy);
                    weight_sum += weight;
                }
            }
            *slot = (acc / weight_sum).round().clamp(0.0, 255.0) as u8;
        }
    });

    GrayImage::from_raw(w, h, out).expect("output buffer matches source dimensions")
}

/// Non-local-means denoising for color buffers.
///
/// Patch similarity is judged on luma with `strength`; candidate pixels are
/// additionally down-weighted by their color distance from the center pixel,
/// scaled by `color_strength`. The shared weights are then applied to all
/// three channels, which keeps chroma edges aligned with luma edges.
pub fn non_local_means_color(
    image: &RgbImage,
    strength: f32,
    color_strength: f32,
    template_window: u32,
    search_window: u32,
) -> RgbImage {
    if strength <= 0.0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let luma: Vec<f32> = image
        .pixels()
        .map(|p| 0.2126 * p.0[0] as f32 + 0.7152 * p.0[1] as f32 + 0.0722 * p.0[2] as f32)
        .collect();

    let patch_radius = (template_window / 2) as i32;
    let search_radius = (search_window / 2) as i32;
    let h2 = strength * strength;
    let hc2 = if color_strength > 0.0 {
        color_strength * color_strength
    } else {
        h2
    };

    let clamp_px = |x: i32, y: i32| {
        let cx = x.clamp(0, w as i32 - 1) as u32;
        let cy = y.clamp(0, h as i32 - 1) as u32;
        image.get_pixel(cx, cy).0
    };

    let mut out = vec![0u8; (w * h * 3) as usize];
    out.par_chunks_mut((w * 3) as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w as usize {
                let (xi, yi) = (x as i32, y as i32);
                let center = clamp_px(xi, yi);
                let mut acc = [0.0f32; 3];
                let mut weight_sum = 0.0f32;
                for sy in -search_radius..=search_radius {
                    for sx in -search_radius..=search_radius {
                        let d =
                            patch_distance(&luma, w, h, xi, yi, xi + sx, yi + sy, patch_radius);
                        let candidate = clamp_px(xi + sx, yi + sy);
                        let color_d = center
                            .iter()
                            .zip(candidate.iter())
                            .map(|(&a, &b)| {
                                let diff = a as f32 - b as f32;
                                diff * diff
                            })
                            .sum::<f32>()
                            / 3.0;
                        let weight = (-d / h2).exp() * (-color_d / hc2).exp();
                        for c in 0..3 {
                            acc[c] += weight * candidate[c] as f32;
                        }
                        weight_sum += weight;
                    }
                }
                for c in 0..3 {
                    row[x * 3 + c] =
                        (acc[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    RgbImage::from_raw(w, h, out).expect("output buffer matches source dimensions")
}

fn sample(plane: &[f32], w: u32, h: u32, x: i32, y: i32) -> f32 {
    let cx = x.clamp(0, w as i32 - 1) as usize;
    let cy = y.clamp(0, h as i32 - 1) as usize;
    plane[cy * w as usize + cx]
}

/// Mean squared difference between the patches centered at (x0, y0) and
/// (x1, y1), with clamped borders.
fn patch_distance(
    plane: &[f32],
    w: u32,
    h: u32,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    radius: i32,
) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let a = sample(plane, w, h, x0 + dx, y0 + dy);
            let b = sample(plane, w, h, x1 + dx, y1 + dy);
            sum += (a - b) * (a - b);
            count += 1;
        }
    }
    sum / count as f32
}
