use image::RgbImage;
use imageproc::filter::{bilateral_filter, box_filter, gaussian_blur_f32, median_filter};

use super::{merge_channels, split_channels};

/// Normalized box blur with a square `kernel_size` x `kernel_size` window.
///
/// `imageproc::filter::box_filter` only accepts grayscale input, so the
/// image is split into channel planes, filtered, and reassembled. Box blur
/// is linear and per-channel, so the result matches filtering in color.
pub fn box_blur(image: &RgbImage, kernel_size: u32) -> RgbImage {
    let radius = kernel_size / 2;
    if radius == 0 {
        return image.clone();
    }
    let channels = split_channels(image);
    let blurred = std::array::from_fn(|c| box_filter(&channels[c], radius, radius));
    merge_channels(&blurred)
}

/// Gaussian blur.
///
/// When `sigma` is zero or negative it is derived from the kernel size the
/// way OpenCV's `getGaussianKernel` does, so a kernel-size slider alone
/// produces sensible smoothing.
pub fn gaussian_blur(image: &RgbImage, kernel_size: u32, sigma: f32) -> RgbImage {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    };
    if sigma <= 0.0 {
        return image.clone();
    }
    gaussian_blur_f32(image, sigma)
}

/// Median blur with a square `kernel_size` x `kernel_size` window.
pub fn median_blur(image: &RgbImage, kernel_size: u32) -> RgbImage {
    let radius = kernel_size / 2;
    if radius == 0 {
        return image.clone();
    }
    median_filter(image, radius, radius)
}

/// Edge-preserving bilateral filter over a `diameter`-wide neighborhood.
///
/// Runs per channel, like [`box_blur`]; `sigma_color` controls how strongly
/// intensity differences suppress mixing, `sigma_space` the spatial falloff.
/// `bilateral_filter` takes the full window width and derives the reach
/// from it, so `diameter` is passed through as-is.
pub fn bilateral_blur(
    image: &RgbImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> RgbImage {
    if diameter <= 1 {
        return image.clone();
    }
    let channels = split_channels(image);
    let filtered =
        std::array::from_fn(|c| bilateral_filter(&channels[c], diameter, sigma_color, sigma_space));
    merge_channels(&filtered)
}
