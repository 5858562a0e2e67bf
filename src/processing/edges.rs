use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::definitions::Clamp;
use imageproc::filter::Kernel;

/// Canny edge map over the luma of `image`.
///
/// Output is binary: 255 on edge pixels, 0 elsewhere. Caller must ensure
/// `threshold1 < threshold2`.
pub fn canny_edges(image: &RgbImage, threshold1: f32, threshold2: f32) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(image.clone()).to_luma8();
    imageproc::edges::canny(&gray, threshold1, threshold2)
}

/// Sobel gradient map over the luma of `image` at the given aperture.
///
/// `dx`/`dy` select the derivative direction; when both are set the output
/// is the gradient magnitude. A `kernel_size` of 1 uses the bare 3-tap
/// derivative with no cross smoothing. Values saturate at 255, matching an
/// 8-bit destination depth.
pub fn sobel(image: &RgbImage, dx: bool, dy: bool, kernel_size: u32) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(image.clone()).to_luma8();
    let (w, h) = gray.dimensions();

    let deriv = derivative_kernel(kernel_size);
    let smooth = smoothing_kernel(kernel_size);
    let gx = dx.then(|| separable_response(&gray, &deriv, &smooth));
    let gy = dy.then(|| separable_response(&gray, &smooth, &deriv));

    GrayImage::from_fn(w, h, |x, y| {
        let vx = gx.as_ref().map_or(0.0, |m| m.get_pixel(x, y).0[0]);
        let vy = gy.as_ref().map_or(0.0, |m| m.get_pixel(x, y).0[0]);
        let magnitude = if gx.is_some() && gy.is_some() {
            (vx * vx + vy * vy).sqrt()
        } else {
            vx.abs().max(vy.abs())
        };
        Luma([magnitude.min(255.0) as u8])
    })
}

/// Laplacian response map over the luma of `image` at the given aperture,
/// absolute value saturated at 255. A `kernel_size` of 1 uses the classic
/// 3x3 cross.
pub fn laplacian(image: &RgbImage, kernel_size: u32) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(image.clone()).to_luma8();
    let (w, h) = gray.dimensions();

    let (kernel, side) = laplacian_kernel(kernel_size);
    let response: ImageBuffer<Luma<f32>, Vec<f32>> =
        Kernel::new(&kernel, side, side).filter(&gray, |channel, acc| *channel = Clamp::clamp(acc));

    GrayImage::from_fn(w, h, |x, y| {
        let v = response.get_pixel(x, y).0[0];
        Luma([v.abs().min(255.0) as u8])
    })
}

fn separable_response(
    gray: &GrayImage,
    horizontal: &[f32],
    vertical: &[f32],
) -> ImageBuffer<Luma<f32>, Vec<f32>> {
    let kernel: Vec<f32> = vertical
        .iter()
        .flat_map(|&v| horizontal.iter().map(move |&h| v * h))
        .collect();
    Kernel::new(&kernel, horizontal.len() as u32, vertical.len() as u32)
        .filter(gray, |channel, acc| *channel = Clamp::clamp(acc))
}

fn convolve(a: &[f32], b: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Binomial smoothing row of the given width: [1], [1,2,1], [1,4,6,4,1], ...
fn smoothing_kernel(kernel_size: u32) -> Vec<f32> {
    let mut k = vec![1.0];
    while k.len() < kernel_size as usize {
        k = convolve(&k, &[1.0, 1.0]);
    }
    k
}

/// First-derivative row at the given aperture: [-1,0,1] widened by binomial
/// smoothing, so 5 gives [-1,-2,0,2,1]. An aperture of 1 keeps the bare
/// 3-tap derivative.
fn derivative_kernel(kernel_size: u32) -> Vec<f32> {
    let mut k = vec![-1.0, 0.0, 1.0];
    while k.len() < kernel_size as usize {
        k = convolve(&k, &[1.0, 2.0, 1.0]);
    }
    k
}

fn second_derivative_kernel(kernel_size: u32) -> Vec<f32> {
    let mut k = vec![1.0, -2.0, 1.0];
    while k.len() < kernel_size as usize {
        k = convolve(&k, &[1.0, 2.0, 1.0]);
    }
    k
}

/// Full 2D Laplacian kernel: d2/dx2 smoothed vertically plus d2/dy2
/// smoothed horizontally. Row-major data and the square side length.
fn laplacian_kernel(kernel_size: u32) -> (Vec<f32>, u32) {
    let d2 = second_derivative_kernel(kernel_size);
    let smooth = smoothing_kernel(kernel_size);
    let side = d2.len();
    let offset = (side - smooth.len()) / 2;

    let mut kernel = vec![0.0; side * side];
    for (r, &sv) in smooth.iter().enumerate() {
        for (c, &dv) in d2.iter().enumerate() {
            kernel[(r + offset) * side + c] += sv * dv;
        }
    }
    for (r, &dv) in d2.iter().enumerate() {
        for (c, &sv) in smooth.iter().enumerate() {
            kernel[r * side + c + offset] += dv * sv;
        }
    }
    (kernel, side as u32)
}
