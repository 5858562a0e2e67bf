pub mod blur;
pub mod denoise;
pub mod edges;

use image::{GrayImage, Luma, RgbImage};

/// Split an RGB buffer into its three single-channel planes.
///
/// Several `imageproc` primitives only accept `GrayImage`; running them
/// per channel and reassembling is equivalent for linear, per-channel
/// filters.
pub(crate) fn split_channels(image: &RgbImage) -> [GrayImage; 3] {
    let (w, h) = image.dimensions();
    std::array::from_fn(|c| GrayImage::from_fn(w, h, |x, y| Luma([image.get_pixel(x, y).0[c]])))
}

pub(crate) fn merge_channels(channels: &[GrayImage; 3]) -> RgbImage {
    let (w, h) = channels[0].dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([
            channels[0].get_pixel(x, y).0[0],
            channels[1].get_pixel(x, y).0[0],
            channels[2].get_pixel(x, y).0[0],
        ])
    })
}
