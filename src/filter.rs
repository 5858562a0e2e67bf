use image::{DynamicImage, RgbImage};

use crate::error::InvalidParameters;
use crate::processing::{blur, denoise, edges};

/// One immutable snapshot of a filter selection and its parameters.
///
/// A fresh snapshot is built from the current widget values on every
/// parameter change, applied once against the pristine original buffer,
/// and discarded. Snapshotting per tick means `apply` is a pure function
/// of `(original, spec)` with no tearing between reading a slider and
/// running the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpec {
    BoxBlur {
        kernel_size: u32,
    },
    GaussianBlur {
        kernel_size: u32,
        sigma: f32,
    },
    MedianBlur {
        kernel_size: u32,
    },
    BilateralBlur {
        diameter: u32,
        sigma_color: f32,
        sigma_space: f32,
    },
    CannyEdges {
        threshold1: f32,
        threshold2: f32,
    },
    Denoise {
        strength: f32,
        template_window: u32,
        search_window: u32,
    },
    DenoiseColor {
        strength: f32,
        color_strength: f32,
        template_window: u32,
        search_window: u32,
    },
    Sobel {
        dx: bool,
        dy: bool,
        kernel_size: u32,
    },
    Laplacian {
        kernel_size: u32,
    },
}

impl FilterSpec {
    pub fn name(&self) -> &'static str {
        match self {
            FilterSpec::BoxBlur { .. } => "box blur",
            FilterSpec::GaussianBlur { .. } => "gaussian blur",
            FilterSpec::MedianBlur { .. } => "median blur",
            FilterSpec::BilateralBlur { .. } => "bilateral filter",
            FilterSpec::CannyEdges { .. } => "canny edges",
            FilterSpec::Denoise { .. } => "denoise",
            FilterSpec::DenoiseColor { .. } => "denoise (color)",
            FilterSpec::Sobel { .. } => "sobel",
            FilterSpec::Laplacian { .. } => "laplacian",
        }
    }

    /// True when the current parameter values are this filter's identity
    /// point, i.e. applying it is defined to mean "revert to original".
    ///
    /// The identity values live here, per variant, rather than being
    /// inferred from slider minimums at the call sites.
    pub fn resets_to_original(&self) -> bool {
        match *self {
            FilterSpec::BoxBlur { kernel_size }
            | FilterSpec::GaussianBlur { kernel_size, .. }
            | FilterSpec::MedianBlur { kernel_size } => kernel_size == 1,
            FilterSpec::BilateralBlur { diameter, .. } => diameter == 1,
            FilterSpec::CannyEdges {
                threshold1,
                threshold2,
            } => threshold1 == 1.0 && threshold2 == 1.0,
            FilterSpec::Denoise { strength, .. }
            | FilterSpec::DenoiseColor { strength, .. } => strength == 0.0,
            FilterSpec::Sobel { .. } | FilterSpec::Laplacian { .. } => false,
        }
    }

    /// True for filters whose output is a single-channel map that must be
    /// shown as produced instead of going through the storage-to-display
    /// color conversion.
    pub fn bypasses_display_conversion(&self) -> bool {
        matches!(
            self,
            FilterSpec::CannyEdges { .. }
                | FilterSpec::Sobel { .. }
                | FilterSpec::Laplacian { .. }
        )
    }

    fn validate(&self) -> Result<(), InvalidParameters> {
        match *self {
            FilterSpec::BoxBlur { kernel_size }
            | FilterSpec::GaussianBlur { kernel_size, .. }
            | FilterSpec::MedianBlur { kernel_size }
            | FilterSpec::Laplacian { kernel_size } => odd_kernel(self.name(), kernel_size),
            FilterSpec::BilateralBlur {
                diameter,
                sigma_color,
                sigma_space,
            } => {
                if diameter == 0 {
                    return Err(InvalidParameters::new(self.name(), "diameter must be >= 1"));
                }
                if sigma_color <= 0.0 || sigma_space <= 0.0 {
                    return Err(InvalidParameters::new(
                        self.name(),
                        "sigmas must be positive",
                    ));
                }
                Ok(())
            }
            FilterSpec::CannyEdges {
                threshold1,
                threshold2,
            } => {
                if !(threshold1 >= 0.0 && threshold2 >= 0.0) {
                    return Err(InvalidParameters::new(
                        self.name(),
                        "thresholds must be non-negative",
                    ));
                }
                if threshold1 >= threshold2 {
                    return Err(InvalidParameters::new(
                        self.name(),
                        "threshold1 must be below threshold2",
                    ));
                }
                Ok(())
            }
            FilterSpec::Denoise {
                strength,
                template_window,
                search_window,
            }
            | FilterSpec::DenoiseColor {
                strength,
                template_window,
                search_window,
                ..
            } => {
                if strength < 0.0 {
                    return Err(InvalidParameters::new(
                        self.name(),
                        "strength must be non-negative",
                    ));
                }
                odd_kernel(self.name(), template_window)?;
                odd_kernel(self.name(), search_window)?;
                if template_window > search_window {
                    return Err(InvalidParameters::new(
                        self.name(),
                        "template window must fit inside the search window",
                    ));
                }
                Ok(())
            }
            FilterSpec::Sobel {
                dx, dy, kernel_size,
            } => {
                if !dx && !dy {
                    return Err(InvalidParameters::new(
                        self.name(),
                        "at least one derivative direction is required",
                    ));
                }
                odd_kernel(self.name(), kernel_size)?;
                if kernel_size > 7 {
                    return Err(InvalidParameters::new(
                        self.name(),
                        "aperture must be 7 or smaller",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Run the filter against `source`.
    ///
    /// Always fed the original decoded buffer, never an already-filtered
    /// one. Returns the filter's natural output arrangement: RGB for the
    /// blur/denoise family, a grayscale map for the edge detectors.
    pub fn apply(&self, source: &RgbImage) -> Result<DynamicImage, InvalidParameters> {
        self.validate()?;
        let out = match *self {
            FilterSpec::BoxBlur { kernel_size } => {
                DynamicImage::ImageRgb8(blur::box_blur(source, kernel_size))
            }
            FilterSpec::GaussianBlur { kernel_size, sigma } => {
                DynamicImage::ImageRgb8(blur::gaussian_blur(source, kernel_size, sigma))
            }
            FilterSpec::MedianBlur { kernel_size } => {
                DynamicImage::ImageRgb8(blur::median_blur(source, kernel_size))
            }
            FilterSpec::BilateralBlur {
                diameter,
                sigma_color,
                sigma_space,
            } => DynamicImage::ImageRgb8(blur::bilateral_blur(
                source,
                diameter,
                sigma_color,
                sigma_space,
            )),
            FilterSpec::CannyEdges {
                threshold1,
                threshold2,
            } => DynamicImage::ImageLuma8(edges::canny_edges(source, threshold1, threshold2)),
            FilterSpec::Denoise {
                strength,
                template_window,
                search_window,
            } => {
                let gray = DynamicImage::ImageRgb8(source.clone()).to_luma8();
                DynamicImage::ImageLuma8(denoise::non_local_means(
                    &gray,
                    strength,
                    template_window,
                    search_window,
                ))
            }
            FilterSpec::DenoiseColor {
                strength,
                color_strength,
                template_window,
                search_window,
            } => DynamicImage::ImageRgb8(denoise::non_local_means_color(
                source,
                strength,
                color_strength,
                template_window,
                search_window,
            )),
            FilterSpec::Sobel {
                dx, dy, kernel_size,
            } => DynamicImage::ImageLuma8(edges::sobel(source, dx, dy, kernel_size)),
            FilterSpec::Laplacian { kernel_size } => {
                DynamicImage::ImageLuma8(edges::laplacian(source, kernel_size))
            }
        };
        Ok(out)
    }
}

fn odd_kernel(filter: &'static str, kernel_size: u32) -> Result<(), InvalidParameters> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(InvalidParameters::new(
            filter,
            format!("kernel size must be odd and >= 1, got {kernel_size}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::FilterSpec;

    fn solid(rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(6, 6, Rgb(rgb))
    }

    #[test]
    fn blur_family_resets_at_kernel_one() {
        assert!(FilterSpec::BoxBlur { kernel_size: 1 }.resets_to_original());
        assert!(
            FilterSpec::GaussianBlur {
                kernel_size: 1,
                sigma: 2.0
            }
            .resets_to_original()
        );
        assert!(FilterSpec::MedianBlur { kernel_size: 1 }.resets_to_original());
        assert!(!FilterSpec::BoxBlur { kernel_size: 3 }.resets_to_original());
    }

    #[test]
    fn canny_resets_only_when_both_thresholds_are_one() {
        let identity = FilterSpec::CannyEdges {
            threshold1: 1.0,
            threshold2: 1.0,
        };
        assert!(identity.resets_to_original());
        let live = FilterSpec::CannyEdges {
            threshold1: 1.0,
            threshold2: 50.0,
        };
        assert!(!live.resets_to_original());
    }

    #[test]
    fn edge_maps_bypass_display_conversion() {
        assert!(
            FilterSpec::CannyEdges {
                threshold1: 10.0,
                threshold2: 30.0
            }
            .bypasses_display_conversion()
        );
        assert!(
            FilterSpec::Sobel {
                dx: true,
                dy: false,
                kernel_size: 3
            }
            .bypasses_display_conversion()
        );
        assert!(FilterSpec::Laplacian { kernel_size: 3 }.bypasses_display_conversion());
        assert!(!FilterSpec::BoxBlur { kernel_size: 3 }.bypasses_display_conversion());
    }

    #[test]
    fn even_kernel_size_is_rejected() {
        let err = FilterSpec::BoxBlur { kernel_size: 4 }
            .apply(&solid([50, 50, 50]))
            .unwrap_err();
        assert!(err.reason.contains("odd"));
    }

    #[test]
    fn canny_equal_thresholds_are_rejected() {
        let spec = FilterSpec::CannyEdges {
            threshold1: 5.0,
            threshold2: 5.0,
        };
        assert!(spec.apply(&solid([50, 50, 50])).is_err());
    }

    #[test]
    fn sobel_oversized_aperture_is_rejected() {
        let spec = FilterSpec::Sobel {
            dx: true,
            dy: false,
            kernel_size: 9,
        };
        assert!(spec.apply(&solid([50, 50, 50])).is_err());
    }

    #[test]
    fn sobel_aperture_feeds_the_kernel() {
        let img = RgbImage::from_fn(12, 12, |x, _| {
            if x < 6 {
                Rgb([10, 10, 10])
            } else {
                Rgb([240, 240, 240])
            }
        });
        let narrow = FilterSpec::Sobel {
            dx: true,
            dy: false,
            kernel_size: 3,
        };
        let wide = FilterSpec::Sobel {
            dx: true,
            dy: false,
            kernel_size: 5,
        };
        assert_ne!(
            narrow.apply(&img).unwrap().to_luma8(),
            wide.apply(&img).unwrap().to_luma8()
        );
    }

    #[test]
    fn laplacian_aperture_feeds_the_kernel() {
        let mut img = RgbImage::from_pixel(9, 9, Rgb([0, 0, 0]));
        img.put_pixel(4, 4, Rgb([255, 255, 255]));
        let cross = FilterSpec::Laplacian { kernel_size: 1 };
        let k3 = FilterSpec::Laplacian { kernel_size: 3 };
        assert_ne!(
            cross.apply(&img).unwrap().to_luma8(),
            k3.apply(&img).unwrap().to_luma8()
        );
    }

    #[test]
    fn sobel_without_direction_is_rejected() {
        let spec = FilterSpec::Sobel {
            dx: false,
            dy: false,
            kernel_size: 3,
        };
        assert!(spec.apply(&solid([50, 50, 50])).is_err());
    }

    #[test]
    fn box_blur_on_constant_image_is_noop() {
        let img = solid([90, 20, 200]);
        let out = FilterSpec::BoxBlur { kernel_size: 3 }.apply(&img).unwrap();
        assert_eq!(out.to_rgb8(), img);
    }

    #[test]
    fn apply_is_pure_for_a_fixed_snapshot() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8 * 25, y as u8 * 25, 128]));
        let spec = FilterSpec::GaussianBlur {
            kernel_size: 5,
            sigma: 1.4,
        };
        let a = spec.apply(&img).unwrap();
        let b = spec.apply(&img).unwrap();
        assert_eq!(a.to_rgb8(), b.to_rgb8());
    }

    #[test]
    fn sobel_output_is_grayscale() {
        let img = solid([10, 10, 10]);
        let spec = FilterSpec::Sobel {
            dx: true,
            dy: true,
            kernel_size: 3,
        };
        let out = spec.apply(&img).unwrap();
        assert!(matches!(out, image::DynamicImage::ImageLuma8(_)));
    }
}
