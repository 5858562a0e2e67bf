use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
use tracing::debug;

use crate::error::{EditorError, InvalidParameters};
use crate::filter::FilterSpec;

/// An image under edit: the pristine decoded original, the buffer being
/// displayed, and a one-deep history slot.
///
/// Filters always run against `original`, never against `current`, so
/// moving a slider re-derives the result instead of compounding it. The
/// history is a single snapshot: `undo` swaps `previous` back in without
/// consuming it, so repeated undo is stable rather than walking a stack.
pub struct EditableImage {
    original: RgbImage,
    current: DynamicImage,
    previous: DynamicImage,
    display_as_filtered: bool,
    previous_display_as_filtered: bool,
    source_path: Option<PathBuf>,
}

impl EditableImage {
    pub fn new(image: DynamicImage) -> Self {
        let original = image.to_rgb8();
        let current = DynamicImage::ImageRgb8(original.clone());
        Self {
            previous: current.clone(),
            current,
            original,
            display_as_filtered: false,
            previous_display_as_filtered: false,
            source_path: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, EditorError> {
        if !path.exists() {
            return Err(EditorError::SourceNotFound {
                path: path.to_path_buf(),
                source: None,
            });
        }
        let decoded = image::open(path).map_err(|err| EditorError::SourceNotFound {
            path: path.to_path_buf(),
            source: Some(err),
        })?;
        debug!(path = %path.display(), "loaded image");
        let mut editable = Self::new(decoded);
        editable.source_path = Some(path.to_path_buf());
        Ok(editable)
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }

    /// The pristine decoded buffer filters run against.
    pub fn original(&self) -> &RgbImage {
        &self.original
    }

    /// Apply `spec` synchronously. Failures never escape: an invalid
    /// parameter snapshot collapses into an undo (or a reset when the
    /// snapshot is the filter's identity point).
    pub fn apply_filter(&mut self, spec: &FilterSpec) {
        let result = spec.apply(&self.original);
        self.finish_apply(spec, result);
    }

    /// Install the outcome of running `spec` against [`Self::original`].
    ///
    /// Split from [`Self::apply_filter`] so a background worker can do the
    /// pixel work off-thread and hand the result back here.
    pub fn finish_apply(
        &mut self,
        spec: &FilterSpec,
        result: Result<DynamicImage, InvalidParameters>,
    ) {
        self.previous = self.current.clone();
        self.previous_display_as_filtered = self.display_as_filtered;

        if spec.resets_to_original() {
            debug!(filter = spec.name(), "identity parameters, reverting to original");
            self.reset();
            return;
        }

        match result {
            Ok(filtered) => {
                self.current = filtered;
                self.display_as_filtered = spec.bypasses_display_conversion();
            }
            Err(err) => {
                debug!(filter = spec.name(), %err, "filter rejected, keeping last state");
                self.undo();
            }
        }
    }

    /// Swap the snapshot back in. Does not consume it, so a second undo
    /// lands in the same state instead of stepping further back.
    pub fn undo(&mut self) {
        self.current = self.previous.clone();
        self.display_as_filtered = self.previous_display_as_filtered;
    }

    /// Discard the current edit and show the original. The undo snapshot
    /// survives, so a reset can itself be undone.
    pub fn reset(&mut self) {
        self.current = DynamicImage::ImageRgb8(self.original.clone());
        self.display_as_filtered = false;
    }

    pub fn save(&self, path: &Path, overwrite: bool) -> Result<(), EditorError> {
        if !overwrite && path.exists() {
            return Err(EditorError::AlreadyExists(path.to_path_buf()));
        }
        self.current.save(path).map_err(|err| EditorError::Encode {
            path: path.to_path_buf(),
            source: err,
        })?;
        debug!(path = %path.display(), "saved image");
        Ok(())
    }

    /// The current buffer in display arrangement.
    ///
    /// Single-channel maps (edge detectors) are expanded verbatim so each
    /// gray level lands on all three channels; everything else goes through
    /// the normal storage-to-display conversion.
    pub fn display_pixels(&self) -> RgbaImage {
        if self.display_as_filtered {
            let map = self.current.to_luma8();
            let (w, h) = map.dimensions();
            RgbaImage::from_fn(w, h, |x, y| {
                let v = map.get_pixel(x, y).0[0];
                Rgba([v, v, v, 255])
            })
        } else {
            let rgb = self.current.to_rgb8();
            let (w, h) = rgb.dimensions();
            RgbaImage::from_fn(w, h, |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Rgba([r, g, b, 255])
            })
        }
    }

    #[cfg(test)]
    fn current_rgb(&self) -> RgbImage {
        self.current.to_rgb8()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{DynamicImage, Rgb, RgbImage};

    use super::EditableImage;
    use crate::error::EditorError;
    use crate::filter::FilterSpec;

    fn checkerboard(w: u32, h: u32) -> EditableImage {
        let img = RgbImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([20, 20, 20])
            } else {
                Rgb([230, 230, 230])
            }
        });
        EditableImage::new(DynamicImage::ImageRgb8(img))
    }

    fn solid(rgb: [u8; 3]) -> EditableImage {
        EditableImage::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb(rgb))))
    }

    const BLUR: FilterSpec = FilterSpec::BoxBlur { kernel_size: 3 };
    const BLUR_IDENTITY: FilterSpec = FilterSpec::BoxBlur { kernel_size: 1 };

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("photodesk-{}-{name}", std::process::id()))
    }

    #[test]
    fn identity_parameters_collapse_to_original() {
        let mut editor = checkerboard(6, 6);
        editor.apply_filter(&BLUR);
        assert_ne!(editor.current_rgb(), *editor.original());

        editor.apply_filter(&BLUR_IDENTITY);
        assert_eq!(editor.current_rgb(), *editor.original());
    }

    #[test]
    fn reapplying_a_spec_does_not_compound() {
        let mut editor = checkerboard(8, 8);
        editor.apply_filter(&BLUR);
        let once = editor.current_rgb();
        editor.apply_filter(&BLUR);
        assert_eq!(editor.current_rgb(), once);
    }

    #[test]
    fn undo_restores_the_previous_edit_without_chaining() {
        let mut editor = checkerboard(8, 8);
        editor.apply_filter(&BLUR);
        let blurred = editor.current_rgb();
        editor.apply_filter(&FilterSpec::MedianBlur { kernel_size: 3 });

        editor.undo();
        assert_eq!(editor.current_rgb(), blurred);
        editor.undo();
        assert_eq!(editor.current_rgb(), blurred);
    }

    #[test]
    fn reset_keeps_the_undo_snapshot_alive() {
        let mut editor = checkerboard(8, 8);
        editor.apply_filter(&BLUR);
        let blurred = editor.current_rgb();

        editor.reset();
        assert_eq!(editor.current_rgb(), *editor.original());
        editor.undo();
        assert_eq!(editor.current_rgb(), blurred);
    }

    #[test]
    fn invalid_parameters_leave_the_current_edit_in_place() {
        let mut editor = checkerboard(8, 8);
        editor.apply_filter(&BLUR);
        let blurred = editor.current_rgb();

        let bad = FilterSpec::CannyEdges {
            threshold1: 5.0,
            threshold2: 5.0,
        };
        editor.apply_filter(&bad);
        assert_eq!(editor.current_rgb(), blurred);

        // The transient must not poison later applies.
        let median = FilterSpec::MedianBlur { kernel_size: 3 };
        editor.apply_filter(&median);
        let mut reference = checkerboard(8, 8);
        reference.apply_filter(&median);
        assert_eq!(editor.current_rgb(), reference.current_rgb());
    }

    #[test]
    fn canny_identity_thresholds_revert_instead_of_erroring() {
        let mut editor = checkerboard(8, 8);
        editor.apply_filter(&BLUR);
        editor.apply_filter(&FilterSpec::CannyEdges {
            threshold1: 1.0,
            threshold2: 1.0,
        });
        assert_eq!(editor.current_rgb(), *editor.original());
    }

    #[test]
    fn solid_color_survives_the_blur_family_unchanged() {
        let mut editor = solid([60, 120, 180]);
        for spec in [
            BLUR,
            FilterSpec::GaussianBlur {
                kernel_size: 3,
                sigma: 1.0,
            },
            FilterSpec::MedianBlur { kernel_size: 3 },
        ] {
            editor.apply_filter(&spec);
            assert_eq!(
                editor.current_rgb(),
                *editor.original(),
                "{} changed a solid image",
                spec.name()
            );
        }
    }

    #[test]
    fn edge_map_display_is_expanded_verbatim() {
        let mut editor = checkerboard(8, 8);
        editor.apply_filter(&FilterSpec::Laplacian { kernel_size: 3 });
        let display = editor.display_pixels();
        for p in display.pixels() {
            let [r, g, b, a] = p.0;
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert_eq!(a, 255);
        }
    }

    #[test]
    fn load_missing_path_reports_source_not_found() {
        let err = EditableImage::load(std::path::Path::new("/nonexistent/missing.png"))
            .err()
            .unwrap();
        assert!(matches!(err, EditorError::SourceNotFound { .. }));
    }

    #[test]
    fn save_refuses_to_clobber_without_overwrite() {
        let path = scratch_path("clobber.png");
        let editor = solid([10, 200, 10]);
        editor.save(&path, false).unwrap();

        let err = editor.save(&path, false).err().unwrap();
        assert!(matches!(err, EditorError::AlreadyExists(_)));

        editor.save(&path, true).unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn save_writes_the_edited_buffer() {
        let path = scratch_path("roundtrip.png");
        let mut editor = checkerboard(8, 8);
        editor.apply_filter(&BLUR);
        editor.save(&path, true).unwrap();

        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded, editor.current_rgb());
        std::fs::remove_file(&path).unwrap();
    }
}
