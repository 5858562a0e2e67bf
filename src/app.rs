use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::editor::EditableImage;
use crate::error::EditorError;
use crate::filter::FilterSpec;
use crate::preview::PreviewWorker;

static IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

#[derive(Clone, Copy, PartialEq, Eq)]
enum FilterKind {
    BoxBlur,
    GaussianBlur,
    MedianBlur,
    BilateralBlur,
    CannyEdges,
    Denoise,
    DenoiseColor,
    Sobel,
    Laplacian,
}

impl FilterKind {
    const ALL: [FilterKind; 9] = [
        FilterKind::BoxBlur,
        FilterKind::GaussianBlur,
        FilterKind::MedianBlur,
        FilterKind::BilateralBlur,
        FilterKind::CannyEdges,
        FilterKind::Denoise,
        FilterKind::DenoiseColor,
        FilterKind::Sobel,
        FilterKind::Laplacian,
    ];

    fn label(self) -> &'static str {
        match self {
            FilterKind::BoxBlur => "Box Blur",
            FilterKind::GaussianBlur => "Gaussian Blur",
            FilterKind::MedianBlur => "Median Blur",
            FilterKind::BilateralBlur => "Bilateral Filter",
            FilterKind::CannyEdges => "Canny Edges",
            FilterKind::Denoise => "Denoise",
            FilterKind::DenoiseColor => "Denoise (Color)",
            FilterKind::Sobel => "Sobel",
            FilterKind::Laplacian => "Laplacian",
        }
    }
}

/// Current widget values for every filter's parameters.
///
/// Values persist across filter switches so flipping between filters does
/// not lose tuning. A [`FilterSpec`] snapshot is taken from here whenever
/// anything changes.
struct FilterControls {
    kernel_size: u32,
    gaussian_sigma: f32,
    bilateral_diameter: u32,
    bilateral_sigma_color: f32,
    bilateral_sigma_space: f32,
    canny_threshold1: f32,
    canny_threshold2: f32,
    denoise_strength: f32,
    denoise_color_strength: f32,
    denoise_template_window: u32,
    denoise_search_window: u32,
    sobel_dx: bool,
    sobel_dy: bool,
}

impl Default for FilterControls {
    fn default() -> Self {
        Self {
            kernel_size: 1,
            gaussian_sigma: 0.0,
            bilateral_diameter: 1,
            bilateral_sigma_color: 75.0,
            bilateral_sigma_space: 75.0,
            canny_threshold1: 1.0,
            canny_threshold2: 1.0,
            denoise_strength: 0.0,
            denoise_color_strength: 10.0,
            denoise_template_window: 7,
            denoise_search_window: 21,
            sobel_dx: true,
            sobel_dy: false,
        }
    }
}

impl FilterControls {
    fn snapshot(&self, kind: FilterKind) -> FilterSpec {
        match kind {
            FilterKind::BoxBlur => FilterSpec::BoxBlur {
                kernel_size: self.kernel_size,
            },
            FilterKind::GaussianBlur => FilterSpec::GaussianBlur {
                kernel_size: self.kernel_size,
                sigma: self.gaussian_sigma,
            },
            FilterKind::MedianBlur => FilterSpec::MedianBlur {
                kernel_size: self.kernel_size,
            },
            FilterKind::BilateralBlur => FilterSpec::BilateralBlur {
                diameter: self.bilateral_diameter,
                sigma_color: self.bilateral_sigma_color,
                sigma_space: self.bilateral_sigma_space,
            },
            FilterKind::CannyEdges => FilterSpec::CannyEdges {
                threshold1: self.canny_threshold1,
                threshold2: self.canny_threshold2,
            },
            FilterKind::Denoise => FilterSpec::Denoise {
                strength: self.denoise_strength,
                template_window: self.denoise_template_window,
                search_window: self.denoise_search_window,
            },
            FilterKind::DenoiseColor => FilterSpec::DenoiseColor {
                strength: self.denoise_strength,
                color_strength: self.denoise_color_strength,
                template_window: self.denoise_template_window,
                search_window: self.denoise_search_window,
            },
            FilterKind::Sobel => FilterSpec::Sobel {
                dx: self.sobel_dx,
                dy: self.sobel_dy,
                kernel_size: self.kernel_size,
            },
            FilterKind::Laplacian => FilterSpec::Laplacian {
                kernel_size: self.kernel_size,
            },
        }
    }
}

pub struct PhotodeskApp {
    editor: Option<EditableImage>,
    worker: PreviewWorker,
    texture: Option<egui::TextureHandle>,
    texture_dirty: bool,
    filter_kind: FilterKind,
    controls: FilterControls,
    status: String,
    config: AppConfig,
}

impl PhotodeskApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            editor: None,
            worker: PreviewWorker::new(),
            texture: None,
            texture_dirty: false,
            filter_kind: FilterKind::BoxBlur,
            controls: FilterControls::default(),
            status: String::new(),
            config,
        }
    }

    fn open_image(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTS);
        if let Some(dir) = self.config.last_open_dir.as_ref() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        match EditableImage::load(&path) {
            Ok(editor) => {
                self.config.last_open_dir = path.parent().map(Path::to_path_buf);
                let (w, h) = editor.dimensions();
                self.status = format!(
                    "Opened {} ({w}x{h})",
                    path.file_name().unwrap_or_default().to_string_lossy()
                );
                self.editor = Some(editor);
                self.controls = FilterControls::default();
                // Drop any in-flight work aimed at the previous image.
                self.worker = PreviewWorker::new();
                self.texture_dirty = true;
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    fn save_image(&mut self, overwrite_prompted: bool) {
        let Some(editor) = self.editor.as_ref() else {
            return;
        };
        let result = if overwrite_prompted {
            let mut dialog = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTS);
            if let Some(source) = editor.source_path() {
                if let Some(dir) = source.parent() {
                    dialog = dialog.set_directory(dir);
                }
                dialog = dialog.set_file_name(
                    default_save_path(source)
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy(),
                );
            }
            let Some(path) = dialog.save_file() else {
                return;
            };
            // The dialog already confirmed replacing an existing file.
            editor.save(&path, true).map(|()| path)
        } else {
            let Some(source) = editor.source_path() else {
                self.status = "No source path; use Save As".to_string();
                return;
            };
            let path = default_save_path(source);
            editor.save(&path, false).map(|()| path)
        };

        match result {
            Ok(path) => {
                self.status = format!("Saved {}", path.display());
            }
            Err(err @ EditorError::AlreadyExists(_)) => {
                self.status = format!("{err}; use Save As to replace it");
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    fn request_preview(&mut self, ctx: &egui::Context) {
        let Some(editor) = self.editor.as_ref() else {
            return;
        };
        let spec = self.controls.snapshot(self.filter_kind);
        self.worker.request(spec, editor.original(), ctx);
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty {
            return;
        }
        self.texture_dirty = false;
        let Some(editor) = self.editor.as_ref() else {
            self.texture = None;
            return;
        };
        let rgba = editor.display_pixels();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let img = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
        self.texture = Some(ctx.load_texture("photodesk_canvas", img, Default::default()));
    }

    fn show_filter_controls(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        egui::ComboBox::from_label("Filter")
            .selected_text(self.filter_kind.label())
            .show_ui(ui, |ui| {
                for kind in FilterKind::ALL {
                    changed |= ui
                        .selectable_value(&mut self.filter_kind, kind, kind.label())
                        .changed();
                }
            });
        ui.separator();

        let odd_kernel =
            |ui: &mut egui::Ui, value: &mut u32, label: &str| -> bool {
                ui.label(label);
                ui.add(egui::Slider::new(value, 1_u32..=31_u32).step_by(2.0))
                    .changed()
            };

        match self.filter_kind {
            FilterKind::BoxBlur | FilterKind::MedianBlur | FilterKind::Laplacian => {
                changed |= odd_kernel(ui, &mut self.controls.kernel_size, "Kernel size");
            }
            FilterKind::GaussianBlur => {
                changed |= odd_kernel(ui, &mut self.controls.kernel_size, "Kernel size");
                ui.label("Sigma (0 = auto)");
                changed |= ui
                    .add(egui::Slider::new(&mut self.controls.gaussian_sigma, 0.0..=10.0))
                    .changed();
            }
            FilterKind::BilateralBlur => {
                ui.label("Diameter");
                changed |= ui
                    .add(
                        egui::Slider::new(&mut self.controls.bilateral_diameter, 1_u32..=15_u32)
                            .step_by(2.0),
                    )
                    .changed();
                ui.label("Sigma color");
                changed |= ui
                    .add(egui::Slider::new(
                        &mut self.controls.bilateral_sigma_color,
                        1.0..=200.0,
                    ))
                    .changed();
                ui.label("Sigma space");
                changed |= ui
                    .add(egui::Slider::new(
                        &mut self.controls.bilateral_sigma_space,
                        1.0..=200.0,
                    ))
                    .changed();
            }
            FilterKind::CannyEdges => {
                ui.label("Threshold 1");
                changed |= ui
                    .add(egui::Slider::new(&mut self.controls.canny_threshold1, 1.0..=255.0))
                    .changed();
                ui.label("Threshold 2");
                changed |= ui
                    .add(egui::Slider::new(&mut self.controls.canny_threshold2, 1.0..=255.0))
                    .changed();
                if self.controls.canny_threshold1 >= self.controls.canny_threshold2
                    && self.controls.canny_threshold2 > 1.0
                {
                    ui.label(
                        egui::RichText::new("Threshold 1 must stay below threshold 2").weak(),
                    );
                }
            }
            FilterKind::Denoise | FilterKind::DenoiseColor => {
                ui.label("Strength");
                changed |= ui
                    .add(egui::Slider::new(&mut self.controls.denoise_strength, 0.0..=50.0))
                    .changed();
                if self.filter_kind == FilterKind::DenoiseColor {
                    ui.label("Color strength");
                    changed |= ui
                        .add(egui::Slider::new(
                            &mut self.controls.denoise_color_strength,
                            0.0..=50.0,
                        ))
                        .changed();
                }
                changed |= odd_kernel(
                    ui,
                    &mut self.controls.denoise_template_window,
                    "Template window",
                );
                changed |= odd_kernel(
                    ui,
                    &mut self.controls.denoise_search_window,
                    "Search window",
                );
            }
            FilterKind::Sobel => {
                changed |= ui.checkbox(&mut self.controls.sobel_dx, "dx").changed();
                changed |= ui.checkbox(&mut self.controls.sobel_dy, "dy").changed();
                // The Sobel aperture tops out at 7; the shared kernel value
                // may hold a larger size from another filter.
                if self.controls.kernel_size > 7 {
                    self.controls.kernel_size = 7;
                    changed = true;
                }
                ui.label("Kernel size");
                changed |= ui
                    .add(egui::Slider::new(&mut self.controls.kernel_size, 1_u32..=7_u32).step_by(2.0))
                    .changed();
            }
        }

        changed
    }
}

impl eframe::App for PhotodeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        // Poll background work before rendering panels
        if let Some(editor) = self.editor.as_mut() {
            if self.worker.poll(editor, ctx) {
                self.texture_dirty = true;
            }
        }

        egui::TopBottomPanel::top("main_menu").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open").clicked() {
                    self.open_image();
                }
                let has_image = self.editor.is_some();
                if ui.add_enabled(has_image, egui::Button::new("Save")).clicked() {
                    self.save_image(false);
                }
                if ui
                    .add_enabled(has_image, egui::Button::new("Save As"))
                    .clicked()
                {
                    self.save_image(true);
                }
                ui.separator();
                if ui.add_enabled(has_image, egui::Button::new("Undo")).clicked() {
                    if let Some(editor) = self.editor.as_mut() {
                        editor.undo();
                        self.texture_dirty = true;
                    }
                }
                if ui
                    .add_enabled(has_image, egui::Button::new("Reset"))
                    .clicked()
                {
                    if let Some(editor) = self.editor.as_mut() {
                        editor.reset();
                        self.texture_dirty = true;
                    }
                }
                if self.worker.in_flight() {
                    ui.spinner();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(if self.status.is_empty() {
                "Ready"
            } else {
                self.status.as_str()
            });
        });

        let mut preview_wanted = false;
        egui::SidePanel::right("filter_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Filters");
                ui.separator();
                if self.editor.is_some() {
                    preview_wanted = self.show_filter_controls(ui);
                } else {
                    ui.label(egui::RichText::new("Open an image to start editing").weak());
                }
            });
        if preview_wanted {
            self.request_preview(ctx);
        }

        self.refresh_texture(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = self.texture.as_ref() {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(texture).shrink_to_fit());
                });
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("No image").weak());
                });
            }
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}

/// Default destination for plain Save: sibling of the source with an
/// `-edited` suffix, keeping the original untouched by default.
fn default_save_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    source.with_file_name(format!("{stem}-edited.{ext}"))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{FilterControls, FilterKind, default_save_path};
    use crate::filter::FilterSpec;

    #[test]
    fn default_save_path_keeps_directory_and_extension() {
        let out = default_save_path(Path::new("/photos/cat.jpg"));
        assert_eq!(out, Path::new("/photos/cat-edited.jpg"));
    }

    #[test]
    fn default_save_path_handles_missing_extension() {
        let out = default_save_path(Path::new("/photos/scan"));
        assert_eq!(out, Path::new("/photos/scan-edited.png"));
    }

    #[test]
    fn default_controls_snapshot_to_identity_specs() {
        let controls = FilterControls::default();
        assert!(controls.snapshot(FilterKind::BoxBlur).resets_to_original());
        assert!(controls.snapshot(FilterKind::GaussianBlur).resets_to_original());
        assert!(controls.snapshot(FilterKind::MedianBlur).resets_to_original());
        assert!(controls.snapshot(FilterKind::BilateralBlur).resets_to_original());
        assert!(controls.snapshot(FilterKind::CannyEdges).resets_to_original());
        assert!(controls.snapshot(FilterKind::Denoise).resets_to_original());
        assert!(controls.snapshot(FilterKind::DenoiseColor).resets_to_original());
    }

    #[test]
    fn snapshot_carries_the_selected_kind() {
        let mut controls = FilterControls::default();
        controls.kernel_size = 5;
        assert_eq!(
            controls.snapshot(FilterKind::BoxBlur),
            FilterSpec::BoxBlur { kernel_size: 5 }
        );
        assert!(matches!(
            controls.snapshot(FilterKind::Sobel),
            FilterSpec::Sobel { dx: true, dy: false, .. }
        ));
    }
}
