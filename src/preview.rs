use std::sync::mpsc;

use image::{DynamicImage, RgbImage};

use crate::editor::EditableImage;
use crate::error::InvalidParameters;
use crate::filter::FilterSpec;

type Outcome = (FilterSpec, Result<DynamicImage, InvalidParameters>);

/// Runs filter applications off the UI thread, one at a time.
///
/// While an application is in flight, newer requests replace each other in
/// a single pending slot instead of queueing, so dragging a slider settles
/// on the newest value without grinding through every intermediate one.
pub struct PreviewWorker {
    tx: mpsc::SyncSender<Outcome>,
    rx: mpsc::Receiver<Outcome>,
    in_flight: bool,
    pending: Option<FilterSpec>,
}

impl PreviewWorker {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(8);
        Self {
            tx,
            rx,
            in_flight: false,
            pending: None,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Ask for `spec` to be applied against `original`. Supersedes any
    /// request still waiting for a worker.
    pub fn request(&mut self, spec: FilterSpec, original: &RgbImage, ctx: &egui::Context) {
        if self.in_flight {
            self.pending = Some(spec);
            return;
        }
        self.in_flight = true;

        let source = original.clone();
        let tx = self.tx.clone();
        let ctx2 = ctx.clone();
        std::thread::spawn(move || {
            let result = spec.apply(&source);
            let _ = tx.send((spec, result));
            ctx2.request_repaint();
        });
    }

    /// Install any finished application into `editor` and kick off the
    /// pending request, if one accumulated meanwhile. Returns `true` when
    /// the editor changed and the displayed texture is stale.
    pub fn poll(&mut self, editor: &mut EditableImage, ctx: &egui::Context) -> bool {
        let mut installed = false;
        while let Ok((spec, result)) = self.rx.try_recv() {
            self.in_flight = false;
            editor.finish_apply(&spec, result);
            installed = true;
        }
        if !self.in_flight {
            if let Some(next) = self.pending.take() {
                self.request(next, editor.original(), ctx);
            }
        }
        installed
    }
}
