use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use gtk4::prelude::*;

use crate::acquisition::{self, ImagePayload};
use crate::clipboard::ClipboardBackend;
use crate::display::ViewModel;
use crate::export::{self, ExportOutcome};
use crate::i18n::Localizer;
use crate::notification;
use crate::storage::ExportStorage;
use crate::ui::StyleTokens;

use super::bootstrap::Controller;
use super::camera_runtime::{open_camera_session, SharedCamera};
use super::toast::{ToastKind, ToastRuntime};
use super::window::ScouterWindow;
use super::worker::{run_analysis, spawn_worker_action, AnalysisSettings};

/// User-triggered operations, shared by buttons, shortcuts and drop targets.
#[derive(Clone)]
pub(super) struct ScanActions {
    pub(super) controller: Rc<RefCell<Controller>>,
    pub(super) localizer: Rc<RefCell<Localizer>>,
    pub(super) window: ScouterWindow,
    pub(super) camera: SharedCamera,
    pub(super) camera_device: Option<PathBuf>,
    pub(super) analysis: AnalysisSettings,
    pub(super) clipboard: Rc<dyn ClipboardBackend>,
    pub(super) storage: Option<Rc<ExportStorage>>,
    pub(super) toast: ToastRuntime,
    pub(super) style_tokens: StyleTokens,
}

impl ScanActions {
    pub(super) fn acquisition_enabled(&self) -> bool {
        self.controller.borrow().acquisition_enabled()
    }

    /// Re-project the current view, e.g. after a language change.
    pub(super) fn refresh(&self) {
        let localizer = self.localizer.borrow();
        self.window.apply_labels(&localizer);
        let model = ViewModel::from_state(self.controller.borrow().view(), &localizer);
        self.window.render(&model);
    }

    pub(super) fn submit_image(&self, payload: ImagePayload) {
        let ticket = self.controller.borrow_mut().begin_analysis(payload);
        let Some(ticket) = ticket else {
            return;
        };

        let settings = self.analysis.clone();
        let worker_ticket = ticket.clone();
        let controller = self.controller.clone();
        spawn_worker_action(
            move || run_analysis(&settings, &worker_ticket),
            move |outcome| {
                controller.borrow_mut().finish_analysis(&ticket, outcome);
            },
        );
    }

    pub(super) fn submit_file(&self, path: &Path) {
        if !self.acquisition_enabled() {
            return;
        }
        match acquisition::load_file(path) {
            Ok(Some(payload)) => self.submit_image(payload),
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "failed to load picked image"),
        }
    }

    pub(super) fn open_camera(&self) {
        if !self.controller.borrow_mut().open_camera() {
            return;
        }
        match open_camera_session(self.camera_device.as_deref()) {
            Ok(session) => {
                *self.camera.borrow_mut() = Some(session);
            }
            Err(err) => self.controller.borrow_mut().camera_failed(&err),
        }
    }

    pub(super) fn capture(&self) {
        let payload = self
            .camera
            .borrow()
            .as_ref()
            .and_then(|session| session.capture());
        match payload {
            Some(payload) => self.submit_image(payload),
            None => tracing::debug!("capture requested before the first camera frame"),
        }
    }

    pub(super) fn close_camera(&self) {
        self.controller.borrow_mut().close_camera();
    }

    pub(super) fn reset(&self) {
        self.controller.borrow_mut().reset();
    }

    pub(super) fn copy_card(&self) {
        let Some((png, storage)) = self.render_card() else {
            return;
        };
        match export::copy_card(&png, self.clipboard.as_ref(), &storage) {
            Ok(ExportOutcome::Copied) => self.flash_copied(),
            Ok(ExportOutcome::Saved(path)) => self.report_saved(&path),
            Err(err) => self.report_export_failure(&err),
        }
    }

    pub(super) fn download_card(&self) {
        let Some((png, storage)) = self.render_card() else {
            return;
        };
        match export::download_card(&png, &storage) {
            Ok(path) => self.report_saved(&path),
            Err(err) => self.report_export_failure(&err),
        }
    }

    fn render_card(&self) -> Option<(Vec<u8>, Rc<ExportStorage>)> {
        let Some(storage) = self.storage.clone() else {
            tracing::warn!("export directory unavailable");
            self.toast.show(
                ToastKind::Error,
                self.localizer.borrow().t("display.errorDefault"),
            );
            return None;
        };
        match export::render_widget_png(&self.window.card) {
            Ok(png) => Some((png, storage)),
            Err(err) => {
                self.report_export_failure(&err);
                None
            }
        }
    }

    fn flash_copied(&self) {
        let button = self.window.copy_button.clone();
        button.set_label(self.localizer.borrow().t("display.copyButton.copied"));
        let localizer = self.localizer.clone();
        gtk4::glib::timeout_add_local_once(
            Duration::from_millis(u64::from(self.style_tokens.copied_feedback_ms)),
            move || {
                button.set_label(localizer.borrow().t("display.copyButton.default"));
            },
        );
    }

    fn report_saved(&self, path: &Path) {
        let message = format!(
            "{} {}",
            self.localizer.borrow().t("display.savedTo"),
            path.display()
        );
        self.toast.show(ToastKind::Info, &message);
        notification::send(message);
    }

    fn report_export_failure(&self, err: &export::ExportError) {
        tracing::warn!(%err, "result card export failed");
        self.toast.show(
            ToastKind::Error,
            self.localizer.borrow().t("display.errorDefault"),
        );
    }
}
