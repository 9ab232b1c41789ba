use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gtk4::prelude::*;
use gtk4::Label;

const ERROR_CLASS: &str = "toast-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ToastKind {
    Info,
    Error,
}

/// Bottom badge for export feedback. Only the newest toast may hide the badge.
#[derive(Clone)]
pub(super) struct ToastRuntime {
    label: Label,
    duration: Duration,
    shown: Rc<Cell<u64>>,
}

impl ToastRuntime {
    pub(super) fn new(label: &Label, duration_ms: u32) -> Self {
        Self {
            label: label.clone(),
            duration: Duration::from_millis(u64::from(duration_ms)),
            shown: Rc::new(Cell::new(0)),
        }
    }

    pub(super) fn show(&self, kind: ToastKind, message: &str) {
        match kind {
            ToastKind::Info => self.label.remove_css_class(ERROR_CLASS),
            ToastKind::Error => self.label.add_css_class(ERROR_CLASS),
        }
        self.label.set_text(message);
        self.label.set_visible(true);

        let ticket = self.shown.get().wrapping_add(1);
        self.shown.set(ticket);
        let label = self.label.clone();
        let shown = self.shown.clone();
        gtk4::glib::timeout_add_local_once(self.duration, move || {
            if shown.get() == ticket {
                label.set_visible(false);
            }
        });
    }
}
