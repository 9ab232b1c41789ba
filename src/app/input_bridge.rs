use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{gdk, gio, glib, FileChooserAction, FileChooserNative, FileFilter, ResponseType};

use crate::acquisition::{self, DragTracker, UPLOAD_MIME_TYPES};

use super::actions::ScanActions;

/// Whole-window file drop with a depth-counted overlay.
pub(super) fn install_drop_target(actions: &ScanActions) {
    let tracker = Rc::new(RefCell::new(DragTracker::default()));
    let target = gtk4::DropTarget::new(gio::File::static_type(), gdk::DragAction::COPY);

    {
        let tracker = tracker.clone();
        let actions = actions.clone();
        target.connect_enter(move |_, _, _| {
            tracker.borrow_mut().enter();
            let enabled = actions.acquisition_enabled();
            actions
                .window
                .set_drop_overlay_visible(tracker.borrow().overlay_visible(enabled));
            if enabled {
                gdk::DragAction::COPY
            } else {
                gdk::DragAction::empty()
            }
        });
    }
    {
        let tracker = tracker.clone();
        let actions = actions.clone();
        target.connect_leave(move |_| {
            tracker.borrow_mut().leave();
            let visible = tracker
                .borrow()
                .overlay_visible(actions.acquisition_enabled());
            actions.window.set_drop_overlay_visible(visible);
        });
    }
    {
        let actions = actions.clone();
        target.connect_drop(move |_, value, _, _| {
            tracker.borrow_mut().drop_received();
            actions.window.set_drop_overlay_visible(false);
            let Ok(file) = value.get::<gio::File>() else {
                return false;
            };
            let Some(path) = file.path() else {
                tracing::debug!("dropped item has no local path");
                return false;
            };
            actions.submit_file(&path);
            true
        });
    }

    actions.window.window.add_controller(target);
}

/// Ctrl+V reads the first image on the clipboard.
pub(super) fn install_paste_shortcut(actions: &ScanActions) {
    let key_controller = gtk4::EventControllerKey::new();
    let actions_for_key = actions.clone();
    key_controller.connect_key_pressed(move |_, key, _, modifier| {
        let is_paste =
            modifier.contains(gdk::ModifierType::CONTROL_MASK) && key.to_lower() == gdk::Key::v;
        if !is_paste {
            return glib::Propagation::Proceed;
        }
        paste_image(&actions_for_key);
        glib::Propagation::Stop
    });
    actions.window.window.add_controller(key_controller);
}

fn paste_image(actions: &ScanActions) {
    if !actions.acquisition_enabled() {
        return;
    }
    let clipboard = actions.window.window.clipboard();
    let formats = clipboard.formats();
    let mime_types = formats.mime_types();
    if acquisition::first_image_mime(mime_types.iter().map(|mime| mime.as_str())).is_none() {
        tracing::debug!("clipboard holds no image");
        return;
    }

    let actions = actions.clone();
    clipboard.read_texture_async(None::<&gio::Cancellable>, move |result| {
        let texture = match result {
            Ok(Some(texture)) => texture,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, "failed to read clipboard image");
                return;
            }
        };
        let png = texture.save_to_png_bytes();
        match acquisition::submit(png.to_vec(), acquisition::PASTED_IMAGE_MIME) {
            Ok(payload) => {
                if actions.acquisition_enabled() {
                    actions.submit_image(payload);
                }
            }
            Err(err) => tracing::warn!(%err, "ignoring pasted clipboard content"),
        }
    });
}

fn upload_filter(title: &str) -> FileFilter {
    let filter = FileFilter::new();
    filter.set_name(Some(title));
    for mime in UPLOAD_MIME_TYPES {
        filter.add_mime_type(mime);
    }
    filter
}

pub(super) fn present_file_chooser(actions: &ScanActions) {
    if !actions.acquisition_enabled() {
        return;
    }
    let title = actions.localizer.borrow().t("uploader.dialogTitle").to_string();
    let chooser = FileChooserNative::new(
        Some(&title),
        Some(&actions.window.window),
        FileChooserAction::Open,
        None,
        None,
    );
    chooser.set_modal(true);
    chooser.add_filter(&upload_filter(&title));

    // The native dialog must outlive this call; the slot is emptied on response.
    let keep_alive = Rc::new(RefCell::new(Some(chooser.clone())));
    let actions = actions.clone();
    chooser.connect_response(move |chooser, response| {
        if response == ResponseType::Accept {
            if let Some(path) = chooser.file().and_then(|file| file.path()) {
                actions.submit_file(&path);
            }
        }
        chooser.destroy();
        keep_alive.borrow_mut().take();
    });
    chooser.show();
}
