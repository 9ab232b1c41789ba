use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use gtk4::Picture;

use crate::acquisition::camera::{CameraResult, CameraSession, V4l2Backend, V4l2Handle};
use crate::state::AppState;
use crate::ui::texture_for_image;

use super::bootstrap::Controller;

pub(super) type SharedCamera = Rc<RefCell<Option<CameraSession<V4l2Handle>>>>;

pub(super) fn open_camera_session(
    preferred: Option<&Path>,
) -> CameraResult<CameraSession<V4l2Handle>> {
    CameraSession::open(&V4l2Backend::default(), preferred)
}

/// Drop the open session, if any. Safe to call from view observers.
pub(super) fn release_camera(camera: &SharedCamera) {
    match camera.try_borrow_mut() {
        Ok(mut slot) => {
            slot.take();
        }
        Err(_) => tracing::debug!("camera busy; release deferred to next tick"),
    }
}

/// Poll the open session for new frames and stream failures.
pub(super) fn install_camera_preview_tick(
    camera: SharedCamera,
    picture: Picture,
    controller: Rc<RefCell<Controller>>,
    interval: Duration,
) {
    let last_sequence = Cell::new(0_u64);
    gtk4::glib::timeout_add_local(interval, move || {
        let camera_view = controller
            .try_borrow()
            .map(|controller| controller.state() == AppState::CameraActive)
            .unwrap_or(true);
        if !camera_view {
            release_camera(&camera);
        }

        let failure = {
            let slot = camera.borrow();
            let Some(session) = slot.as_ref() else {
                last_sequence.set(0);
                return gtk4::glib::ControlFlow::Continue;
            };
            match session.health() {
                Err(err) => Some(err),
                Ok(()) => {
                    if let Some(frame) = session.latest_frame() {
                        if frame.sequence != last_sequence.get() {
                            last_sequence.set(frame.sequence);
                            if let Some(texture) = texture_for_image(&frame.payload) {
                                picture.set_paintable(Some(&texture));
                            }
                        }
                    }
                    None
                }
            }
        };

        if let Some(err) = failure {
            release_camera(&camera);
            controller.borrow_mut().camera_failed(&err);
        }
        gtk4::glib::ControlFlow::Continue
    });
}
