use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::clipboard;
use crate::config::load_app_config;
use crate::display::ViewModel;
use crate::error::AppResult;
use crate::state::AppState;
use crate::storage::ExportStorage;
use crate::ui::{LAYOUT_TOKENS, SCOUTER_COLORS};
use gtk4::prelude::*;
use gtk4::Application;

mod actions;
mod bootstrap;
mod camera_runtime;
mod input_bridge;
mod runtime_css;
mod settings;
mod toast;
mod window;
mod worker;

use self::actions::ScanActions;
use self::bootstrap::{bootstrap_app_runtime, gtk_launch_args};
use self::camera_runtime::{install_camera_preview_tick, release_camera};
use self::input_bridge::{install_drop_target, install_paste_shortcut, present_file_chooser};
use self::runtime_css::install_runtime_css;
use self::settings::present_settings_dialog;
use self::toast::ToastRuntime;
use self::window::build_scouter_window;

const APP_ID: &str = "io.github.power_scouter";

fn connect_buttons(actions: &ScanActions) {
    let window = &actions.window;
    let bind = |button: &gtk4::Button, action: fn(&ScanActions)| {
        let actions = actions.clone();
        button.connect_clicked(move |_| action(&actions));
    };

    bind(&window.settings_button, present_settings_dialog);
    bind(&window.upload_button, present_file_chooser);
    bind(&window.camera_button, ScanActions::open_camera);
    bind(&window.capture_button, ScanActions::capture);
    bind(&window.camera_cancel_button, ScanActions::close_camera);
    bind(&window.reset_button, ScanActions::reset);
    bind(&window.copy_button, ScanActions::copy_card);
    bind(&window.download_button, ScanActions::download_card);
}

pub struct App {
    state: Rc<Cell<AppState>>,
}

impl App {
    pub fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(AppState::Idle)),
        }
    }

    pub fn start(&mut self) -> AppResult<()> {
        let config = load_app_config();
        tracing::info!(
            clipboard = ?config.clipboard,
            timeout_secs = config.request_timeout().as_secs(),
            "loaded app config"
        );

        tracing::info!("starting gtk runtime");
        let application = Application::new(Some(APP_ID), gtk4::gio::ApplicationFlags::NON_UNIQUE);
        let pending_config = RefCell::new(Some(config));
        let state = self.state.clone();

        application.connect_activate(move |app| {
            let Some(config) = pending_config.borrow_mut().take() else {
                tracing::debug!("ignoring duplicate gtk activate signal");
                return;
            };
            let style_tokens = LAYOUT_TOKENS;
            let motion_enabled = gtk4::Settings::default()
                .map(|settings| settings.is_gtk_enable_animations())
                .unwrap_or(true);
            install_runtime_css(style_tokens, &SCOUTER_COLORS, motion_enabled);

            let bootstrap = bootstrap_app_runtime(config);
            let storage = match ExportStorage::with_default_paths() {
                Ok(storage) => Some(Rc::new(storage)),
                Err(err) => {
                    tracing::warn!(%err, "export directory unavailable");
                    None
                }
            };

            let window = build_scouter_window(app, style_tokens);
            let actions = ScanActions {
                controller: Rc::new(RefCell::new(bootstrap.controller)),
                localizer: Rc::new(RefCell::new(bootstrap.localizer)),
                toast: ToastRuntime::new(&window.toast_label, style_tokens.toast_duration_ms),
                window,
                camera: Rc::new(RefCell::new(None)),
                camera_device: bootstrap.config.camera_device.clone(),
                analysis: bootstrap.analysis,
                clipboard: Rc::from(clipboard::backend_for(bootstrap.config.clipboard)),
                storage,
                style_tokens,
            };

            {
                let window = actions.window.clone();
                let localizer = actions.localizer.clone();
                let camera = actions.camera.clone();
                let state = state.clone();
                actions.controller.borrow_mut().subscribe(move |view| {
                    let tag = view.tag();
                    tracing::debug!(state = ?tag, "rendering view");
                    state.set(tag);
                    if tag != AppState::CameraActive {
                        release_camera(&camera);
                    }
                    window.render(&ViewModel::from_state(view, &localizer.borrow()));
                });
            }

            connect_buttons(&actions);
            install_drop_target(&actions);
            install_paste_shortcut(&actions);
            install_camera_preview_tick(
                actions.camera.clone(),
                actions.window.camera_picture.clone(),
                actions.controller.clone(),
                Duration::from_millis(u64::from(style_tokens.camera_tick_ms)),
            );
            {
                let camera = actions.camera.clone();
                actions.window.window.connect_close_request(move |_| {
                    release_camera(&camera);
                    gtk4::glib::Propagation::Proceed
                });
            }

            state.set(actions.controller.borrow().state());
            actions.refresh();
            tracing::info!("presenting scouter window");
            actions.window.window.present();
        });

        let exit_code = application.run_with_args(&gtk_launch_args());
        tracing::info!(?exit_code, "gtk runtime finished");
        Ok(())
    }

    pub fn state(&self) -> AppState {
        self.state.get()
    }

    pub fn state_label(&self) -> String {
        format!("{:?}", self.state())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_app_starts_idle() {
        let app = App::new();
        assert_eq!(app.state(), AppState::Idle);
        assert_eq!(app.state_label(), "Idle");
    }
}
