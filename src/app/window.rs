use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, Button, HeaderBar, Justification,
    Label, Orientation, Overlay, Picture, Spinner, Stack, StackTransitionType,
};

use crate::acquisition::ImagePayload;
use crate::display::{Page, ViewModel};
use crate::i18n::Localizer;
use crate::ui::{icon_button, texture_for_image, StyleTokens};

const SETTINGS_ICON_NAME: &str = "emblem-system-symbolic";

#[derive(Clone)]
pub(super) struct ScouterWindow {
    pub(super) window: ApplicationWindow,
    pub(super) settings_button: Button,
    pub(super) toast_label: Label,
    pub(super) upload_button: Button,
    pub(super) camera_button: Button,
    pub(super) camera_picture: Picture,
    pub(super) capture_button: Button,
    pub(super) camera_cancel_button: Button,
    pub(super) card: GtkBox,
    pub(super) reset_button: Button,
    pub(super) copy_button: Button,
    pub(super) download_button: Button,
    title_label: Label,
    stack: Stack,
    drop_overlay: GtkBox,
    drop_label: Label,
    upload_title: Label,
    upload_subtitle: Label,
    or_label: Label,
    camera_error_box: GtkBox,
    camera_error_title: Label,
    camera_error_label: Label,
    scan_picture: Picture,
    loading_box: GtkBox,
    spinner: Spinner,
    loading_label: Label,
    result_box: GtkBox,
    power_title: Label,
    power_value: Label,
    analysis_title: Label,
    reasoning_label: Label,
    error_box: GtkBox,
    error_title: Label,
    error_label: Label,
    shown_image: Rc<RefCell<Option<ImagePayload>>>,
}

fn styled_label(css_class: &str) -> Label {
    let label = Label::new(None);
    label.add_css_class(css_class);
    label.set_wrap(true);
    label.set_justify(Justification::Center);
    label
}

fn vertical(spacing: i32, css_class: &str) -> GtkBox {
    let container = GtkBox::new(Orientation::Vertical, spacing);
    container.add_css_class(css_class);
    container
}

pub(super) fn build_scouter_window(app: &Application, style_tokens: StyleTokens) -> ScouterWindow {
    let window = ApplicationWindow::new(app);
    window.add_css_class("scouter-root");
    window.set_default_size(
        style_tokens.window_default_width,
        style_tokens.window_default_height,
    );

    // ── Header ──
    let title_label = styled_label("scouter-title");
    let settings_button = icon_button(
        SETTINGS_ICON_NAME,
        "",
        i32::from(style_tokens.control_size),
        &["settings-button"],
    );
    let header = HeaderBar::new();
    header.set_title_widget(Some(&title_label));
    header.pack_end(&settings_button);
    window.set_titlebar(Some(&header));

    // ── Uploader page ──
    let upload_title = styled_label("upload-title");
    let upload_subtitle = styled_label("upload-subtitle");
    let upload_content = vertical(style_tokens.spacing_8, "upload-content");
    upload_content.append(&upload_title);
    upload_content.append(&upload_subtitle);
    let upload_button = Button::new();
    upload_button.add_css_class("upload-zone");
    upload_button.set_child(Some(&upload_content));
    upload_button.set_vexpand(true);

    let or_label = styled_label("upload-or");
    let camera_button = Button::new();
    camera_button.add_css_class("scouter-primary-button");

    let uploader_page = vertical(style_tokens.spacing_16, "uploader-page");
    uploader_page.append(&upload_button);
    uploader_page.append(&or_label);
    uploader_page.append(&camera_button);

    // ── Camera page ──
    let camera_picture = Picture::new();
    camera_picture.add_css_class("camera-preview");
    camera_picture.set_size_request(-1, style_tokens.camera_preview_height);
    camera_picture.set_vexpand(true);

    let camera_error_title = styled_label("error-title");
    let camera_error_label = styled_label("error-message");
    let camera_error_box = vertical(style_tokens.spacing_4, "error-banner");
    camera_error_box.append(&camera_error_title);
    camera_error_box.append(&camera_error_label);

    let capture_button = Button::new();
    capture_button.add_css_class("scouter-primary-button");
    capture_button.set_hexpand(true);
    let camera_cancel_button = Button::new();
    camera_cancel_button.set_hexpand(true);
    let camera_actions = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_8);
    camera_actions.append(&camera_cancel_button);
    camera_actions.append(&capture_button);

    let camera_page = vertical(style_tokens.spacing_12, "camera-page");
    camera_page.append(&camera_picture);
    camera_page.append(&camera_error_box);
    camera_page.append(&camera_actions);

    // ── Scan page: image, loading overlay, result or error ──
    let scan_picture = Picture::new();
    scan_picture.add_css_class("scan-image");
    scan_picture.set_size_request(-1, style_tokens.card_image_height);

    let spinner = Spinner::new();
    let loading_label = styled_label("loader-message");
    let loading_box = vertical(style_tokens.spacing_8, "loader");
    loading_box.set_halign(Align::Fill);
    loading_box.set_valign(Align::Fill);
    loading_box.set_vexpand(true);
    spinner.set_valign(Align::Center);
    spinner.set_vexpand(true);
    loading_box.append(&spinner);
    loading_box.append(&loading_label);

    let image_overlay = Overlay::new();
    image_overlay.set_child(Some(&scan_picture));
    image_overlay.add_overlay(&loading_box);

    let power_title = styled_label("power-title");
    let power_value = styled_label("power-value");
    let analysis_title = styled_label("analysis-title");
    let reasoning_label = styled_label("reasoning");
    let result_box = vertical(style_tokens.spacing_8, "result-box");
    result_box.append(&power_title);
    result_box.append(&power_value);
    result_box.append(&analysis_title);
    result_box.append(&reasoning_label);

    let error_title = styled_label("error-title");
    let error_label = styled_label("error-message");
    let error_box = vertical(style_tokens.spacing_4, "error-banner");
    error_box.append(&error_title);
    error_box.append(&error_label);

    let card = vertical(style_tokens.spacing_12, "scan-card");
    card.append(&image_overlay);
    card.append(&result_box);
    card.append(&error_box);

    let reset_button = Button::new();
    reset_button.add_css_class("scouter-primary-button");
    reset_button.set_hexpand(true);
    let copy_button = Button::new();
    copy_button.set_hexpand(true);
    let download_button = Button::new();
    download_button.set_hexpand(true);
    let scan_actions = GtkBox::new(Orientation::Horizontal, style_tokens.spacing_8);
    scan_actions.append(&reset_button);
    scan_actions.append(&copy_button);
    scan_actions.append(&download_button);

    let scan_page = vertical(style_tokens.spacing_12, "scan-page");
    scan_page.append(&card);
    scan_page.append(&scan_actions);

    let stack = Stack::new();
    stack.set_transition_type(StackTransitionType::Crossfade);
    stack.set_transition_duration(style_tokens.motion_hover_ms);
    stack.add_named(&uploader_page, Some(Page::Uploader.name()));
    stack.add_named(&camera_page, Some(Page::Camera.name()));
    stack.add_named(&scan_page, Some(Page::Scan.name()));
    stack.set_margin_top(style_tokens.spacing_16);
    stack.set_margin_bottom(style_tokens.spacing_16);
    stack.set_margin_start(style_tokens.spacing_16);
    stack.set_margin_end(style_tokens.spacing_16);

    // ── Window-wide overlays ──
    let drop_label = styled_label("dropzone-title");
    let drop_overlay = vertical(0, "dropzone");
    drop_overlay.set_halign(Align::Fill);
    drop_overlay.set_valign(Align::Fill);
    drop_label.set_vexpand(true);
    drop_overlay.append(&drop_label);
    drop_overlay.set_visible(false);
    drop_overlay.set_can_target(false);

    let toast_label = Label::new(Some(""));
    toast_label.add_css_class("toast-badge");
    toast_label.set_halign(Align::Center);
    toast_label.set_valign(Align::End);
    toast_label.set_margin_bottom(style_tokens.spacing_24);
    toast_label.set_visible(false);

    let root = Overlay::new();
    root.set_child(Some(&stack));
    root.add_overlay(&drop_overlay);
    root.add_overlay(&toast_label);
    window.set_child(Some(&root));

    ScouterWindow {
        window,
        settings_button,
        toast_label,
        upload_button,
        camera_button,
        camera_picture,
        capture_button,
        camera_cancel_button,
        card,
        reset_button,
        copy_button,
        download_button,
        title_label,
        stack,
        drop_overlay,
        drop_label,
        upload_title,
        upload_subtitle,
        or_label,
        camera_error_box,
        camera_error_title,
        camera_error_label,
        scan_picture,
        loading_box,
        spinner,
        loading_label,
        result_box,
        power_title,
        power_value,
        analysis_title,
        reasoning_label,
        error_box,
        error_title,
        error_label,
        shown_image: Rc::new(RefCell::new(None)),
    }
}

impl ScouterWindow {
    /// Texts that depend only on the active language.
    pub(super) fn apply_labels(&self, localizer: &Localizer) {
        let title = localizer.t("header.title");
        self.window.set_title(Some(title));
        self.title_label.set_text(title);
        self.settings_button
            .set_tooltip_text(Some(localizer.t("settings.button.label")));
        self.upload_title.set_text(localizer.t("uploader.title"));
        self.upload_subtitle.set_text(localizer.t("uploader.subtitle"));
        self.or_label.set_text(localizer.t("uploader.or"));
        self.camera_button.set_label(localizer.t("uploader.useCamera"));
        self.camera_error_title
            .set_text(localizer.t("camera.error.title"));
        self.capture_button.set_label(localizer.t("camera.capture"));
        self.camera_cancel_button
            .set_label(localizer.t("camera.cancel"));
        self.scan_picture
            .set_alternative_text(Some(localizer.t("display.imageAlt")));
        self.loading_label.set_text(localizer.t("loader.message"));
        self.power_title
            .set_text(localizer.t("display.powerLevelLabel"));
        self.analysis_title
            .set_text(localizer.t("display.analysisLabel"));
        self.error_title.set_text(localizer.t("display.errorTitle"));
        self.copy_button
            .set_label(localizer.t("display.copyButton.default"));
        self.download_button
            .set_label(localizer.t("display.downloadButton"));
        self.drop_label.set_text(localizer.t("dropzone.title"));
    }

    pub(super) fn render(&self, model: &ViewModel) {
        self.stack.set_visible_child_name(model.page.name());

        self.upload_button.set_sensitive(model.acquisition_enabled);
        self.camera_button.set_sensitive(model.acquisition_enabled);

        self.camera_error_box
            .set_visible(model.camera_error.is_some());
        self.camera_error_label
            .set_text(model.camera_error.as_deref().unwrap_or_default());
        self.capture_button
            .set_sensitive(model.page == Page::Camera && model.camera_error.is_none());
        if model.page != Page::Camera {
            self.camera_picture.set_paintable(None::<&gtk4::gdk::Paintable>);
        }

        self.show_image(model.image.as_ref());
        self.loading_box.set_visible(model.loading);
        if model.loading {
            self.spinner.start();
        } else {
            self.spinner.stop();
        }

        self.result_box.set_visible(model.power_level.is_some());
        self.power_value
            .set_text(model.power_level.as_deref().unwrap_or_default());
        self.reasoning_label
            .set_text(model.reasoning.as_deref().unwrap_or_default());
        self.error_box.set_visible(model.error.is_some());
        self.error_label
            .set_text(model.error.as_deref().unwrap_or_default());

        self.reset_button.set_label(&model.reset_label);
        self.reset_button.set_sensitive(model.reset_sensitive);
        self.copy_button.set_visible(model.export_sensitive);
        self.download_button.set_visible(model.export_sensitive);
    }

    fn show_image(&self, image: Option<&ImagePayload>) {
        let mut shown = self.shown_image.borrow_mut();
        if shown.as_ref() == image {
            return;
        }
        let texture = image.and_then(texture_for_image);
        if image.is_some() && texture.is_none() {
            tracing::warn!("submitted image could not be decoded for display");
        }
        self.scan_picture.set_paintable(texture.as_ref());
        *shown = image.cloned();
    }

    pub(super) fn set_drop_overlay_visible(&self, visible: bool) {
        self.drop_overlay.set_visible(visible);
    }
}
