use std::cell::Cell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{
    Align, Box as GtkBox, Button, Dialog, DropDown, Label, Orientation, PasswordEntry, ResponseType,
    StringList,
};

use crate::analysis::AVAILABLE_MODELS;
use crate::i18n::{Language, Localizer};

use super::actions::ScanActions;

struct SettingsLabels {
    model_label: Label,
    model_description: Label,
    language_label: Label,
    api_key_label: Label,
    api_key_description: Label,
}

fn field_label(css_class: &str) -> Label {
    let label = Label::new(None);
    label.add_css_class(css_class);
    label.set_halign(Align::Start);
    label.set_xalign(0.0);
    label.set_wrap(true);
    label
}

fn model_names(localizer: &Localizer) -> Vec<String> {
    AVAILABLE_MODELS
        .iter()
        .map(|model| localizer.t(model.name_key).to_string())
        .collect()
}

fn language_names(localizer: &Localizer) -> Vec<String> {
    Language::ALL
        .iter()
        .map(|language| localizer.t(language.name_key()).to_string())
        .collect()
}

fn replace_items(list: &StringList, items: &[String]) {
    let items = items.iter().map(String::as_str).collect::<Vec<_>>();
    list.splice(0, list.n_items(), &items);
}

fn dropdown_index(position: Option<usize>) -> u32 {
    position
        .and_then(|index| u32::try_from(index).ok())
        .unwrap_or(0)
}

pub(super) fn present_settings_dialog(actions: &ScanActions) {
    let style_tokens = actions.style_tokens;
    let settings = actions.controller.borrow().settings().clone();

    let dialog = Dialog::new();
    dialog.add_css_class("scouter-root");
    dialog.set_transient_for(Some(&actions.window.window));
    dialog.set_modal(true);
    dialog.set_destroy_with_parent(true);
    let close_button = Button::new();
    close_button.add_css_class("scouter-primary-button");

    let labels = SettingsLabels {
        model_label: field_label("settings-label"),
        model_description: field_label("settings-description"),
        language_label: field_label("settings-label"),
        api_key_label: field_label("settings-label"),
        api_key_description: field_label("settings-description"),
    };

    let (model_list, language_list) = {
        let localizer = actions.localizer.borrow();
        (
            StringList::new(
                &model_names(&localizer)
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>(),
            ),
            StringList::new(
                &language_names(&localizer)
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>(),
            ),
        )
    };
    let model_dropdown = DropDown::new(Some(model_list.clone()), None::<gtk4::Expression>);
    model_dropdown.set_selected(dropdown_index(
        AVAILABLE_MODELS
            .iter()
            .position(|model| model.id == settings.model.id),
    ));
    let language_dropdown =
        DropDown::new(Some(language_list.clone()), None::<gtk4::Expression>);
    language_dropdown.set_selected(dropdown_index(
        Language::ALL
            .iter()
            .position(|language| *language == settings.language),
    ));

    let api_key_entry = PasswordEntry::new();
    api_key_entry.set_show_peek_icon(true);
    api_key_entry.set_text(&settings.api_key);

    let content = GtkBox::new(Orientation::Vertical, style_tokens.spacing_8);
    content.set_margin_top(style_tokens.spacing_16);
    content.set_margin_bottom(style_tokens.spacing_16);
    content.set_margin_start(style_tokens.spacing_16);
    content.set_margin_end(style_tokens.spacing_16);
    content.append(&labels.model_label);
    content.append(&model_dropdown);
    content.append(&labels.model_description);
    content.append(&labels.language_label);
    content.append(&language_dropdown);
    content.append(&labels.api_key_label);
    content.append(&api_key_entry);
    content.append(&labels.api_key_description);
    content.append(&close_button);
    dialog.content_area().append(&content);

    {
        let dialog = dialog.clone();
        close_button.connect_clicked(move |_| dialog.response(ResponseType::Close));
    }

    let relabel = {
        let dialog = dialog.clone();
        let api_key_entry = api_key_entry.clone();
        let close_button = close_button.clone();
        move |localizer: &Localizer| {
            dialog.set_title(Some(localizer.t("settings.title")));
            close_button.set_label(localizer.t("settings.closeButton"));
            labels.model_label.set_text(localizer.t("settings.modelLabel"));
            labels
                .model_description
                .set_text(localizer.t("settings.modelDescription"));
            labels
                .language_label
                .set_text(localizer.t("settings.languageLabel"));
            labels
                .api_key_label
                .set_text(localizer.t("settings.apiKeyLabel"));
            labels
                .api_key_description
                .set_text(localizer.t("settings.apiKeyDescription"));
            api_key_entry.set_property("placeholder-text", localizer.t("settings.apiKeyPlaceholder"));
        }
    };
    relabel(&actions.localizer.borrow());

    // Splicing the localized item lists re-fires selection notifications.
    let relabeling = Rc::new(Cell::new(false));

    {
        let actions = actions.clone();
        let relabeling = relabeling.clone();
        model_dropdown.connect_selected_notify(move |dropdown| {
            if relabeling.get() {
                return;
            }
            let Some(model) = usize::try_from(dropdown.selected())
                .ok()
                .and_then(|index| AVAILABLE_MODELS.get(index))
            else {
                return;
            };
            tracing::info!(model = model.id, "model selected");
            actions.controller.borrow_mut().set_model(*model);
        });
    }

    {
        let actions = actions.clone();
        let model_dropdown = model_dropdown.clone();
        language_dropdown.connect_selected_notify(move |dropdown| {
            if relabeling.get() {
                return;
            }
            let Some(language) = usize::try_from(dropdown.selected())
                .ok()
                .and_then(|index| Language::ALL.get(index))
                .copied()
            else {
                return;
            };
            if language == actions.localizer.borrow().language() {
                return;
            }
            tracing::info!(language = language.code(), "language selected");
            actions.controller.borrow_mut().set_language(language);
            actions.localizer.borrow_mut().set_language(language);

            relabeling.set(true);
            {
                let localizer = actions.localizer.borrow();
                let model_selected = model_dropdown.selected();
                replace_items(&model_list, &model_names(&localizer));
                model_dropdown.set_selected(model_selected);
                replace_items(&language_list, &language_names(&localizer));
                dropdown.set_selected(dropdown_index(
                    Language::ALL.iter().position(|item| *item == language),
                ));
                relabel(&localizer);
            }
            relabeling.set(false);
            actions.refresh();
        });
    }

    {
        let actions = actions.clone();
        api_key_entry.connect_changed(move |entry| {
            actions.controller.borrow_mut().set_api_key(&entry.text());
        });
    }

    dialog.connect_response(|dialog, _| dialog.close());
    dialog.present();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropdown_index_defaults_to_first_entry() {
        assert_eq!(dropdown_index(None), 0);
        assert_eq!(dropdown_index(Some(1)), 1);
    }

    #[test]
    fn localized_names_cover_every_choice() {
        let localizer = Localizer::new(Language::Chinese);
        assert_eq!(model_names(&localizer).len(), AVAILABLE_MODELS.len());
        let languages = language_names(&localizer);
        assert_eq!(languages.len(), Language::ALL.len());
        assert!(languages.iter().all(|name| !name.starts_with("language.")));
    }
}
