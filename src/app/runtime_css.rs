use crate::ui::{ColorTokens, StyleTokens};
use gtk4::CssProvider;

pub(super) fn runtime_css(tokens: StyleTokens, colors: &ColorTokens, motion_enabled: bool) -> String {
    let motion_hover_ms = if motion_enabled {
        tokens.motion_hover_ms
    } else {
        0
    };
    format!(
        "
window.scouter-root {{
  background: {window_background};
  color: {text_color};
  font-family: monospace;
}}
.scouter-root label {{
  color: {text_color};
}}
.scouter-title {{
  font-weight: 800;
  letter-spacing: 2px;
  color: {accent_color};
}}
button.upload-zone {{
  border-radius: {card_radius}px;
  border: {border_width}px dashed {border_color};
  background: {panel_background};
  padding: {spacing_24}px;
  transition: border-color {motion_hover_ms}ms ease, box-shadow {motion_hover_ms}ms ease;
}}
button.upload-zone:hover {{
  border-color: {accent_color};
  box-shadow: 0 0 0 3px {focus_ring_glow};
}}
.upload-title {{
  font-size: 1.2em;
  font-weight: 700;
}}
.upload-subtitle,
.upload-or {{
  color: {muted_text_color};
}}
button.scouter-primary-button {{
  border-radius: {control_radius}px;
  background: {accent_color};
  color: {accent_text_color};
  font-weight: 700;
  min-height: {control_size}px;
}}
button.scouter-primary-button label {{
  color: {accent_text_color};
}}
button.scouter-primary-button:disabled {{
  opacity: 0.45;
}}
.icon-button {{
  border-radius: {control_radius}px;
  min-width: {control_size}px;
  min-height: {control_size}px;
  padding: 0;
}}
.icon-button:hover {{
  box-shadow: 0 0 0 1.5px {focus_ring_glow};
}}
.scan-card,
.camera-preview {{
  border-radius: {card_radius}px;
  border: {border_width}px solid {border_color};
  background: {panel_background};
  padding: {spacing_12}px;
}}
.loader {{
  background: rgba(0, 0, 0, 0.55);
  border-radius: {control_radius}px;
}}
.loader-message {{
  color: {accent_color};
  font-weight: 700;
}}
.power-title,
.analysis-title {{
  color: {muted_text_color};
  letter-spacing: 3px;
}}
.power-value {{
  font-size: 3em;
  font-weight: 900;
  color: {accent_color};
}}
.reasoning {{
  font-style: italic;
}}
.error-banner {{
  border-radius: {control_radius}px;
  border: {border_width}px solid {danger_color};
  padding: {spacing_8}px {spacing_12}px;
}}
.error-banner label.error-title {{
  color: {danger_color};
  font-weight: 700;
}}
.dropzone {{
  background: rgba(5, 46, 22, 0.82);
  border: 4px dashed {accent_color};
}}
.dropzone-title {{
  font-size: 1.6em;
  font-weight: 800;
  color: {accent_color};
}}
.toast-badge {{
  border-radius: 999px;
  padding: {spacing_4}px {spacing_12}px;
  background: {panel_background};
  border: {border_width}px solid {border_color};
}}
.toast-badge.toast-error {{
  color: {danger_color};
  border-color: {danger_color};
}}
",
        window_background = colors.window_background,
        panel_background = colors.panel_background,
        text_color = colors.text_color,
        muted_text_color = colors.muted_text_color,
        border_color = colors.border_color,
        accent_color = colors.accent_color,
        accent_text_color = colors.accent_text_color,
        focus_ring_glow = colors.focus_ring_glow,
        danger_color = colors.danger_color,
        card_radius = tokens.card_radius,
        control_radius = tokens.control_radius,
        control_size = tokens.control_size,
        border_width = tokens.border_width,
        spacing_4 = tokens.spacing_4,
        spacing_8 = tokens.spacing_8,
        spacing_12 = tokens.spacing_12,
        spacing_24 = tokens.spacing_24,
    )
}

pub(super) fn install_runtime_css(tokens: StyleTokens, colors: &ColorTokens, motion_enabled: bool) {
    let Some(display) = gtk4::gdk::Display::default() else {
        tracing::warn!("no display available; skipping runtime css");
        return;
    };
    let provider = CssProvider::new();
    provider.load_from_data(&runtime_css(tokens, colors, motion_enabled));
    gtk4::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{LAYOUT_TOKENS, SCOUTER_COLORS};

    #[test]
    fn css_fills_every_placeholder() {
        let css = runtime_css(LAYOUT_TOKENS, &SCOUTER_COLORS, true);
        assert!(css.contains(SCOUTER_COLORS.accent_color));
        assert!(css.contains("border-radius: 16px"));
        assert!(!css.contains("{accent"));
    }

    #[test]
    fn motion_can_be_disabled() {
        let css = runtime_css(LAYOUT_TOKENS, &SCOUTER_COLORS, false);
        assert!(css.contains("border-color 0ms"));
    }
}
