/// Compile-time layout tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_4: i32,
    pub spacing_8: i32,
    pub spacing_12: i32,
    pub spacing_16: i32,
    pub spacing_24: i32,
    pub card_radius: u16,
    pub control_radius: u16,
    pub control_size: u16,
    pub border_width: u16,
    pub window_default_width: i32,
    pub window_default_height: i32,
    pub card_image_height: i32,
    pub camera_preview_height: i32,
    pub camera_tick_ms: u32,
    pub motion_hover_ms: u32,
    pub toast_duration_ms: u32,
    pub copied_feedback_ms: u32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_4: 4,
    spacing_8: 8,
    spacing_12: 12,
    spacing_16: 16,
    spacing_24: 24,
    card_radius: 16,
    control_radius: 10,
    control_size: 40,
    border_width: 2,
    window_default_width: 560,
    window_default_height: 760,
    card_image_height: 320,
    camera_preview_height: 360,
    camera_tick_ms: 100,
    motion_hover_ms: 160,
    toast_duration_ms: 2_500,
    copied_feedback_ms: 2_000,
};

/// Scouter palette: green phosphor on near-black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTokens {
    pub window_background: &'static str,
    pub panel_background: &'static str,
    pub text_color: &'static str,
    pub muted_text_color: &'static str,
    pub border_color: &'static str,
    pub accent_color: &'static str,
    pub accent_text_color: &'static str,
    pub focus_ring_glow: &'static str,
    pub danger_color: &'static str,
}

pub const SCOUTER_COLORS: ColorTokens = ColorTokens {
    window_background: "#0b0f0b",
    panel_background: "rgba(12, 28, 14, 0.92)",
    text_color: "#d7ffd9",
    muted_text_color: "rgba(215, 255, 217, 0.62)",
    border_color: "rgba(74, 222, 128, 0.45)",
    accent_color: "#4ade80",
    accent_text_color: "#052e16",
    focus_ring_glow: "rgba(74, 222, 128, 0.35)",
    danger_color: "#f87171",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_tokens_keep_required_control_size() {
        assert_eq!(LAYOUT_TOKENS.control_size, 40);
    }

    #[test]
    fn feedback_timers_are_shorter_than_toasts() {
        let tokens = LAYOUT_TOKENS;
        assert!(tokens.copied_feedback_ms <= tokens.toast_duration_ms);
        assert!(tokens.camera_tick_ms < tokens.copied_feedback_ms);
    }

    #[test]
    fn palette_colors_are_css_values() {
        for color in [
            SCOUTER_COLORS.window_background,
            SCOUTER_COLORS.text_color,
            SCOUTER_COLORS.accent_color,
            SCOUTER_COLORS.danger_color,
        ] {
            assert!(color.starts_with('#') || color.starts_with("rgba("), "{color}");
        }
    }
}
