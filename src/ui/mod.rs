pub mod style;
pub mod widgets;

pub use style::{ColorTokens, StyleTokens, LAYOUT_TOKENS, SCOUTER_COLORS};
pub use widgets::{decode_rgba, icon_button, texture_for_image};
