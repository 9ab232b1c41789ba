use gtk4::prelude::*;
use gtk4::{gdk, glib, Button};

use crate::acquisition::ImagePayload;

pub fn icon_button(
    icon_name: &str,
    tooltip: &str,
    control_size: i32,
    extra_classes: &[&str],
) -> Button {
    let button = Button::from_icon_name(icon_name);
    button.set_focus_on_click(false);
    button.set_tooltip_text(Some(tooltip));
    button.add_css_class("flat");
    button.add_css_class("icon-button");
    for css_class in extra_classes {
        button.add_css_class(css_class);
    }
    button.set_size_request(control_size, control_size);
    button
}

/// Decode any supported image into tightly packed RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> Option<(u32, u32, Vec<u8>)> {
    let decoded = image::load_from_memory(bytes)
        .inspect_err(|err| tracing::debug!(%err, "image decode failed"))
        .ok()?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Some((width, height, rgba.into_raw()))
}

pub fn texture_for_image(payload: &ImagePayload) -> Option<gdk::Texture> {
    let (width, height, pixels) = decode_rgba(payload.bytes())?;
    let stride = usize::try_from(width).ok()?.checked_mul(4)?;
    let texture = gdk::MemoryTexture::new(
        i32::try_from(width).ok()?,
        i32::try_from(height).ok()?,
        gdk::MemoryFormat::R8g8b8a8,
        &glib::Bytes::from_owned(pixels),
        stride,
    );
    Some(texture.upcast())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decode_rgba_reads_png_dimensions() {
        let source = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 200, 30, 255]));
        let mut png = Cursor::new(Vec::new());
        source
            .write_to(&mut png, image::ImageFormat::Png)
            .expect("encode png");

        let (width, height, pixels) = decode_rgba(png.get_ref()).expect("decoded");
        assert_eq!((width, height), (3, 2));
        assert_eq!(pixels.len(), 3 * 2 * 4);
        assert_eq!(&pixels[..4], &[10, 200, 30, 255]);
    }

    #[test]
    fn decode_rgba_rejects_garbage() {
        assert!(decode_rgba(b"definitely not an image").is_none());
    }
}
