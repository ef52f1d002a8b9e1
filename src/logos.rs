//! Channel logo textures: background fetch + decode, uploaded on the UI thread

use std::collections::HashMap;

use eframe::egui;
use image::GenericImageView;

use crate::error::Result;

/// Longest edge kept after decoding
pub const LOGO_MAX_SIDE: u32 = 256;

/// Logo downloads running at once
const MAX_IN_FLIGHT: usize = 8;

enum LogoState {
    Pending,
    Ready(egui::TextureHandle),
    Failed,
}

/// Logo textures keyed by URL
#[derive(Default)]
pub struct LogoCache {
    states: HashMap<String, LogoState>,
    in_flight: usize,
}

impl LogoCache {
    pub fn texture(&self, url: &str) -> Option<&egui::TextureHandle> {
        match self.states.get(url) {
            Some(LogoState::Ready(texture)) => Some(texture),
            _ => None,
        }
    }

    /// Texture for `url` if loaded; unseen URLs are queued in `wanted`
    pub fn lookup(&self, url: Option<&str>, wanted: &mut Vec<String>) -> Option<&egui::TextureHandle> {
        let url = url.filter(|u| !u.is_empty())?;
        if !self.states.contains_key(url) && !wanted.iter().any(|w| w == url) {
            wanted.push(url.to_string());
        }
        self.texture(url)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Reserve a download slot. False when already known or too many are running.
    pub fn begin(&mut self, url: &str) -> bool {
        if self.states.contains_key(url) || self.in_flight >= MAX_IN_FLIGHT {
            return false;
        }
        self.states.insert(url.to_string(), LogoState::Pending);
        self.in_flight += 1;
        true
    }

    /// Store a finished download; `None` means the logo is unusable and initials are drawn instead
    pub fn finish(&mut self, ctx: &egui::Context, url: String, image: Option<egui::ColorImage>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let state = match image {
            Some(image) => LogoState::Ready(ctx.load_texture(format!("logo:{}", url), image, egui::TextureOptions::LINEAR)),
            None => LogoState::Failed,
        };
        self.states.insert(url, state);
    }
}

/// Decode PNG/JPEG/WebP/GIF bytes, shrinking so neither side exceeds `max_side`
pub fn decode(bytes: &[u8], max_side: u32) -> Result<egui::ColorImage> {
    let mut img = image::load_from_memory(bytes)?;
    let (w, h) = img.dimensions();
    if w > max_side || h > max_side {
        img = img.resize(max_side, max_side, image::imageops::FilterType::Triangle);
    }

    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// `size` scaled to fit inside `bounds`, aspect ratio kept
pub fn fit(size: egui::Vec2, bounds: egui::Vec2) -> egui::Vec2 {
    if size.x <= 0.0 || size.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    size * (bounds.x / size.x).min(bounds.y / size.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 105, 180, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_keeps_small_logo() {
        let image = decode(&png(40, 20), LOGO_MAX_SIDE).unwrap();
        assert_eq!(image.size, [40, 20]);
    }

    #[test]
    fn test_decode_downscales_large_logo() {
        let image = decode(&png(1024, 512), 256).unwrap();
        assert_eq!(image.size, [256, 128]);
    }

    #[test]
    fn test_decode_rejects_svg() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#;
        assert!(decode(svg, LOGO_MAX_SIDE).is_err());
    }

    #[test]
    fn test_begin_once_per_url() {
        let mut cache = LogoCache::default();
        assert!(cache.begin("http://logo/a.png"));
        assert!(!cache.begin("http://logo/a.png"));
        assert!(cache.is_loading());
    }

    #[test]
    fn test_in_flight_is_capped() {
        let mut cache = LogoCache::default();
        for i in 0..MAX_IN_FLIGHT {
            assert!(cache.begin(&format!("http://logo/{}.png", i)));
        }
        assert!(!cache.begin("http://logo/extra.png"));

        let ctx = egui::Context::default();
        cache.finish(&ctx, "http://logo/0.png".to_string(), None);
        assert!(cache.begin("http://logo/extra.png"));
    }

    #[test]
    fn test_finish_uploads_texture() {
        let ctx = egui::Context::default();
        let mut cache = LogoCache::default();
        cache.begin("http://logo/a.png");
        cache.begin("http://logo/b.svg");

        cache.finish(&ctx, "http://logo/a.png".to_string(), decode(&png(8, 8), LOGO_MAX_SIDE).ok());
        cache.finish(&ctx, "http://logo/b.svg".to_string(), None);

        assert_eq!(cache.texture("http://logo/a.png").map(|t| t.size()), Some([8, 8]));
        assert!(cache.texture("http://logo/b.svg").is_none());
    }

    #[test]
    fn test_lookup_queues_unknown_once() {
        let mut cache = LogoCache::default();
        cache.begin("http://logo/pending.png");
        let mut wanted = Vec::new();

        assert!(cache.lookup(Some("http://logo/new.png"), &mut wanted).is_none());
        cache.lookup(Some("http://logo/new.png"), &mut wanted);
        cache.lookup(Some("http://logo/pending.png"), &mut wanted);
        cache.lookup(None, &mut wanted);
        cache.lookup(Some(""), &mut wanted);

        assert_eq!(wanted, ["http://logo/new.png"]);
    }

    #[test]
    fn test_fit_keeps_aspect() {
        let out = fit(egui::vec2(200.0, 100.0), egui::vec2(100.0, 100.0));
        assert_eq!(out, egui::vec2(100.0, 50.0));
        assert_eq!(fit(egui::Vec2::ZERO, egui::vec2(10.0, 10.0)), egui::Vec2::ZERO);
    }
}
