//! Tray icon rendering
//!
//! Icons are drawn at runtime with tiny-skia instead of shipping `.ico`
//! resources: a coloured disc with a download arrow, plus a red badge with
//! the queue length. Layout calculation is kept apart from rasterization so
//! it can be tested on its own.

use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::app::state::AppState;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid icon size: {0}")]
    InvalidSize(u32),

    #[error("Font could not be parsed")]
    InvalidFont,
}

/// Disc colour for a state
pub fn state_color(state: AppState) -> Color {
    match state {
        AppState::Idle => Color::from_rgba8(33, 118, 210, 255),
        AppState::Capturing => Color::from_rgba8(46, 160, 67, 255),
        AppState::Dispatching => Color::from_rgba8(230, 126, 34, 255),
    }
}

/// Text shown on the badge, if any
pub fn badge_text(queued: usize) -> Option<String> {
    match queued {
        0 => None,
        1..=9 => Some(queued.to_string()),
        _ => Some("9+".to_string()),
    }
}

/// Pre-calculated geometry of one icon
#[derive(Debug, Clone, PartialEq)]
pub struct IconLayout {
    pub size: u32,
    pub disc_center: (f32, f32),
    pub disc_radius: f32,
    pub disc_color: Color,
    /// Closed polygon of the download arrow
    pub arrow: Vec<(f32, f32)>,
    pub badge: Option<Badge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub center: (f32, f32),
    pub radius: f32,
    pub text: String,
}

impl IconLayout {
    pub fn new(size: u32, state: AppState, queued: usize) -> Self {
        let s = size as f32;
        let center = s / 2.0;

        // Arrow: shaft from the top third down to a wide head near the bottom
        let shaft_half = s * 0.09;
        let head_half = s * 0.25;
        let top = s * 0.2;
        let head_top = s * 0.5;
        let tip = s * 0.8;
        let arrow = vec![
            (center - shaft_half, top),
            (center + shaft_half, top),
            (center + shaft_half, head_top),
            (center + head_half, head_top),
            (center, tip),
            (center - head_half, head_top),
            (center - shaft_half, head_top),
        ];

        let badge = badge_text(queued).map(|text| {
            let radius = s * 0.24;
            Badge {
                center: (s - radius, radius),
                radius,
                text,
            }
        });

        Self {
            size,
            disc_center: (center, center),
            disc_radius: s * 0.46,
            disc_color: state_color(state),
            arrow,
            badge,
        }
    }
}

/// Draws icon layouts into pixmaps
pub struct IconRenderer {
    font: Option<FontVec>,
}

impl IconRenderer {
    /// Renderer without text; badges are drawn as plain dots
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font_bytes(bytes: Vec<u8>) -> Result<Self, RendererError> {
        let font = FontVec::try_from_vec(bytes).map_err(|_| RendererError::InvalidFont)?;
        Ok(Self { font: Some(font) })
    }

    /// Uses the first readable font among `candidates`
    pub fn with_first_font<P: AsRef<Path>>(candidates: &[P]) -> Self {
        for path in candidates {
            let Ok(bytes) = fs::read(path) else {
                continue;
            };
            match Self::with_font_bytes(bytes) {
                Ok(renderer) => return renderer,
                Err(err) => tracing::warn!("{}: {err}", path.as_ref().display()),
            }
        }
        tracing::debug!("no badge font found, queue count is shown as a dot");
        Self::new()
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn render(&self, layout: &IconLayout) -> Result<Pixmap, RendererError> {
        if layout.size < 8 {
            return Err(RendererError::InvalidSize(layout.size));
        }
        let mut pixmap =
            Pixmap::new(layout.size, layout.size).ok_or(RendererError::PixmapCreationFailed)?;
        pixmap.fill(Color::TRANSPARENT);

        let (cx, cy) = layout.disc_center;
        fill_circle(&mut pixmap, cx, cy, layout.disc_radius, layout.disc_color);
        fill_polygon(&mut pixmap, &layout.arrow, Color::WHITE);

        if let Some(badge) = &layout.badge {
            let (bx, by) = badge.center;
            fill_circle(&mut pixmap, bx, by, badge.radius, Color::from_rgba8(211, 47, 47, 255));
            match &self.font {
                Some(font) => draw_text(&mut pixmap, font, badge),
                None => fill_circle(&mut pixmap, bx, by, badge.radius * 0.35, Color::WHITE),
            }
        }

        Ok(pixmap)
    }
}

impl Default for IconRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_circle(pixmap: &mut Pixmap, x: f32, y: f32, radius: f32, color: Color) {
    let mut pb = PathBuilder::new();
    pb.push_circle(x, y, radius);
    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

fn fill_polygon(pixmap: &mut Pixmap, points: &[(f32, f32)], color: Color) {
    let Some((&(x0, y0), rest)) = points.split_first() else {
        return;
    };
    let mut pb = PathBuilder::new();
    pb.move_to(x0, y0);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    pb.close();
    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Rasterizes the badge text centred on the badge, white on red
fn draw_text(pixmap: &mut Pixmap, font: &FontVec, badge: &Badge) {
    let scale = PxScale::from(badge.radius * 1.6);
    let scaled = font.as_scaled(scale);

    let width: f32 = badge
        .text
        .chars()
        .map(|c| scaled.h_advance(font.glyph_id(c)))
        .sum();
    let height = scaled.ascent() - scaled.descent();
    let mut x = badge.center.0 - width / 2.0;
    let baseline = badge.center.1 - height / 2.0 + scaled.ascent();

    let (w, h) = (pixmap.width() as i32, pixmap.height() as i32);
    for c in badge.text.chars() {
        let id = font.glyph_id(c);
        let glyph = id.with_scale_and_position(scale, point(x, baseline));
        x += scaled.h_advance(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        let data = pixmap.data_mut();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= w || py >= h {
                return;
            }
            let idx = ((py * w + px) * 4) as usize;
            blend_white(&mut data[idx..idx + 4], coverage.clamp(0.0, 1.0));
        });
    }
}

/// Blends white over one premultiplied RGBA pixel
fn blend_white(pixel: &mut [u8], coverage: f32) {
    for channel in pixel.iter_mut() {
        let value = *channel as f32;
        *channel = (value + (255.0 - value) * coverage).round() as u8;
    }
}

/// Converts a pixmap to straight-alpha BGRA rows, top to bottom
///
/// Win32 icon bitmaps expect non-premultiplied BGRA.
pub fn to_bgra(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        out.extend_from_slice(&[color.blue(), color.green(), color.red(), color.alpha()]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    #[test]
    fn badge_text_caps_at_nine() {
        assert_eq!(badge_text(0), None);
        assert_eq!(badge_text(3).as_deref(), Some("3"));
        assert_eq!(badge_text(9).as_deref(), Some("9"));
        assert_eq!(badge_text(42).as_deref(), Some("9+"));
    }

    #[test]
    fn layout_has_badge_only_with_queued_links() {
        assert!(IconLayout::new(32, AppState::Idle, 0).badge.is_none());

        let layout = IconLayout::new(32, AppState::Idle, 2);
        let badge = layout.badge.unwrap();
        assert_eq!(badge.text, "2");
        assert!(badge.center.0 > 16.0 && badge.center.1 < 16.0);
    }

    #[test]
    fn layout_colour_follows_state() {
        let idle = IconLayout::new(32, AppState::Idle, 0);
        let busy = IconLayout::new(32, AppState::Dispatching, 0);
        assert_ne!(idle.disc_color, busy.disc_color);
        assert_eq!(busy.disc_color, state_color(AppState::Dispatching));
    }

    #[test]
    fn renders_disc_arrow_and_transparent_corners() {
        let renderer = IconRenderer::new();
        let pixmap = renderer
            .render(&IconLayout::new(32, AppState::Capturing, 0))
            .unwrap();

        assert_eq!((pixmap.width(), pixmap.height()), (32, 32));
        assert_eq!(pixel(&pixmap, 0, 31).3, 0);
        // Arrow shaft is white
        assert_eq!(pixel(&pixmap, 16, 12), (255, 255, 255, 255));
        // Disc edge beside the arrow carries the state colour
        assert_eq!(pixel(&pixmap, 4, 16), (46, 160, 67, 255));
    }

    #[test]
    fn badge_without_font_is_red_with_white_dot() {
        let renderer = IconRenderer::new();
        let layout = IconLayout::new(32, AppState::Idle, 4);
        let badge = layout.badge.clone().unwrap();
        let pixmap = renderer.render(&layout).unwrap();

        let (bx, by) = (badge.center.0 as u32, badge.center.1 as u32);
        assert_eq!(pixel(&pixmap, bx, by), (255, 255, 255, 255));
        let edge_x = (badge.center.0 + badge.radius * 0.7) as u32;
        assert_eq!(pixel(&pixmap, edge_x.min(31), by), (211, 47, 47, 255));
    }

    #[test]
    fn tiny_sizes_are_rejected() {
        let renderer = IconRenderer::new();
        assert!(matches!(
            renderer.render(&IconLayout::new(4, AppState::Idle, 0)),
            Err(RendererError::InvalidSize(4))
        ));
    }

    #[test]
    fn missing_or_broken_fonts_fall_back_to_dots() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.ttf");
        std::fs::write(&junk, b"not a font").unwrap();

        let renderer = IconRenderer::with_first_font(&[dir.path().join("missing.ttf"), junk]);

        assert!(!renderer.has_font());
        assert!(matches!(
            IconRenderer::with_font_bytes(b"nope".to_vec()),
            Err(RendererError::InvalidFont)
        ));
    }

    #[test]
    fn bgra_conversion_swaps_channels_and_demultiplies() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(Color::from_rgba8(200, 100, 50, 128));

        let bgra = to_bgra(&pixmap);

        assert_eq!(bgra.len(), 4);
        assert_eq!(bgra[3], 128);
        assert!((bgra[0] as i32 - 50).abs() <= 2);
        assert!((bgra[1] as i32 - 100).abs() <= 2);
        assert!((bgra[2] as i32 - 200).abs() <= 2);
    }
}
