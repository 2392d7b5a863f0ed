use std::collections::HashMap;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, RgbaImage};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use storyscroll_core::crossfade::{LoadState, SlotId};
use storyscroll_core::AssetHandle;

use crate::app::App;

/// Resized images kept before the cache starts over
const FIT_CACHE_LIMIT: usize = 8;

/// Images already fitted to a canvas size, keyed by asset and size
#[derive(Default)]
pub struct ImageFitCache {
    entries: HashMap<(AssetHandle, u32, u32), Arc<RgbaImage>>,
}

impl ImageFitCache {
    pub fn fit(
        &mut self,
        asset: &AssetHandle,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Arc<RgbaImage> {
        let key = (asset.clone(), width, height);
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit);
        }
        if self.entries.len() >= FIT_CACHE_LIMIT {
            self.entries.clear();
        }
        let fitted = Arc::new(fit_image(image, width, height));
        self.entries.insert(key, Arc::clone(&fitted));
        fitted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Resize to fit inside `width` x `height`, keeping the aspect ratio
fn fit_image(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let (img_width, img_height) = img.dimensions();
    if img_width == 0 || img_height == 0 {
        return RgbaImage::new(1, 1);
    }
    let scale_w = width as f32 / img_width as f32;
    let scale_h = height as f32 / img_height as f32;
    let scale = scale_w.min(scale_h);

    let new_width = ((img_width as f32 * scale) as u32).max(1);
    let new_height = ((img_height as f32 * scale) as u32).max(1);

    img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
        .to_rgba8()
}

/// Blend `layer` centered onto `canvas` at `opacity`, scaled around the center
pub fn composite_layer(canvas: &mut RgbImage, layer: &RgbaImage, opacity: f64, scale: f64) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || scale <= 0.0 {
        return;
    }
    let (canvas_w, canvas_h) = canvas.dimensions();
    let (layer_w, layer_h) = layer.dimensions();
    let center_x = canvas_w as f64 / 2.0;
    let center_y = canvas_h as f64 / 2.0;

    for y in 0..canvas_h {
        let ly = (y as f64 + 0.5 - center_y) / scale + layer_h as f64 / 2.0;
        if ly < 0.0 || ly >= layer_h as f64 {
            continue;
        }
        for x in 0..canvas_w {
            let lx = (x as f64 + 0.5 - center_x) / scale + layer_w as f64 / 2.0;
            if lx < 0.0 || lx >= layer_w as f64 {
                continue;
            }
            let src = layer.get_pixel(lx as u32, ly as u32);
            let alpha = src[3] as f64 / 255.0 * opacity;
            let dst = canvas.get_pixel_mut(x, y);
            for c in 0..3 {
                let mixed = dst[c] as f64 * (1.0 - alpha) + src[c] as f64 * alpha;
                dst[c] = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

pub struct CrossfadeViewWidget;

impl CrossfadeViewWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &mut App) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.grey1))
            .style(Style::default().bg(app.theme.bg0));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // Each character cell holds 2 vertical pixels
        let width = inner.width as u32;
        let height = inner.height as u32 * 2;
        let [r, g, b] = app.theme.background_rgb();
        let mut canvas = RgbImage::from_pixel(width, height, Rgb([r, g, b]));

        let crossfade = app.engine.crossfade();
        let mut slots = [crossfade.slot(SlotId::A), crossfade.slot(SlotId::B)];
        slots.sort_by_key(|slot| slot.z_order());

        let mut placeholder = None;
        for slot in slots {
            if slot.opacity() <= 0.0 {
                continue;
            }
            let Some(asset) = slot.asset() else {
                continue;
            };
            match slot.image() {
                Some(image) => {
                    let fitted = app.fit_cache.fit(asset, image, width, height);
                    composite_layer(&mut canvas, &fitted, slot.opacity(), slot.scale());
                }
                None if slot.load_state() == LoadState::Failed => {
                    let alt = app
                        .engine
                        .story()
                        .iter()
                        .find(|step| step.asset() == asset)
                        .map(|step| step.alt().to_string())
                        .unwrap_or_else(|| asset.to_string());
                    placeholder = Some((alt, app.theme.error));
                }
                None => placeholder = Some(("loading…".to_string(), app.theme.grey2)),
            }
        }

        render_halfblocks(frame, inner, &canvas);

        if let Some((text, color)) = placeholder {
            let row = Rect {
                x: inner.x,
                y: inner.y + inner.height / 2,
                width: inner.width,
                height: 1,
            };
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(color).bg(app.theme.bg0))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, row);
        }
    }
}

fn render_halfblocks(frame: &mut Frame, area: Rect, canvas: &RgbImage) {
    let (width, height) = canvas.dimensions();
    let lines: Vec<Line> = (0..area.height as u32)
        .map(|row| {
            let y = row * 2;
            let spans: Vec<Span> = (0..width)
                .map(|x| {
                    let top = canvas.get_pixel(x, y);
                    let bottom = if y + 1 < height {
                        canvas.get_pixel(x, y + 1)
                    } else {
                        top
                    };
                    Span::styled(
                        "▀",
                        Style::default()
                            .fg(Color::Rgb(top[0], top[1], top[2]))
                            .bg(Color::Rgb(bottom[0], bottom[1], bottom[2])),
                    )
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
