// Masks are as wide as the measured text plus side padding and twice the
// font size tall, with the text centred in both directions.

use crate::error::{Error, Result};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpacityMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl OpacityMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0; width * height] }
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[y * self.width + x]
    }

    // Keeps the strongest coverage when glyphs overlap.
    fn stamp(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.data[idx] = self.data[idx].max(value);
    }
}

pub trait TextRasterizer {
    // Width and height of the inked text, without padding.
    fn measure(&self, text: &str, font_size: f32) -> (f32, f32);
    fn rasterize(&self, text: &str, font_size: f32) -> OpacityMask;
}

fn mask_frame(text_width: f32, font_size: f32) -> (usize, usize) {
    let pad = (font_size / 3.0).ceil().max(1.0);
    let width = (text_width + pad * 2.0).ceil().max(1.0) as usize;
    let height = (font_size * 2.0).ceil().max(1.0) as usize;
    (width, height)
}

const GLYPH_W: i32 = 5;
const GLYPH_H: i32 = 7;
const UNKNOWN: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

// Built-in 5x7 bitmap font, integer scaled. Needs no font file.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockFont;

impl BlockFont {
    fn scale(font_size: f32) -> i32 {
        ((font_size / GLYPH_H as f32).round() as i32).max(1)
    }

    fn glyph(ch: char) -> [u8; 7] {
        match ch.to_ascii_uppercase() {
            'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
            'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
            'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
            'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
            'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
            'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
            'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
            'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
            'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
            'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
            'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
            'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
            'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
            'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
            'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
            'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
            'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
            'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
            'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
            'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
            'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
            'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
            '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
            '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
            '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
            '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
            '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
            '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
            '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
            '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
            '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
            '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
            ' ' => [0x00; 7],
            '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
            '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
            '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
            ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
            '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
            '"' => [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00],
            '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
            ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
            ';' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08],
            '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
            ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
            '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
            '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
            '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
            '*' => [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00],
            '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A],
            '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
            '♥' | '❤' => [0x00, 0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0x00],
            _ => UNKNOWN,
        }
    }
}

impl TextRasterizer for BlockFont {
    fn measure(&self, text: &str, font_size: f32) -> (f32, f32) {
        let scale = Self::scale(font_size);
        let count = text.chars().count() as i32;
        if count == 0 {
            return (0.0, 0.0);
        }
        let advance = (GLYPH_W + 1) * scale;
        ((count * advance - scale) as f32, (GLYPH_H * scale) as f32)
    }

    fn rasterize(&self, text: &str, font_size: f32) -> OpacityMask {
        let scale = Self::scale(font_size);
        let (text_w, text_h) = self.measure(text, font_size);
        let (width, height) = mask_frame(text_w, font_size);
        let mut mask = OpacityMask::new(width, height);

        let origin_x = ((width as f32 - text_w) / 2.0).floor() as i32;
        let origin_y = ((height as f32 - text_h) / 2.0).floor() as i32;

        for (i, ch) in text.chars().enumerate() {
            let glyph = Self::glyph(ch);
            let gx = origin_x + i as i32 * (GLYPH_W + 1) * scale;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (0x10 >> col) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            mask.stamp(
                                gx + col * scale + sx,
                                origin_y + row as i32 * scale + sy,
                                255,
                            );
                        }
                    }
                }
            }
        }

        mask
    }
}

pub struct FontRasterizer {
    font: Font,
}

impl FontRasterizer {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Font(format!("failed to read font file {}: {e}", path.display())))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| Error::Font(format!("failed to parse font {}: {e}", path.display())))?;
        Ok(Self { font })
    }

    fn layout(&self, text: &str, font_size: f32) -> Layout {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.font], &TextStyle::new(text, font_size, 0));
        layout
    }
}

// Left edge and width of the inked glyph boxes `(x, width)`. Blank glyphs do not count.
fn ink_span(boxes: impl IntoIterator<Item = (f32, usize)>) -> (f32, f32) {
    let (left, right) = boxes
        .into_iter()
        .filter(|&(_, w)| w > 0)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(l, r), (x, w)| (l.min(x), r.max(x + w as f32)));
    if left > right { (0.0, 0.0) } else { (left, right - left) }
}

fn glyph_boxes(layout: &Layout) -> impl Iterator<Item = (f32, usize)> + '_ {
    layout.glyphs().iter().map(|g| (g.x, g.width))
}

impl TextRasterizer for FontRasterizer {
    fn measure(&self, text: &str, font_size: f32) -> (f32, f32) {
        let layout = self.layout(text, font_size);
        let (_, width) = ink_span(glyph_boxes(&layout));
        (width, layout.height())
    }

    fn rasterize(&self, text: &str, font_size: f32) -> OpacityMask {
        let layout = self.layout(text, font_size);
        let (left, text_w) = ink_span(glyph_boxes(&layout));
        let text_h = layout.height();
        let (width, height) = mask_frame(text_w, font_size);
        let mut mask = OpacityMask::new(width, height);

        let origin_x = ((width as f32 - text_w) / 2.0).floor();
        let origin_y = ((height as f32 - text_h) / 2.0).floor();

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, bitmap) = self.font.rasterize_config(glyph.key);
            let gx = (origin_x + glyph.x - left).round() as i32;
            let gy = (origin_y + glyph.y).round() as i32;
            for row in 0..glyph.height {
                for col in 0..glyph.width {
                    let value = bitmap[row * glyph.width + col];
                    if value > 0 {
                        mask.stamp(gx + col as i32, gy + row as i32, value);
                    }
                }
            }
        }

        mask
    }
}
