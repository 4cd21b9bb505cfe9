// Turns a string into particle seeds: rasterize it to an opacity mask, sample
// the mask on a fixed stride and keep every sample above the threshold.

use crate::config::TextConfig;
use crate::text::{OpacityMask, TextRasterizer};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSeed {
    pub target: (f32, f32),
    pub velocity: (f32, f32),
}

pub struct Decomposer {
    rasterizer: Box<dyn TextRasterizer>,
    config: TextConfig,
}

impl Decomposer {
    pub fn new(rasterizer: Box<dyn TextRasterizer>, config: TextConfig) -> Self {
        Self { rasterizer, config }
    }

    pub fn rasterizer(&self) -> &dyn TextRasterizer {
        self.rasterizer.as_ref()
    }

    // Blank input falls back to the configured default phrase.
    pub fn resolve<'t>(&'t self, text: &'t str) -> &'t str {
        if text.trim().is_empty() { &self.config.default_text } else { text }
    }

    // Mask coordinates, in row-major order, of every retained sample.
    pub fn sample(&self, mask: &OpacityMask) -> Vec<(usize, usize)> {
        let stride = self.config.stride.max(1);
        let mut kept = Vec::new();
        for y in (0..mask.height).step_by(stride) {
            for x in (0..mask.width).step_by(stride) {
                if mask.get(x, y) > self.config.threshold {
                    kept.push((x, y));
                }
            }
        }
        kept
    }

    pub fn decompose(&self, text: &str, font_size: f32, anchor: (f32, f32)) -> Vec<ParticleSeed> {
        let text = self.resolve(text);
        let mask = self.rasterizer.rasterize(text, font_size);
        let mut kept = self.sample(&mask);

        let cap = self.config.max_particles.max(1);
        if kept.len() > cap {
            let step = kept.len().div_ceil(cap);
            warn!(requested = kept.len(), cap, step, "thinning shaped firework");
            kept = kept.into_iter().step_by(step).collect();
        }

        let cx = mask.width as f32 / 2.0;
        let cy = mask.height as f32 / 2.0;
        let c = &self.config;

        kept.into_iter()
            .map(|(x, y)| {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let angle = dy.atan2(dx);
                let speed = dx.hypot(dy) * c.radial_gain + c.base_speed;
                ParticleSeed {
                    target: (anchor.0 + dx, anchor.1 + dy),
                    velocity: (
                        angle.cos() * speed * c.horizontal_scale,
                        angle.sin() * speed * c.vertical_scale,
                    ),
                }
            })
            .collect()
    }
}
