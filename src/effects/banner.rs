use super::{Entity, Tick};
use crate::color::{Rgb, pick, pick_other};
use crate::config::BannerConfig;
use crate::surface::Surface;
use crate::text::{OpacityMask, TextRasterizer};
use tracing::trace;

pub struct Banner {
    mask: OpacityMask,
    x: f32,
    y: f32,
    speed: f32,
    color: Rgb,
}

impl Banner {
    pub fn new(
        rasterizer: &dyn TextRasterizer,
        config: &BannerConfig,
        width: f32,
        height: f32,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let mask = rasterizer.rasterize(&config.text, config.font_size);
        let y = (height * config.row_fraction - mask.height as f32 / 2.0).max(0.0);
        Self { mask, x: width, y, speed: config.speed, color: pick(rng, &config.palette) }
    }

    #[cfg(test)]
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    #[cfg(test)]
    pub fn color(&self) -> Rgb {
        self.color
    }
}

impl Entity for Banner {
    fn update(&mut self, tick: &mut Tick<'_>) {
        self.x -= self.speed;
        if self.x + (self.mask.width as f32) < 0.0 {
            self.x = tick.width;
            self.color = pick_other(tick.rng, &tick.config.banner.palette, self.color);
            trace!(color = ?self.color, "banner wrapped");
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_mask(&self.mask, self.x, self.y, self.color, 1.0);
    }
}
