use super::{Entity, Tick};
use crate::color::Rgb;
use crate::surface::{LinearGradient, Path, Surface};
use noise::{NoiseFn, Perlin};
use std::f32::consts::TAU;

// Night-sky wash behind the ribbons, top to bottom.
const SKY_STOPS: [(f32, Rgb, f32); 6] = [
    (0.0, Rgb(0, 10, 30), 0.6),
    (0.3, Rgb(10, 120, 100), 0.5),
    (0.5, Rgb(40, 80, 180), 0.5),
    (0.7, Rgb(80, 60, 150), 0.5),
    (0.9, Rgb(40, 10, 80), 0.5),
    (1.0, Rgb(0, 10, 40), 0.3),
];
const RIBBON_ALPHA: f32 = 0.3;
const RIBBON_STEP: f32 = 4.0;

pub struct Aurora {
    noise: Perlin,
    width: f32,
    band: f32,
    colors: Vec<Rgb>,
    time: f32,
    gradient: LinearGradient,
}

impl Aurora {
    pub fn new(seed: u32, width: f32, height: f32, fraction: f32, colors: Vec<Rgb>) -> Self {
        let band = height * fraction;
        let mut gradient = LinearGradient::new(0.0, 0.0, 0.0, band);
        for (offset, color, alpha) in SKY_STOPS {
            gradient.add_stop(offset, color, alpha);
        }
        Self { noise: Perlin::new(seed), width, band, colors, time: 0.0, gradient }
    }

    // Crest height of ribbon `index` at column `x`.
    fn crest(&self, index: usize, x: f32) -> f32 {
        let frequency = TAU * 1.5 / self.width.max(1.0);
        let swell = self.noise.get([x as f64 * 0.02, self.time as f64 * 0.3, index as f64 * 7.0]) as f32;
        let amplitude = self.band * 0.15 * (1.0 + 0.5 * swell);
        let phase = x * frequency + self.time * 0.2 + index as f32;
        phase.sin() * amplitude + self.band * (0.5 + index as f32 * 0.1)
    }

    fn ribbon(&self, index: usize) -> Path {
        let base = self.band * 0.8;
        let mut path = Path::new();
        path.move_to(0.0, base);
        let mut x = 0.0;
        while x < self.width {
            path.line_to(x, self.crest(index, x));
            x += RIBBON_STEP;
        }
        path.line_to(self.width, self.crest(index, self.width)).line_to(self.width, base).close();
        path
    }
}

impl Entity for Aurora {
    fn update(&mut self, tick: &mut Tick<'_>) {
        self.time = tick.time;
    }

    fn draw(&self, surface: &mut dyn Surface) {
        if self.band <= 0.0 {
            return;
        }
        surface.fill_rect_gradient(0.0, 0.0, self.width, self.band, &self.gradient);
        for (index, color) in self.colors.iter().enumerate() {
            surface.fill_path(&self.ribbon(index), *color, RIBBON_ALPHA);
        }
    }
}
