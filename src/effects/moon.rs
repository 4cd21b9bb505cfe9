use super::{Entity, Tick};
use crate::color::Rgb;
use crate::surface::Surface;

const GLOW: Rgb = Rgb(255, 250, 220);
const CRATER: Rgb = Rgb(215, 208, 180);
// Crater offsets and radii as fractions of the moon radius.
const CRATERS: [(f32, f32, f32); 3] = [(-0.35, -0.3, 0.18), (0.3, 0.1, 0.22), (-0.1, 0.45, 0.12)];

// Moon centre for a pointer position: `offset` above it, kept fully on the surface.
pub fn anchor(pointer: (f32, f32), width: f32, height: f32, radius: f32, offset: f32) -> (f32, f32) {
    fn fit(v: f32, radius: f32, extent: f32) -> f32 {
        if extent <= radius * 2.0 { extent / 2.0 } else { v.clamp(radius, extent - radius) }
    }
    let (px, py) = pointer;
    (fit(px, radius, width), fit(py - offset, radius, height))
}

pub struct Moon {
    center: (f32, f32),
    radius: f32,
}

impl Moon {
    pub fn new(radius: f32) -> Self {
        Self { center: (0.0, 0.0), radius }
    }
}

impl Entity for Moon {
    fn update(&mut self, tick: &mut Tick<'_>) {
        let layout = &tick.config.layout;
        self.center = anchor(tick.pointer, tick.width, tick.height, self.radius, layout.moon_offset);
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let (cx, cy) = self.center;
        let r = self.radius;
        surface.fill_circle(cx, cy, r * 1.8, GLOW, 0.08);
        surface.fill_circle(cx, cy, r * 1.35, GLOW, 0.12);
        surface.fill_circle(cx, cy, r, GLOW, 1.0);
        for (dx, dy, cr) in CRATERS {
            surface.fill_circle(cx + dx * r, cy + dy * r, cr * r, CRATER, 0.7);
        }
    }
}
