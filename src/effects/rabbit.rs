use super::moon::anchor;
use super::{Entity, Tick};
use crate::color::Rgb;
use crate::surface::{Path, Surface};

const FUR: Rgb = Rgb(150, 140, 125);

pub struct Rabbit {
    moon_center: (f32, f32),
    moon_radius: f32,
}

impl Rabbit {
    pub fn new(moon_radius: f32) -> Self {
        Self { moon_center: (0.0, 0.0), moon_radius }
    }

    // Body centre, derived from the moon and therefore from the pointer alone.
    pub fn position(&self) -> (f32, f32) {
        let (cx, cy) = self.moon_center;
        (cx + self.moon_radius * 0.1, cy + self.moon_radius * 0.2)
    }

    fn silhouette(&self) -> Path {
        let (bx, by) = self.position();
        let r = self.moon_radius;
        let head = (bx - r * 0.28, by - r * 0.2);

        let mut path = Path::new();
        path.ellipse(bx, by, r * 0.3, r * 0.22, 0.0).circle(head.0, head.1, r * 0.16);
        for (dx, tilt) in [(-0.05, -0.25), (0.06, 0.2)] {
            let ear = (head.0 + r * dx, head.1 - r * 0.3);
            path.ellipse(ear.0, ear.1, r * 0.05, r * 0.18, tilt);
        }
        path
    }
}

impl Entity for Rabbit {
    fn update(&mut self, tick: &mut Tick<'_>) {
        let layout = &tick.config.layout;
        self.moon_center =
            anchor(tick.pointer, tick.width, tick.height, self.moon_radius, layout.moon_offset);
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_path(&self.silhouette(), FUR, 0.9);
    }
}
