use super::{Entity, Tick, range};
use crate::color::{Rgb, pick};
use crate::config::LayoutConfig;
use crate::surface::{Path, Surface};
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowerStyle {
    Carnation,
    Rose,
}

pub struct Flower {
    x: f32,
    y: f32,
    size: f32,
    petals: usize,
    style: FlowerStyle,
    color: Rgb,
    center: Rgb,
    alpha: f32,
}

impl Flower {
    pub fn scatter(rng: &mut fastrand::Rng, width: f32, height: f32, layout: &LayoutConfig) -> Self {
        Self {
            x: rng.f32() * width,
            y: height * range(rng, layout.flower_band),
            size: range(rng, layout.flower_size),
            petals: rng.usize(5..=7),
            style: if rng.bool() { FlowerStyle::Carnation } else { FlowerStyle::Rose },
            color: pick(rng, &layout.flower_palette),
            center: layout.flower_center,
            alpha: 0.5 + rng.f32() * 0.5,
        }
    }

    pub fn populate(rng: &mut fastrand::Rng, width: f32, height: f32, layout: &LayoutConfig) -> Vec<Flower> {
        (0..layout.flower_count)
            .map(|_| Flower::scatter(rng, width, height, layout))
            .collect()
    }

    #[cfg(test)]
    pub fn style(&self) -> FlowerStyle {
        self.style
    }

    #[cfg(test)]
    pub fn petals(&self) -> usize {
        self.petals
    }

    fn petal(&self) -> Path {
        let mut path = Path::new();
        match self.style {
            FlowerStyle::Carnation => {
                let len = self.size * 1.5;
                path.move_to(0.0, 0.0)
                    .quad_to(len / 2.0, -len / 4.0, len, 0.0)
                    .quad_to(len / 2.0, len / 4.0, 0.0, 0.0)
                    .close();
            }
            FlowerStyle::Rose => {
                path.ellipse(self.size / 2.0, 0.0, self.size, self.size / 2.0, 0.0);
            }
        }
        path
    }

    fn center_radius(&self) -> f32 {
        match self.style {
            FlowerStyle::Carnation => self.size / 3.0,
            FlowerStyle::Rose => self.size / 2.0,
        }
    }
}

impl Entity for Flower {
    fn update(&mut self, _tick: &mut Tick<'_>) {}

    fn draw(&self, surface: &mut dyn Surface) {
        let petal = self.petal();
        let step = TAU / self.petals as f32;

        surface.save();
        surface.set_global_alpha(self.alpha);
        surface.translate(self.x, self.y);
        for _ in 0..self.petals {
            surface.fill_path(&petal, self.color, 1.0);
            surface.rotate(step);
        }
        surface.fill_circle(0.0, 0.0, self.center_radius(), self.center, 1.0);
        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;

    #[test]
    fn pool_respects_band_and_petal_range() {
        let layout = LayoutConfig::default();
        let mut rng = fastrand::Rng::with_seed(5);
        let flowers = Flower::populate(&mut rng, 80.0, 40.0, &layout);
        assert_eq!(flowers.len(), layout.flower_count);
        let mut styles = [0, 0];
        for f in &flowers {
            assert!((30.0..=40.0).contains(&f.y));
            assert!((5..=7).contains(&f.petals()));
            assert!((0.5..=1.0).contains(&f.alpha));
            styles[(f.style() == FlowerStyle::Rose) as usize] += 1;
        }
        assert!(styles[0] > 0 && styles[1] > 0);
    }

    #[test]
    fn draws_with_centre_colour_and_leaves_alpha_alone() {
        for style in [FlowerStyle::Carnation, FlowerStyle::Rose] {
            let mut canvas = Canvas::new(20, 20);
            let flower = Flower {
                x: 10.5,
                y: 10.5,
                size: 4.0,
                petals: 6,
                style,
                color: Rgb(255, 0, 255),
                center: Rgb(255, 250, 205),
                alpha: 1.0,
            };
            flower.draw(&mut canvas);
            assert_eq!(canvas.pixel(10, 10), Rgb(255, 250, 205));
            assert_eq!(canvas.pixel(13, 10), Rgb(255, 0, 255));

            // global alpha restored after drawing
            canvas.fill_rect(0.0, 0.0, 1.0, 1.0, Rgb::WHITE, 1.0);
            assert_eq!(canvas.pixel(0, 0), Rgb::WHITE);
        }
    }
}
