use super::{Entity, Tick, range};
use crate::color::Rgb;
use crate::config::LayoutConfig;
use crate::surface::{Path, Surface};
use std::collections::VecDeque;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const SPIKES: usize = 5;
const TWINKLE_SPEED: [f32; 2] = [0.5, 3.0];
const METEOR_TRAIL: usize = 12;
const METEOR_SPEED_X: [f32; 2] = [1.5, 3.0];
const METEOR_SPEED_Y: [f32; 2] = [0.8, 1.6];

struct Meteor {
    vx: f32,
    vy: f32,
    trail: VecDeque<(f32, f32)>,
}

pub struct Star {
    x: f32,
    y: f32,
    size: f32,
    // Radians per second
    twinkle_speed: f32,
    phase: f32,
    alpha: f32,
    meteor: Option<Meteor>,
}

// Random point inside the horizontal star band.
fn resting_spot(rng: &mut fastrand::Rng, width: f32, height: f32, band: [f32; 2]) -> (f32, f32) {
    (rng.f32() * width, height * range(rng, band))
}

impl Star {
    // Stars fall into three twinkle groups a third of a cycle apart.
    pub fn scatter(
        rng: &mut fastrand::Rng,
        group: usize,
        width: f32,
        height: f32,
        layout: &LayoutConfig,
    ) -> Self {
        let (x, y) = resting_spot(rng, width, height, layout.star_band);
        Self {
            x,
            y,
            size: range(rng, layout.star_size),
            twinkle_speed: range(rng, TWINKLE_SPEED),
            phase: (group % 3) as f32 * TAU / 3.0,
            alpha: 1.0,
            meteor: None,
        }
    }

    pub fn populate(rng: &mut fastrand::Rng, width: f32, height: f32, layout: &LayoutConfig) -> Vec<Star> {
        (0..layout.star_count)
            .map(|i| Star::scatter(rng, i, width, height, layout))
            .collect()
    }

    #[cfg(test)]
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    #[cfg(test)]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    #[cfg(test)]
    pub fn is_meteor(&self) -> bool {
        self.meteor.is_some()
    }

    fn ignite(&mut self, rng: &mut fastrand::Rng) {
        let direction = if rng.bool() { 1.0 } else { -1.0 };
        let mut trail = VecDeque::with_capacity(METEOR_TRAIL);
        trail.push_back((self.x, self.y));
        self.meteor = Some(Meteor {
            vx: direction * range(rng, METEOR_SPEED_X),
            vy: range(rng, METEOR_SPEED_Y),
            trail,
        });
    }

    fn star_path(&self) -> Path {
        let outer = self.size * 2.0;
        let inner = self.size * 0.8;
        Path::polyline((0..SPIKES * 2).map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = PI * i as f32 / SPIKES as f32;
            (angle.cos() * radius, angle.sin() * radius)
        }))
    }
}

impl Entity for Star {
    fn update(&mut self, tick: &mut Tick<'_>) {
        self.alpha = (0.3 + 0.7 * (tick.time * self.twinkle_speed + self.phase).sin()).clamp(0.0, 1.0);

        if self.meteor.is_none() {
            let chance = tick.config.layout.meteor_chance;
            if chance > 0.0 && tick.rng.f32() < chance {
                self.ignite(tick.rng);
            }
            return;
        }
        let Some(meteor) = self.meteor.as_mut() else { return };

        self.x += meteor.vx;
        self.y += meteor.vy;
        meteor.trail.push_back((self.x, self.y));
        while meteor.trail.len() > METEOR_TRAIL {
            meteor.trail.pop_front();
        }

        let margin = self.size * 2.0;
        let gone = self.x < -margin || self.x > tick.width + margin || self.y > tick.height + margin;
        if gone {
            let (x, y) = resting_spot(tick.rng, tick.width, tick.height, tick.config.layout.star_band);
            self.x = x;
            self.y = y;
            self.meteor = None;
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        if let Some(meteor) = &self.meteor {
            if meteor.trail.len() >= 2 {
                let path = Path::polyline(meteor.trail.iter().copied());
                surface.stroke_path(&path, Rgb::WHITE, 0.5, 1.0);
            }
            surface.fill_circle(self.x, self.y, self.size, Rgb::WHITE, 1.0);
            return;
        }

        if self.alpha <= 0.0 {
            return;
        }
        let mut path = self.star_path();
        path.close();
        surface.save();
        surface.translate(self.x, self.y);
        // first spike points straight up
        surface.rotate(-FRAC_PI_2);
        surface.fill_path(&path, Rgb::WHITE, self.alpha);
        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::config::SceneConfig;
    use crate::decompose::Decomposer;
    use crate::text::BlockFont;

    fn with_tick(config: &SceneConfig, rng: &mut fastrand::Rng, time: f32, f: impl FnOnce(&mut Tick<'_>)) {
        let decomposer = Decomposer::new(Box::new(BlockFont), config.text.clone());
        let mut tick = Tick {
            time,
            width: 100.0,
            height: 60.0,
            pointer: (0.0, 0.0),
            rng,
            config,
            decomposer: &decomposer,
        };
        f(&mut tick);
    }

    #[test]
    fn pool_stays_inside_star_band() {
        let layout = LayoutConfig::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let stars = Star::populate(&mut rng, 100.0, 60.0, &layout);
        assert_eq!(stars.len(), layout.star_count);
        for star in &stars {
            let (x, y) = star.position();
            assert!((0.0..100.0).contains(&x));
            assert!((15.0..=30.0).contains(&y));
        }
    }

    #[test]
    fn twinkle_groups_are_a_third_of_a_cycle_apart() {
        let layout = LayoutConfig::default();
        let mut rng = fastrand::Rng::with_seed(3);
        let phases: Vec<f32> =
            (0..3).map(|g| Star::scatter(&mut rng, g, 10.0, 10.0, &layout).phase).collect();
        assert!((phases[1] - phases[0] - TAU / 3.0).abs() < 1e-5);
        assert!((phases[2] - phases[1] - TAU / 3.0).abs() < 1e-5);
    }

    #[test]
    fn twinkle_alpha_stays_in_unit_range() {
        let config = SceneConfig::default();
        let mut rng = fastrand::Rng::with_seed(8);
        let mut star = Star::scatter(&mut rng, 1, 100.0, 60.0, &config.layout);
        for step in 0..500 {
            with_tick(&config, &mut rng, step as f32 / 60.0, |t| star.update(t));
            assert!((0.0..=1.0).contains(&star.alpha()));
        }
    }

    #[test]
    fn meteor_resets_into_band_after_leaving() {
        let mut config = SceneConfig::default();
        config.layout.meteor_chance = 1.0;
        let mut rng = fastrand::Rng::with_seed(11);
        let mut star = Star::scatter(&mut rng, 0, 100.0, 60.0, &config.layout);

        with_tick(&config, &mut rng, 0.0, |t| star.update(t));
        assert!(star.is_meteor());

        // no more ignitions, so the next reset is final
        config.layout.meteor_chance = 0.0;
        let mut ticks = 0;
        while star.is_meteor() {
            with_tick(&config, &mut rng, 0.0, |t| star.update(t));
            ticks += 1;
            assert!(ticks < 500, "meteor never left the surface");
            if let Some(m) = &star.meteor {
                assert!(m.trail.len() <= METEOR_TRAIL);
            }
        }
        let (x, y) = star.position();
        assert!((0.0..100.0).contains(&x));
        assert!((15.0..=30.0).contains(&y));
    }

    #[test]
    fn resting_star_draws_its_centre() {
        let mut canvas = Canvas::new(20, 20);
        let star = Star {
            x: 10.5,
            y: 10.5,
            size: 2.0,
            twinkle_speed: 1.0,
            phase: 0.0,
            alpha: 1.0,
            meteor: None,
        };
        star.draw(&mut canvas);
        assert_eq!(canvas.pixel(10, 10), Rgb::WHITE);
        // top spike reaches above the inner radius
        assert_ne!(canvas.pixel(10, 7), Rgb::BLACK);
        assert_eq!(canvas.pixel(0, 0), Rgb::BLACK);
    }
}
