use super::particle::Particle;
use super::{Entity, Tick, range};
use crate::color::{Rgb, pick};
use crate::config::FireworkConfig;
use crate::surface::{Path, Surface};
use std::collections::VecDeque;
use std::f32::consts::TAU;
use tracing::debug;

const HEAD_RADIUS: f32 = 1.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FireworkMode {
    Burst,
    Shaped { text: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireworkState {
    Ascending,
    Exploded,
}

pub struct Firework {
    x: f32,
    y: f32,
    target_x: f32,
    target_y: f32,
    vx: f32,
    vy: f32,
    speed: f32,
    explode_radius: f32,
    trail: VecDeque<(f32, f32)>,
    trail_capacity: usize,
    state: FireworkState,
    mode: FireworkMode,
    color: Rgb,
    particles: Vec<Particle>,
}

impl Firework {
    pub fn launch(
        from: (f32, f32),
        to: (f32, f32),
        mode: FireworkMode,
        color: Rgb,
        config: &FireworkConfig,
    ) -> Self {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let distance = dx.hypot(dy);
        // Coincident points have no direction; the rocket just sits and explodes.
        let (vx, vy) = if distance > f32::EPSILON {
            (dx / distance * config.rocket_speed, dy / distance * config.rocket_speed)
        } else {
            (0.0, 0.0)
        };

        let trail_capacity = config.trail_length.max(1);
        let mut trail = VecDeque::with_capacity(trail_capacity);
        trail.push_back(from);

        Self {
            x: from.0,
            y: from.1,
            target_x: to.0,
            target_y: to.1,
            vx,
            vy,
            speed: config.rocket_speed,
            explode_radius: config.explode_radius,
            trail,
            trail_capacity,
            state: FireworkState::Ascending,
            mode,
            color,
            particles: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> &FireworkMode {
        &self.mode
    }

    #[cfg(test)]
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    #[cfg(test)]
    pub fn target(&self) -> (f32, f32) {
        (self.target_x, self.target_y)
    }

    #[cfg(test)]
    pub fn trail(&self) -> &VecDeque<(f32, f32)> {
        &self.trail
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_exploded(&self) -> bool {
        self.state == FireworkState::Exploded
    }

    // Exploded and every spark has faded.
    pub fn is_finished(&self) -> bool {
        self.is_exploded() && self.particles.is_empty()
    }

    fn ascend(&mut self, tick: &mut Tick<'_>) {
        let remaining = (self.target_x - self.x).hypot(self.target_y - self.y);
        if remaining <= self.speed {
            self.x = self.target_x;
            self.y = self.target_y;
        } else {
            self.x += self.vx;
            self.y += self.vy;
        }

        self.trail.push_back((self.x, self.y));
        while self.trail.len() > self.trail_capacity {
            self.trail.pop_front();
        }

        let distance = (self.target_x - self.x).hypot(self.target_y - self.y);
        if distance < self.explode_radius {
            self.explode(tick);
        }
    }

    fn explode(&mut self, tick: &mut Tick<'_>) {
        self.state = FireworkState::Exploded;
        let origin = (self.target_x, self.target_y);
        let particles = &tick.config.particles;

        if let FireworkMode::Shaped { text } = &self.mode {
            let text_cfg = &tick.config.text;
            let seeds = tick.decomposer.decompose(text, text_cfg.font_size, origin);
            self.particles.reserve(seeds.len());
            for seed in seeds {
                let color = if tick.rng.f32() < text_cfg.sparkle_ratio {
                    pick(tick.rng, &text_cfg.sparkle_palette)
                } else {
                    self.color
                };
                let size = range(tick.rng, particles.size);
                self.particles.push(Particle::converging(
                    origin,
                    seed.velocity,
                    seed.target,
                    color,
                    size,
                    particles,
                ));
            }
        }

        // Burst mode, or text that produced no ink.
        if self.particles.is_empty() {
            let fw = &tick.config.fireworks;
            for _ in 0..fw.burst_count {
                let angle = tick.rng.f32() * TAU;
                let speed = range(tick.rng, fw.burst_speed);
                let size = range(tick.rng, particles.size);
                self.particles.push(Particle::burst(
                    origin,
                    (angle.cos() * speed, angle.sin() * speed),
                    self.color,
                    size,
                    particles,
                ));
            }
        }

        debug!(
            x = origin.0,
            y = origin.1,
            shaped = matches!(self.mode, FireworkMode::Shaped { .. }),
            particles = self.particles.len(),
            "firework exploded"
        );
    }
}

impl Entity for Firework {
    fn update(&mut self, tick: &mut Tick<'_>) {
        match self.state {
            FireworkState::Ascending => self.ascend(tick),
            FireworkState::Exploded => self.particles.retain_mut(|p| {
                p.update();
                p.is_alive()
            }),
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        match self.state {
            FireworkState::Ascending => {
                if self.trail.len() >= 2 {
                    let path = Path::polyline(self.trail.iter().copied());
                    surface.stroke_path(&path, self.color, 1.0, 1.0);
                }
                surface.fill_circle(self.x, self.y, HEAD_RADIUS, self.color, 1.0);
            }
            FireworkState::Exploded => {
                for particle in &self.particles {
                    particle.draw(surface);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::config::SceneConfig;
    use crate::decompose::Decomposer;
    use crate::text::BlockFont;

    struct Harness {
        rng: fastrand::Rng,
        config: SceneConfig,
        decomposer: Decomposer,
    }

    impl Harness {
        fn new() -> Self {
            let config = SceneConfig::default();
            let decomposer = Decomposer::new(Box::new(BlockFont), config.text.clone());
            Self { rng: fastrand::Rng::with_seed(42), config, decomposer }
        }

        fn tick(&mut self) -> Tick<'_> {
            Tick {
                time: 0.0,
                width: 200.0,
                height: 100.0,
                pointer: (0.0, 0.0),
                rng: &mut self.rng,
                config: &self.config,
                decomposer: &self.decomposer,
            }
        }
    }

    fn launch(from: (f32, f32), to: (f32, f32), mode: FireworkMode) -> Firework {
        Firework::launch(from, to, mode, Rgb(255, 107, 107), &FireworkConfig::default())
    }

    #[test]
    fn zero_distance_explodes_on_first_tick() {
        let mut h = Harness::new();
        let mut fw = launch((40.0, 40.0), (40.0, 40.0), FireworkMode::Burst);
        fw.update(&mut h.tick());
        assert!(fw.is_exploded());
        assert_eq!(fw.particles().len(), 100);
    }

    #[test]
    fn explodes_exactly_once_when_within_radius() {
        let mut h = Harness::new();
        let mut fw = launch((100.0, 100.0), (100.0, 40.0), FireworkMode::Burst);
        let mut ticks = 0;
        loop {
            let before = (fw.target().1 - fw.position().1).abs();
            fw.update(&mut h.tick());
            ticks += 1;
            let after = (fw.target().1 - fw.position().1).abs();
            if fw.is_exploded() {
                assert!(after < 5.0);
                assert!(before >= 5.0);
                break;
            }
            assert!(fw.particles().is_empty());
            assert!(ticks < 100);
        }
        let position = fw.position();
        let count = fw.particles().len();
        assert!(count > 0);
        fw.update(&mut h.tick());
        // no movement and no second burst once exploded
        assert_eq!(fw.position(), position);
        assert!(fw.particles().len() <= count);
    }

    #[test]
    fn trail_is_bounded() {
        let mut h = Harness::new();
        let mut fw = launch((0.0, 200.0), (0.0, 0.0), FireworkMode::Burst);
        for _ in 0..50 {
            fw.update(&mut h.tick());
        }
        assert!(!fw.is_exploded());
        assert_eq!(fw.trail().len(), 10);
    }

    #[test]
    fn shaped_mode_materializes_decomposed_seeds() {
        let mut h = Harness::new();
        let mut fw = launch(
            (60.0, 60.0),
            (60.0, 60.0),
            FireworkMode::Shaped { text: "MOM".into() },
        );
        let expected = h.decomposer.decompose("MOM", h.config.text.font_size, (60.0, 60.0)).len();
        fw.update(&mut h.tick());
        assert!(fw.is_exploded());
        assert_eq!(fw.particles().len(), expected);
        assert!(fw.particles().iter().all(|p| p.homing.is_some()));
        assert!(fw.particles().iter().all(|p| (p.x, p.y) == (60.0, 60.0)));
    }

    #[test]
    fn finishes_once_every_particle_fades() {
        let mut h = Harness::new();
        let mut fw = launch((10.0, 10.0), (10.0, 10.0), FireworkMode::Shaped { text: String::new() });
        fw.update(&mut h.tick());
        assert!(!fw.is_finished());
        let mut ticks = 0;
        while !fw.is_finished() {
            fw.update(&mut h.tick());
            ticks += 1;
            assert!(ticks < 1000, "particles never faded");
        }
        assert!(fw.particles().is_empty());
    }

    #[test]
    fn faded_sparks_are_dropped_on_the_same_tick() {
        let mut h = Harness::new();
        let mut fw = launch((50.0, 50.0), (50.0, 50.0), FireworkMode::Burst);
        for _ in 0..200 {
            fw.update(&mut h.tick());
            assert!(fw.particles().iter().all(|p| p.alpha > 0.0));
        }
        assert!(fw.is_finished());
    }

    #[test]
    fn draws_head_while_ascending() {
        let mut h = Harness::new();
        let mut canvas = Canvas::new(40, 40);
        let mut fw = launch((20.0, 39.0), (20.0, 2.0), FireworkMode::Burst);
        for _ in 0..3 {
            fw.update(&mut h.tick());
        }
        fw.draw(&mut canvas);
        let (x, y) = fw.position();
        assert_ne!(canvas.pixel(x as usize, y as usize), Rgb::BLACK);
    }
}
