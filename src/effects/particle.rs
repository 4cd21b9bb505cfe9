use super::TICKS_PER_SECOND;
use crate::color::Rgb;
use crate::config::ParticleConfig;
use crate::surface::Surface;

// Per-tick alpha loss that fades a particle out in `lifetime` seconds.
pub fn decay_for(lifetime: f32) -> f32 {
    1.0 / (lifetime * TICKS_PER_SECOND)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homing {
    pub target_x: f32,
    pub target_y: f32,
    pub gain: f32,
    pub radius: f32,
    pub arrived: bool,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub color: Rgb,
    pub alpha: f32,
    pub decay: f32,
    pub size: f32,
    pub friction: f32,
    pub gravity: f32,
    pub homing: Option<Homing>,
}

impl Particle {
    // Free-flying spark pulled down by gravity and slowed by friction.
    pub fn burst(
        (x, y): (f32, f32),
        (vx, vy): (f32, f32),
        color: Rgb,
        size: f32,
        config: &ParticleConfig,
    ) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            color,
            alpha: 1.0,
            decay: decay_for(config.burst_lifetime),
            size,
            friction: config.friction,
            gravity: config.gravity,
            homing: None,
        }
    }

    pub fn converging(
        origin: (f32, f32),
        velocity: (f32, f32),
        target: (f32, f32),
        color: Rgb,
        size: f32,
        config: &ParticleConfig,
    ) -> Self {
        Self {
            decay: decay_for(config.shaped_lifetime),
            homing: Some(Homing {
                target_x: target.0,
                target_y: target.1,
                gain: config.convergence_gain,
                radius: config.arrival_radius,
                arrived: false,
            }),
            ..Self::burst(origin, velocity, color, size, config)
        }
    }

    pub fn has_arrived(&self) -> bool {
        self.homing.is_some_and(|h| h.arrived)
    }

    pub fn is_alive(&self) -> bool {
        self.alpha > 0.0
    }

    pub fn update(&mut self) {
        match &mut self.homing {
            Some(h) if !h.arrived => {
                let dx = h.target_x - self.x;
                let dy = h.target_y - self.y;
                if dx.hypot(dy) < h.radius {
                    h.arrived = true;
                    self.x = h.target_x;
                    self.y = h.target_y;
                    self.vx = 0.0;
                    self.vy = 0.0;
                } else {
                    self.vx = dx * h.gain;
                    self.vy = dy * h.gain;
                }
            }
            Some(_) => {}
            None => {
                self.vy += self.gravity;
                self.vx *= self.friction;
                self.vy *= self.friction;
            }
        }

        self.x += self.vx;
        self.y += self.vy;

        // Arrived particles hold the formed shape twice as long.
        if self.has_arrived() {
            self.alpha -= self.decay * 0.5;
        } else {
            self.alpha -= self.decay;
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        if self.is_alive() {
            surface.fill_circle(self.x, self.y, self.size, self.color, self.alpha);
        }
    }
}
