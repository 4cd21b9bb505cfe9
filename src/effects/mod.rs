use crate::config::SceneConfig;
use crate::decompose::Decomposer;
use crate::surface::Surface;

pub mod aurora;
pub mod banner;
pub mod firework;
pub mod flower;
pub mod moon;
pub mod particle;
pub mod rabbit;
pub mod star;

// Nominal tick rate every per-tick constant is tuned against.
pub const TICKS_PER_SECOND: f32 = 60.0;

// Everything an entity may read, plus the scene's random source, for one tick.
pub struct Tick<'a> {
    // Seconds of simulated time, advanced by one tick per processed frame.
    pub time: f32,
    pub width: f32,
    pub height: f32,
    pub pointer: (f32, f32),
    pub rng: &'a mut fastrand::Rng,
    pub config: &'a SceneConfig,
    pub decomposer: &'a Decomposer,
}

pub trait Entity {
    fn update(&mut self, tick: &mut Tick<'_>);
    fn draw(&self, surface: &mut dyn Surface);
}

pub(crate) fn range(rng: &mut fastrand::Rng, bounds: [f32; 2]) -> f32 {
    bounds[0] + rng.f32() * (bounds[1] - bounds[0])
}
