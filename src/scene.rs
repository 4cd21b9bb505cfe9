use crate::color::pick;
use crate::config::SceneConfig;
use crate::decompose::Decomposer;
use crate::effects::aurora::Aurora;
use crate::effects::banner::Banner;
use crate::effects::firework::{Firework, FireworkMode};
use crate::effects::flower::Flower;
use crate::effects::moon::Moon;
use crate::effects::rabbit::Rabbit;
use crate::effects::star::Star;
use crate::effects::{Entity, TICKS_PER_SECOND, Tick};
use crate::surface::Surface;
use crate::text::TextRasterizer;
use std::collections::VecDeque;
use tracing::{debug, info, trace, warn};

pub const EVENT_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    PointerMoved { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    // Shaped firework toward `at`, or the pointer when absent.
    LaunchText { at: Option<(f32, f32)> },
    SetText(String),
    Resize { width: f32, height: f32 },
}

// Skips host frames that arrive sooner than the configured interval.
pub struct FrameThrottle {
    min_interval_ms: f64,
    last: Option<f64>,
}

impl FrameThrottle {
    pub fn new(min_interval_ms: f64) -> Self {
        Self { min_interval_ms, last: None }
    }

    pub fn ready(&mut self, timestamp_ms: f64) -> bool {
        match self.last {
            Some(last) if timestamp_ms - last < self.min_interval_ms => false,
            _ => {
                self.last = Some(timestamp_ms);
                true
            }
        }
    }
}

struct Decorations {
    aurora: Aurora,
    stars: Vec<Star>,
    flowers: Vec<Flower>,
    moon: Option<Moon>,
    rabbit: Option<Rabbit>,
    banner: Option<Banner>,
}

impl Decorations {
    fn build(
        config: &SceneConfig,
        rasterizer: &dyn TextRasterizer,
        width: f32,
        height: f32,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let layout = &config.layout;
        Self {
            aurora: Aurora::new(
                rng.u32(..),
                width,
                height,
                layout.aurora_fraction,
                layout.aurora_colors.clone(),
            ),
            stars: Star::populate(rng, width, height, layout),
            flowers: Flower::populate(rng, width, height, layout),
            moon: layout.moon.then(|| Moon::new(layout.moon_radius)),
            rabbit: (layout.moon && layout.rabbit).then(|| Rabbit::new(layout.moon_radius)),
            banner: config
                .banner
                .enabled
                .then(|| Banner::new(rasterizer, &config.banner, width, height, rng)),
        }
    }
}

pub struct Scene {
    width: f32,
    height: f32,
    config: SceneConfig,
    decomposer: Decomposer,
    rng: fastrand::Rng,
    events: VecDeque<SceneEvent>,
    throttle: FrameThrottle,
    frame: u64,
    pointer: (f32, f32),
    pointer_seen: bool,
    text: String,
    decorations: Decorations,
    fireworks: Vec<Firework>,
}

impl Scene {
    pub fn new(
        width: f32,
        height: f32,
        config: SceneConfig,
        rasterizer: Box<dyn TextRasterizer>,
        mut rng: fastrand::Rng,
    ) -> Self {
        let decomposer = Decomposer::new(rasterizer, config.text.clone());
        let decorations = Decorations::build(&config, decomposer.rasterizer(), width, height, &mut rng);
        info!(width, height, "scene created");
        Self {
            width,
            height,
            throttle: FrameThrottle::new(config.frame_interval_ms),
            text: config.text.input.clone(),
            config,
            decomposer,
            rng,
            events: VecDeque::with_capacity(EVENT_CAPACITY),
            frame: 0,
            pointer: (width / 2.0, height / 2.0),
            pointer_seen: false,
            decorations,
            fireworks: Vec::new(),
        }
    }

    pub fn text_input(&self) -> &str {
        &self.text
    }

    pub fn active_fireworks(&self) -> usize {
        self.fireworks.len()
    }

    pub fn particle_count(&self) -> usize {
        self.fireworks.iter().map(|f| f.particles().len()).sum()
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }

    // Queues a host event; the oldest one is dropped when the queue is full.
    pub fn push_event(&mut self, event: SceneEvent) {
        if self.events.len() >= EVENT_CAPACITY {
            let dropped = self.events.pop_front();
            warn!(?dropped, "event queue full, dropping oldest event");
        }
        self.events.push_back(event);
    }

    // Host refresh callback. Returns whether a tick was processed.
    pub fn frame(&mut self, timestamp_ms: f64, surface: &mut dyn Surface) -> bool {
        if !self.throttle.ready(timestamp_ms) {
            return false;
        }
        self.tick(surface);
        true
    }

    pub fn tick(&mut self, surface: &mut dyn Surface) {
        while let Some(event) = self.events.pop_front() {
            self.apply(event);
        }

        surface.fill_rect(0.0, 0.0, self.width, self.height, self.config.background, self.config.fade_alpha);
        self.advance(surface);

        self.frame += 1;
        trace!(
            frame = self.frame,
            fireworks = self.active_fireworks(),
            particles = self.particle_count(),
            "tick"
        );
    }

    // Entity update and draw, pruning, ambient spawn and the banner step.
    fn advance(&mut self, surface: &mut dyn Surface) {
        let Scene { width, height, config, decomposer, rng, frame, pointer, decorations, fireworks, .. } =
            self;
        let mut tick = Tick {
            time: *frame as f32 / TICKS_PER_SECOND,
            width: *width,
            height: *height,
            pointer: *pointer,
            rng,
            config,
            decomposer,
        };

        let d = decorations;
        d.aurora.update(&mut tick);
        d.aurora.draw(surface);
        for star in &mut d.stars {
            star.update(&mut tick);
            star.draw(surface);
        }
        for flower in &mut d.flowers {
            flower.update(&mut tick);
            flower.draw(surface);
        }
        if let Some(moon) = &mut d.moon {
            moon.update(&mut tick);
            moon.draw(surface);
        }
        if let Some(rabbit) = &mut d.rabbit {
            rabbit.update(&mut tick);
            rabbit.draw(surface);
        }
        if let Some(banner) = &d.banner {
            banner.draw(surface);
        }

        for firework in fireworks.iter_mut() {
            firework.update(&mut tick);
            firework.draw(surface);
        }
        fireworks.retain(|f| !f.is_finished());

        let fw = &tick.config.fireworks;
        if tick.rng.f32() < fw.spawn_probability {
            let target = (
                tick.rng.f32() * tick.width,
                tick.rng.f32() * tick.height * fw.spawn_height_fraction,
            );
            let origin = (tick.rng.f32() * tick.width, tick.height);
            let color = pick(tick.rng, &fw.palette);
            debug!(?origin, ?target, "ambient firework");
            fireworks.push(Firework::launch(origin, target, FireworkMode::Burst, color, fw));
        }

        if let Some(banner) = &mut d.banner {
            banner.update(&mut tick);
        }
    }

    fn apply(&mut self, event: SceneEvent) {
        match event {
            SceneEvent::PointerMoved { x, y } => {
                self.pointer = (x, y);
                self.pointer_seen = true;
            }
            SceneEvent::Click { x, y } => self.launch((x, y), FireworkMode::Burst),
            SceneEvent::LaunchText { at } => {
                let target = self.text_anchor(at);
                let text = self.decomposer.resolve(&self.text).to_string();
                self.launch(target, FireworkMode::Shaped { text });
            }
            SceneEvent::SetText(text) => self.text = text,
            SceneEvent::Resize { width, height } => self.resize(width, height),
        }
    }

    fn launch(&mut self, target: (f32, f32), mode: FireworkMode) {
        let origin = (self.rng.f32() * self.width, self.height);
        let fw = &self.config.fireworks;
        let color = pick(&mut self.rng, &fw.palette);
        debug!(?origin, ?target, ?mode, "launching firework");
        self.fireworks.push(Firework::launch(origin, target, mode, color, fw));
    }

    // Where shaped text forms: the requested point, else the pointer, else
    // just above the middle; shifted so the text stays on the surface.
    fn text_anchor(&self, at: Option<(f32, f32)>) -> (f32, f32) {
        let (x, y) = at.unwrap_or(if self.pointer_seen {
            self.pointer
        } else {
            (self.width / 2.0, self.height / 2.0 - self.height * 0.055)
        });

        let text = self.decomposer.resolve(&self.text);
        let (tw, th) = self.decomposer.rasterizer().measure(text, self.config.text.font_size);
        let fit = |v: f32, half: f32, extent: f32| {
            if half * 2.0 >= extent { extent / 2.0 } else { v.clamp(half, extent - half) }
        };
        (fit(x, tw / 2.0, self.width), fit(y, th / 2.0, self.height))
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.decorations =
            Decorations::build(&self.config, self.decomposer.rasterizer(), width, height, &mut self.rng);
        info!(width, height, fireworks = self.fireworks.len(), "scene resized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::config::Preset;
    use crate::text::BlockFont;

    fn scene(config: SceneConfig) -> (Scene, Canvas) {
        let scene = Scene::new(80.0, 60.0, config, Box::new(BlockFont), fastrand::Rng::with_seed(1234));
        (scene, Canvas::new(80, 60))
    }

    #[test]
    fn ambient_run_stays_bounded_and_drains() {
        for preset in [Preset::Classic, Preset::Moonlit] {
            let (mut scene, mut canvas) = scene(SceneConfig::preset(preset));
            let mut peak = 0;
            for _ in 0..1000 {
                scene.tick(&mut canvas);
                peak = peak.max(scene.active_fireworks());
                assert!(scene.particle_count() <= scene.active_fireworks() * 100);
            }
            assert!(peak > 0, "nothing was ever spawned");
            assert!(peak <= 40, "fireworks leaked: {peak}");

            scene.config.fireworks.spawn_probability = 0.0;
            for _ in 0..400 {
                scene.tick(&mut canvas);
            }
            assert_eq!(scene.active_fireworks(), 0);
            assert_eq!(scene.particle_count(), 0);
        }
    }

    #[test]
    fn click_launches_a_burst_toward_the_click() {
        let mut config = SceneConfig::default();
        config.fireworks.spawn_probability = 0.0;
        let (mut scene, mut canvas) = scene(config);
        scene.push_event(SceneEvent::Click { x: 30.0, y: 20.0 });
        assert_eq!(scene.active_fireworks(), 0);
        scene.tick(&mut canvas);
        assert_eq!(scene.active_fireworks(), 1);
        assert_eq!(scene.fireworks[0].target(), (30.0, 20.0));
        assert_eq!(scene.fireworks[0].mode(), &FireworkMode::Burst);
    }

    #[test]
    fn empty_text_launches_the_default_phrase() {
        let mut config = SceneConfig::default();
        config.fireworks.spawn_probability = 0.0;
        let (mut scene, mut canvas) = scene(config);
        assert_eq!(scene.text_input(), "");
        scene.push_event(SceneEvent::LaunchText { at: None });
        scene.tick(&mut canvas);
        assert_eq!(
            scene.fireworks[0].mode(),
            &FireworkMode::Shaped { text: "Happy Mother's Day".into() }
        );

        scene.push_event(SceneEvent::SetText("MOM".into()));
        scene.push_event(SceneEvent::LaunchText { at: Some((40.0, 20.0)) });
        scene.tick(&mut canvas);
        assert_eq!(scene.text_input(), "MOM");
        assert_eq!(scene.fireworks[1].mode(), &FireworkMode::Shaped { text: "MOM".into() });
    }

    #[test]
    fn text_anchor_keeps_text_on_surface() {
        let (mut scene, _) = scene(SceneConfig::default());
        scene.text = "MOM".into();
        // BlockFont at 14px: 34 x 14
        assert_eq!(scene.text_anchor(Some((0.0, 0.0))), (17.0, 7.0));
        assert_eq!(scene.text_anchor(Some((40.0, 30.0))), (40.0, 30.0));

        let (x, y) = scene.text_anchor(None);
        assert_eq!(x, 40.0);
        assert!(y < 30.0);

        scene.apply(SceneEvent::PointerMoved { x: 50.0, y: 40.0 });
        assert_eq!(scene.text_anchor(None), (50.0, 40.0));
    }

    #[test]
    fn shaped_launch_at_its_origin_explodes_on_first_tick() {
        let mut config = SceneConfig::default();
        config.fireworks.spawn_probability = 0.0;
        let (mut scene, mut canvas) = scene(config);
        let origin = (10.0, 60.0);
        let color = scene.config.fireworks.palette[0];
        scene.fireworks.push(Firework::launch(
            origin,
            origin,
            FireworkMode::Shaped { text: "OK".into() },
            color,
            &scene.config.fireworks,
        ));
        scene.tick(&mut canvas);
        assert!(scene.fireworks[0].is_exploded());
        assert!(scene.particle_count() > 0);
    }

    #[test]
    fn throttle_skips_early_frames() {
        let mut throttle = FrameThrottle::new(16.0);
        assert!(throttle.ready(0.0));
        assert!(!throttle.ready(10.0));
        assert!(throttle.ready(16.0));
        assert!(!throttle.ready(31.9));
        assert!(throttle.ready(40.0));

        let (mut scene, mut canvas) = scene(SceneConfig::default());
        assert!(scene.frame(100.0, &mut canvas));
        assert!(!scene.frame(105.0, &mut canvas));
        assert!(scene.frame(120.0, &mut canvas));
        assert_eq!(scene.frames(), 2);
    }

    #[test]
    fn full_queue_drops_oldest_events() {
        let (mut scene, mut canvas) = scene(SceneConfig::default());
        for i in 0..EVENT_CAPACITY + 44 {
            scene.push_event(SceneEvent::PointerMoved { x: i as f32, y: 1.0 });
        }
        assert_eq!(scene.events.len(), EVENT_CAPACITY);
        assert_eq!(scene.events.front(), Some(&SceneEvent::PointerMoved { x: 44.0, y: 1.0 }));

        scene.tick(&mut canvas);
        assert!(scene.events.is_empty());
        assert_eq!(scene.pointer, ((EVENT_CAPACITY + 43) as f32, 1.0));
    }

    #[test]
    fn resize_rebuilds_decorations_and_keeps_fireworks() {
        let mut config = SceneConfig::default();
        config.fireworks.spawn_probability = 0.0;
        let (mut scene, mut canvas) = scene(config);
        scene.push_event(SceneEvent::Click { x: 40.0, y: 10.0 });
        scene.tick(&mut canvas);

        canvas.resize(40, 30);
        scene.push_event(SceneEvent::Resize { width: 40.0, height: 30.0 });
        scene.tick(&mut canvas);

        assert_eq!(scene.active_fireworks(), 1);
        assert_eq!(scene.decorations.stars.len(), scene.config.layout.star_count);
        for star in &scene.decorations.stars {
            let (x, y) = star.position();
            assert!(x < 40.0 && (7.5..=15.0).contains(&y));
        }
    }
}
