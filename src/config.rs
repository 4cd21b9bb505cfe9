// Distances are in surface pixels (a terminal cell is one pixel wide and
// two pixels tall) and rates are per tick at 60 ticks per second.

use crate::color::{Rgb, palette};
use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

const FIREWORK_PALETTE: [&str; 7] =
    ["#ff8c69", "#ff6b6b", "#ffb6c1", "#ffc0cb", "#dda0dd", "#ee82ee", "#da70d6"];
const FLOWER_PALETTE: [&str; 5] = ["#ffb6c1", "#ffc0cb", "#dda0dd", "#ee82ee", "#da70d6"];
const SPARKLE_PALETTE: [&str; 3] = ["#fffacd", "#ffffff", "#ffd700"];
const DEFAULT_PHRASE: &str = "Happy Mother's Day";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Aurora over a star band and a flower meadow
    #[default]
    Classic,
    /// Moon and rabbit following the pointer, meteors and a sliding banner
    Moonlit,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: Rgb,
    pub fade_alpha: f32,
    // Ticks arriving sooner than this after the previous one are skipped.
    pub frame_interval_ms: f64,
    pub layout: LayoutConfig,
    pub particles: ParticleConfig,
    pub fireworks: FireworkConfig,
    pub text: TextConfig,
    pub banner: BannerConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub aurora_fraction: f32,
    pub aurora_colors: Vec<Rgb>,
    pub star_band: [f32; 2],
    pub star_count: usize,
    pub star_size: [f32; 2],
    // Per-tick chance that a resting star turns into a meteor.
    pub meteor_chance: f32,
    pub flower_band: [f32; 2],
    pub flower_count: usize,
    pub flower_size: [f32; 2],
    pub flower_palette: Vec<Rgb>,
    pub flower_center: Rgb,
    pub moon: bool,
    pub rabbit: bool,
    pub moon_radius: f32,
    // How far above the pointer the moon floats.
    pub moon_offset: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub gravity: f32,
    pub friction: f32,
    // Seconds until a burst particle fades out.
    pub burst_lifetime: f32,
    // Seconds until an in-flight shaped particle fades out.
    pub shaped_lifetime: f32,
    pub convergence_gain: f32,
    pub arrival_radius: f32,
    pub size: [f32; 2],
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FireworkConfig {
    pub rocket_speed: f32,
    pub trail_length: usize,
    pub explode_radius: f32,
    pub burst_count: usize,
    pub burst_speed: [f32; 2],
    pub spawn_probability: f32,
    pub spawn_height_fraction: f32,
    pub palette: Vec<Rgb>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    // Initial text-input value; empty means the default phrase.
    pub input: String,
    pub default_text: String,
    pub font_size: f32,
    pub stride: usize,
    pub threshold: u8,
    pub max_particles: usize,
    pub radial_gain: f32,
    pub base_speed: f32,
    pub horizontal_scale: f32,
    pub vertical_scale: f32,
    pub sparkle_palette: Vec<Rgb>,
    pub sparkle_ratio: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    pub enabled: bool,
    pub text: String,
    pub font_size: f32,
    pub speed: f32,
    pub row_fraction: f32,
    pub palette: Vec<Rgb>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::preset(Preset::Classic)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            aurora_fraction: 0.25,
            aurora_colors: vec![Rgb(0, 255, 140), Rgb(80, 200, 255), Rgb(140, 100, 255)],
            star_band: [0.25, 0.5],
            star_count: 200,
            star_size: [0.5, 1.5],
            meteor_chance: 0.0,
            flower_band: [0.75, 1.0],
            flower_count: 100,
            flower_size: [1.0, 2.5],
            flower_palette: palette(&FLOWER_PALETTE),
            flower_center: Rgb(255, 250, 205),
            moon: false,
            rabbit: false,
            moon_radius: 6.0,
            moon_offset: 10.0,
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            gravity: 0.015,
            friction: 0.97,
            burst_lifetime: 1.2,
            shaped_lifetime: 2.2,
            convergence_gain: 0.1,
            arrival_radius: 0.5,
            size: [0.4, 1.1],
        }
    }
}

impl Default for FireworkConfig {
    fn default() -> Self {
        Self {
            rocket_speed: 1.5,
            trail_length: 10,
            explode_radius: 5.0,
            burst_count: 100,
            burst_speed: [0.2, 1.5],
            spawn_probability: 0.03,
            spawn_height_fraction: 0.6,
            palette: palette(&FIREWORK_PALETTE),
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            input: String::new(),
            default_text: DEFAULT_PHRASE.to_string(),
            font_size: 14.0,
            stride: 2,
            threshold: 128,
            max_particles: 4000,
            radial_gain: 0.06,
            base_speed: 0.7,
            horizontal_scale: 0.8,
            vertical_scale: 1.2,
            sparkle_palette: palette(&SPARKLE_PALETTE),
            sparkle_ratio: 0.15,
        }
    }
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text: DEFAULT_PHRASE.to_string(),
            font_size: 7.0,
            speed: 0.5,
            row_fraction: 0.68,
            palette: palette(&FLOWER_PALETTE),
        }
    }
}

impl SceneConfig {
    pub fn preset(preset: Preset) -> Self {
        let classic = Self {
            background: Rgb::BLACK,
            fade_alpha: 0.05,
            frame_interval_ms: 16.0,
            layout: LayoutConfig::default(),
            particles: ParticleConfig::default(),
            fireworks: FireworkConfig::default(),
            text: TextConfig::default(),
            banner: BannerConfig::default(),
        };

        match preset {
            Preset::Classic => classic,
            Preset::Moonlit => Self {
                background: Rgb(4, 6, 20),
                layout: LayoutConfig {
                    aurora_fraction: 0.3,
                    aurora_colors: vec![Rgb(120, 255, 200), Rgb(90, 160, 255), Rgb(255, 140, 220)],
                    star_band: [0.05, 0.45],
                    star_count: 120,
                    meteor_chance: 0.0008,
                    flower_band: [0.82, 1.0],
                    flower_count: 60,
                    moon: true,
                    rabbit: true,
                    ..LayoutConfig::default()
                },
                banner: BannerConfig { enabled: true, ..BannerConfig::default() },
                ..classic
            },
        }
    }

    // Parses a full config; missing keys take classic defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: SceneConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        fn ensure(ok: bool, msg: &str) -> Result<()> {
            if ok { Ok(()) } else { Err(Error::Config(msg.to_string())) }
        }
        fn unit(v: f32) -> bool {
            (0.0..=1.0).contains(&v)
        }
        fn band(b: [f32; 2]) -> bool {
            unit(b[0]) && unit(b[1]) && b[0] <= b[1]
        }

        let p = &self.particles;
        let f = &self.fireworks;
        let t = &self.text;
        let l = &self.layout;

        ensure(unit(self.fade_alpha), "fade_alpha must be within [0, 1]")?;
        ensure(self.frame_interval_ms >= 0.0, "frame_interval_ms must not be negative")?;

        ensure(band(l.star_band), "layout.star_band must be an ordered pair within [0, 1]")?;
        ensure(band(l.flower_band), "layout.flower_band must be an ordered pair within [0, 1]")?;
        ensure(unit(l.aurora_fraction), "layout.aurora_fraction must be within [0, 1]")?;
        ensure(unit(l.meteor_chance), "layout.meteor_chance must be within [0, 1]")?;
        ensure(!l.flower_palette.is_empty(), "layout.flower_palette must not be empty")?;
        ensure(l.star_size[0] <= l.star_size[1], "layout.star_size must be ordered")?;
        ensure(l.flower_size[0] <= l.flower_size[1], "layout.flower_size must be ordered")?;

        ensure(p.burst_lifetime > 0.0, "particles.burst_lifetime must be positive")?;
        ensure(p.shaped_lifetime > 0.0, "particles.shaped_lifetime must be positive")?;
        ensure(
            p.convergence_gain > 0.0 && p.convergence_gain < 1.0,
            "particles.convergence_gain must be within (0, 1)",
        )?;
        ensure(p.arrival_radius > 0.0, "particles.arrival_radius must be positive")?;
        ensure(p.size[0] <= p.size[1], "particles.size must be ordered")?;

        ensure(f.rocket_speed > 0.0, "fireworks.rocket_speed must be positive")?;
        ensure(f.explode_radius > 0.0, "fireworks.explode_radius must be positive")?;
        ensure(f.burst_count > 0, "fireworks.burst_count must be positive")?;
        ensure(f.burst_speed[0] <= f.burst_speed[1], "fireworks.burst_speed must be ordered")?;
        ensure(unit(f.spawn_probability), "fireworks.spawn_probability must be within [0, 1]")?;
        ensure(
            unit(f.spawn_height_fraction),
            "fireworks.spawn_height_fraction must be within [0, 1]",
        )?;
        ensure(!f.palette.is_empty(), "fireworks.palette must not be empty")?;

        ensure(t.stride >= 1, "text.stride must be at least 1")?;
        ensure(t.font_size > 0.0, "text.font_size must be positive")?;
        ensure(t.max_particles > 0, "text.max_particles must be positive")?;
        ensure(!t.default_text.trim().is_empty(), "text.default_text must not be empty")?;
        ensure(unit(t.sparkle_ratio), "text.sparkle_ratio must be within [0, 1]")?;

        if self.banner.enabled {
            ensure(!self.banner.palette.is_empty(), "banner.palette must not be empty")?;
            ensure(self.banner.font_size > 0.0, "banner.font_size must be positive")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        SceneConfig::preset(Preset::Classic).validate().unwrap();
        SceneConfig::preset(Preset::Moonlit).validate().unwrap();
    }

    #[test]
    fn moonlit_differs_only_in_cosmetics() {
        let classic = SceneConfig::preset(Preset::Classic);
        let moonlit = SceneConfig::preset(Preset::Moonlit);
        assert!(moonlit.layout.moon && moonlit.banner.enabled);
        assert!(!classic.layout.moon && !classic.banner.enabled);
        assert_eq!(classic.fireworks.burst_count, moonlit.fireworks.burst_count);
        assert_eq!(classic.text.stride, moonlit.text.stride);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SceneConfig::from_toml_str(
            r##"
            background = "#1a1b26"

            [fireworks]
            spawn_probability = 0.1
            palette = ["ff0000", "#00ff00"]

            [text]
            default_text = "HELLO"
            "##,
        )
        .unwrap();
        assert_eq!(config.background, Rgb(0x1a, 0x1b, 0x26));
        assert_eq!(config.fireworks.spawn_probability, 0.1);
        assert_eq!(config.fireworks.palette, vec![Rgb(255, 0, 0), Rgb(0, 255, 0)]);
        assert_eq!(config.fireworks.burst_count, 100);
        assert_eq!(config.text.default_text, "HELLO");
        assert_eq!(config.text.stride, 2);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = SceneConfig::from_toml_str("[text]\nstride = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = SceneConfig::from_toml_str("[fireworks]\nspawn_probability = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = SceneConfig::from_toml_str("background = \"not-a-color\"\n").unwrap_err();
        assert!(matches!(err, Error::TomlParse(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "fade_alpha = 0.2\n[layout]\nstar_count = 5\n").unwrap();
        let config = SceneConfig::load(&path).unwrap();
        assert_eq!(config.layout.star_count, 5);
        assert_eq!(config.fade_alpha, 0.2);

        assert!(matches!(
            SceneConfig::load(&dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }
}
