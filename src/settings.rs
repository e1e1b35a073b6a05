use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::report::MAX_SIMILARITY;
use crate::spans::MemoKeying;

/// Startup view settings, read from an optional TOML file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewSettings {
    pub cutoff: f32,
    pub live_physics: bool,
    pub intensity: f32,
    pub repulsion: f32,
    pub spring: f32,
    pub collision: f32,
    pub velocity_damping: f32,
    pub group_pull: f32,
    pub scroll_animation_secs: f64,
    pub memo_keying: MemoKeying,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            live_physics: true,
            intensity: 1.0,
            repulsion: 1.4,
            spring: 0.8,
            collision: 1.0,
            velocity_damping: 0.9,
            group_pull: 0.02,
            scroll_animation_secs: 0.35,
            memo_keying: MemoKeying::Range,
        }
    }
}

impl ViewSettings {
    pub fn parse(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw).context("invalid view settings")?;
        Ok(settings.normalized())
    }

    /// Defaults when `path` is `None`; a missing or malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = Self::parse(&raw)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        info!("loaded view settings from {}", path.display());
        Ok(settings)
    }

    pub fn with_cutoff(mut self, cutoff: Option<f32>) -> Self {
        if let Some(cutoff) = cutoff {
            self.cutoff = cutoff;
        }
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.cutoff = if self.cutoff.is_finite() {
            self.cutoff.clamp(0.0, MAX_SIMILARITY)
        } else {
            0.0
        };
        self.intensity = self.intensity.clamp(0.2, 2.5);
        self.repulsion = self.repulsion.clamp(0.25, 2.6);
        self.spring = self.spring.clamp(0.2, 2.2);
        self.collision = self.collision.clamp(0.2, 2.0);
        self.velocity_damping = self.velocity_damping.clamp(0.78, 0.97);
        self.group_pull = self.group_pull.clamp(0.0, 0.08);
        self.scroll_animation_secs = self.scroll_animation_secs.clamp(0.0, 5.0);
        self
    }
}
