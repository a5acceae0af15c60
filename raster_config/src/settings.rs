//! Operator settings that outlive a single run: plate offsets and the custom
//! plate layout. Loaded values override the matching config sections.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Config, CustomPlateCfg, OffsetXY, OffsetsCfg};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub offsets: OffsetsCfg,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_plate: Option<CustomPlateCfg>,
}

/// Which offset pair an update applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetTarget {
    Standard96,
    SlideA,
    SlideB,
}

impl Settings {
    /// Snapshot the persisted parts of a loaded config.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            offsets: cfg.offsets.clone(),
            custom_plate: cfg.custom_plate.clone(),
        }
    }

    /// The explicit update path for offsets.
    pub fn set_offset(&mut self, target: OffsetTarget, x: f64, y: f64) -> eyre::Result<()> {
        if !(x.is_finite() && y.is_finite()) {
            eyre::bail!("offset values must be finite");
        }
        let slot = match target {
            OffsetTarget::Standard96 => &mut self.offsets.standard96,
            OffsetTarget::SlideA => &mut self.offsets.slide_a,
            OffsetTarget::SlideB => &mut self.offsets.slide_b,
        };
        *slot = OffsetXY { x, y };
        Ok(())
    }

    pub fn set_startup_delay(&mut self, secs: f64) -> eyre::Result<()> {
        if !(secs.is_finite() && (0.0..=60.0).contains(&secs)) {
            eyre::bail!("startup delay must be in [0, 60] seconds");
        }
        self.offsets.startup_delay_s = secs;
        Ok(())
    }

    pub fn set_custom_plate(&mut self, plate: CustomPlateCfg) -> eyre::Result<()> {
        plate.validate()?;
        self.custom_plate = Some(plate);
        Ok(())
    }

    /// Overlay these settings onto a config.
    pub fn apply_to(&self, cfg: &mut Config) {
        cfg.offsets = self.offsets.clone();
        if let Some(custom) = &self.custom_plate {
            cfg.custom_plate = Some(custom.clone());
        }
    }
}

/// Load/save seam for persisted settings.
pub trait SettingsStore {
    fn load(&self) -> eyre::Result<Settings>;
    fn save(&self, settings: &Settings) -> eyre::Result<()>;
}

/// Settings kept in a TOML file. A missing file loads as defaults.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> eyre::Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| eyre::eyre!("read settings {:?}: {}", self.path, e))?;
        let settings: Settings = toml::from_str(&text)
            .map_err(|e| eyre::eyre!("parse settings {:?}: {}", self.path, e))?;
        if let Some(custom) = &settings.custom_plate {
            custom.validate()?;
        }
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> eyre::Result<()> {
        let text = toml::to_string_pretty(settings)
            .map_err(|e| eyre::eyre!("serialize settings: {}", e))?;
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| eyre::eyre!("create settings dir {:?}: {}", dir, e))?;
        }
        std::fs::write(&self.path, text)
            .map_err(|e| eyre::eyre!("write settings {:?}: {}", self.path, e))
    }
}
