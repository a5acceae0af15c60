//! Named raster patterns persisted as JSON: `{ "name": [ {"x": .., "y": ..}, .. ] }`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One point in canvas coordinates (0..=200 on both axes, centre at 100).
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PatternPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default, Clone)]
pub struct PatternLibrary {
    path: Option<PathBuf>,
    patterns: BTreeMap<String, Vec<PatternPoint>>,
}

impl PatternLibrary {
    /// Open a library file. A missing file yields an empty library bound to that path.
    pub fn open(path: impl Into<PathBuf>) -> eyre::Result<Self> {
        let path = path.into();
        let patterns = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| eyre::eyre!("read patterns {:?}: {}", path, e))?;
            serde_json::from_str(&text)
                .map_err(|e| eyre::eyre!("parse patterns {:?}: {}", path, e))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            patterns,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[PatternPoint]> {
        self.patterns.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Store a pattern under `name`, replacing any previous one, and persist.
    pub fn save(&mut self, name: &str, points: Vec<PatternPoint>) -> eyre::Result<()> {
        let name = name.trim();
        if name.is_empty() {
            eyre::bail!("pattern name must not be empty");
        }
        if points.is_empty() {
            eyre::bail!("refusing to save empty pattern {name:?}");
        }
        if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            eyre::bail!("pattern {name:?} contains non-finite points");
        }
        self.patterns.insert(name.to_string(), points);
        self.flush()
    }

    /// Remove a pattern; returns whether it existed.
    pub fn delete(&mut self, name: &str) -> eyre::Result<bool> {
        let existed = self.patterns.remove(name).is_some();
        if existed {
            self.flush()?;
        }
        Ok(existed)
    }

    fn flush(&self) -> eyre::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&self.patterns)
            .map_err(|e| eyre::eyre!("serialize patterns: {}", e))?;
        std::fs::write(path, text).map_err(|e| eyre::eyre!("write patterns {:?}: {}", path, e))
    }
}
