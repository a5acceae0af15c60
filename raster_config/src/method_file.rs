//! Instrument method files: plain text, one `Key,Value` entry per line.
//!
//! Only values are rewritten; unknown lines and their order survive untouched.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct MethodFile {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl MethodFile {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            trailing_newline: text.ends_with('\n'),
        }
    }

    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("read method file {:?}: {}", path, e))?;
        Ok(Self::parse(&text))
    }

    pub fn save(&self, path: &Path) -> eyre::Result<()> {
        std::fs::write(path, self.to_string())
            .map_err(|e| eyre::eyre!("write method file {:?}: {}", path, e))
    }

    /// Raw value of the first line whose key contains `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter(|l| l.contains(key))
            .find_map(|l| l.split(',').nth(1))
            .map(str::trim)
    }

    pub fn field_f64(&self, key: &str) -> eyre::Result<f64> {
        let raw = self
            .field(key)
            .ok_or_else(|| eyre::eyre!("{key} not found in method file"))?;
        raw.parse::<f64>()
            .map_err(|e| eyre::eyre!("{key} has invalid value {raw:?}: {e}"))
    }

    pub fn field_u32(&self, key: &str) -> eyre::Result<u32> {
        let raw = self
            .field(key)
            .ok_or_else(|| eyre::eyre!("{key} not found in method file"))?;
        raw.parse::<u32>()
            .map_err(|e| eyre::eyre!("{key} has invalid value {raw:?}: {e}"))
    }

    /// Replace the value of every line that starts with `key,`. Returns the count.
    pub fn set(&mut self, key: &str, value: &str) -> usize {
        let prefix = format!("{key},");
        let mut n = 0;
        for line in &mut self.lines {
            if line.starts_with(&prefix) {
                *line = format!("{key},{value}");
                n += 1;
            }
        }
        n
    }

    /// Replace the value of every line matching `pred`, keeping its key.
    pub fn set_where(&mut self, pred: impl Fn(&str) -> bool, value: &str) -> usize {
        let mut n = 0;
        for line in &mut self.lines {
            if pred(line) {
                let key = line.split(',').next().unwrap_or_default().trim_end().to_string();
                *line = format!("{key},{value}");
                n += 1;
            }
        }
        n
    }
}

impl fmt::Display for MethodFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))?;
        if self.trailing_newline {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "FunctionType,MS\nFunctionScanTime,0.5\nDesiXStep,0.1\nDesiXRate,1000\n";

    #[test]
    fn reads_scan_time_by_fragment() {
        let m = MethodFile::parse(SAMPLE);
        assert_eq!(m.field("FunctionScanTime"), Some("0.5"));
        assert!((m.field_f64("FunctionScanTime").unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let m = MethodFile::parse(SAMPLE);
        let err = m.field_u32("NoOfChannels").unwrap_err();
        assert!(err.to_string().contains("NoOfChannels not found"));
    }

    #[test]
    fn set_rewrites_only_exact_key_and_keeps_order() {
        let mut m = MethodFile::parse(SAMPLE);
        assert_eq!(m.set("DesiXStep", "0.020000"), 1);
        assert_eq!(m.set("DesiSlot", "Full"), 0);
        assert_eq!(
            m.to_string(),
            "FunctionType,MS\nFunctionScanTime,0.5\nDesiXStep,0.020000\nDesiXRate,1000\n"
        );
    }

    #[test]
    fn set_where_keeps_original_key() {
        let mut m = MethodFile::parse("Dwell(s)_1,0.1\nDwell(s)_2,0.1\nOther,1");
        let n = m.set_where(|l| l.trim_start().starts_with("Dwell(s)_"), "0.05");
        assert_eq!(n, 2);
        assert_eq!(m.to_string(), "Dwell(s)_1,0.05\nDwell(s)_2,0.05\nOther,1");
    }
}
