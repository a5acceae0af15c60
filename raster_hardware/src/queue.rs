use std::path::{Path, PathBuf};
use std::process::Command;

use raster_traits::{AcquisitionSink, BoxError};

use crate::error::{HwError, Result};

const HEADER: &str = "INDEX\tFILE_NAME\tFILE_TEXT\tMS_FILE\tMS_TUNE_FILE\tPROCESS\tPROCESS_PARAMS";
const SAMPLE_TEXT: &str = "HT-DESI";

/// Acquisition queue driven by job files dropped into a watched directory.
///
/// `enqueue` writes `<queue_dir>/<filename>.raw.txt`; `stop` runs the
/// configured stop command, or only logs when there is none.
#[derive(Debug, Clone)]
pub struct QueueFileSink {
    queue_dir: PathBuf,
    stop_command: Option<String>,
}

impl QueueFileSink {
    pub fn new(queue_dir: impl Into<PathBuf>, stop_command: Option<String>) -> Self {
        Self {
            queue_dir: queue_dir.into(),
            stop_command,
        }
    }

    pub fn job_path(&self, filename: &str) -> PathBuf {
        self.queue_dir.join(format!("{filename}.raw.txt"))
    }

    /// Queue file body for one acquisition.
    pub fn job_text(filename: &str, method_file: &Path, data_directory: &Path) -> String {
        let raw = data_directory.join(format!("{filename}.raw"));
        format!(
            "{HEADER}\n1\t\"{}\"\t\"{SAMPLE_TEXT}\"\t\"{}\"\t\"\"\t\"\"\t\"\"\n",
            raw.display(),
            method_file.display()
        )
    }

    fn write_job(&self, filename: &str, method_file: &Path, data_directory: &Path) -> Result<PathBuf> {
        if filename.trim().is_empty() {
            return Err(HwError::Queue("acquisition file name is empty".into()));
        }
        std::fs::create_dir_all(&self.queue_dir)?;
        let path = self.job_path(filename);
        std::fs::write(&path, Self::job_text(filename, method_file, data_directory))?;
        Ok(path)
    }

    fn run_stop(&self) -> Result<()> {
        let Some(cmd) = self.stop_command.as_deref() else {
            tracing::info!("acquisition stop requested (no stop command configured)");
            return Ok(());
        };
        let mut parts = cmd.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| HwError::StopCommand("empty stop command".into()))?;
        let status = Command::new(program)
            .args(parts)
            .status()
            .map_err(|e| HwError::StopCommand(format!("{program}: {e}")))?;
        if !status.success() {
            return Err(HwError::StopCommand(format!("{program} exited with {status}")));
        }
        tracing::info!(command = cmd, "acquisition stopped");
        Ok(())
    }
}

impl AcquisitionSink for QueueFileSink {
    fn enqueue(
        &mut self,
        filename: &str,
        method_file: &Path,
        data_directory: &Path,
    ) -> std::result::Result<(), BoxError> {
        let path = self.write_job(filename, method_file, data_directory)?;
        tracing::info!(path = %path.display(), "acquisition queued");
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), BoxError> {
        Ok(self.run_stop()?)
    }
}
