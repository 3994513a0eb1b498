pub mod chat;
pub mod config;
pub mod inference;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Platform data directory for StoreChat: logs and the default store.
///
/// - macOS: `~/Library/Application Support/storechat/`
/// - Windows: `{FOLDERID_RoamingAppData}\storechat\`
/// - Linux: `$XDG_DATA_HOME/storechat/` (fallback `~/.local/share/storechat/`)
///
/// Falls back to `~/.storechat/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("storechat");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".storechat")
}

/// Initialize the tracing subscriber, writing to `storechat.log` in the data directory.
///
/// Logs never go to the terminal, which belongs to the conversation. On each start:
/// 1. Rotates existing logs (storechat.log → .1 → .2 → .3, keeps last 3).
/// 2. Opens a fresh storechat.log with a line-flushing writer.
/// 3. Logs a startup banner with the log path.
///
/// Returns the log file path.
pub fn init_tracing() -> std::io::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = data_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("storechat.log");
    rotate_log_file(&log_path, 3);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storechat=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(FlushingWriter::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== StoreChat starting ==="
    );

    Ok(log_path)
}

/// Rotate log files: `storechat.log` → `storechat.log.1` → `.2` → … → `.{keep}`.
///
/// Oldest file beyond `keep` is deleted. Missing files in the chain are skipped.
fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// A file writer that flushes after every write, so each log line is on disk
/// before the next prompt is shown.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }

    fn locked(&self) -> std::io::Result<std::sync::MutexGuard<'_, std::fs::File>> {
        self.file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self.locked()?;
        let n = f.write(buf)?;
        f.flush()?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.locked()?.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_shifts_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("storechat.log");
        for (suffix, body) in [("", "current"), (".1", "one"), (".2", "two"), (".3", "three")] {
            std::fs::write(format!("{}{suffix}", base.display()), body).unwrap();
        }

        rotate_log_file(&base, 3);

        assert!(!base.exists());
        let read = |suffix: &str| std::fs::read_to_string(format!("{}{suffix}", base.display())).unwrap();
        assert_eq!(read(".1"), "current");
        assert_eq!(read(".2"), "one");
        assert_eq!(read(".3"), "two");
    }

    #[test]
    fn flushing_writer_writes_through() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut writer = FlushingWriter::new(std::fs::File::create(&path).unwrap());
        writer.write_all(b"line\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line\n");
    }
}
