use crate::prelude::*;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Appends every finished reception cycle to a file, one JSON object per
/// line: the raw record as hex next to the decoded live data.
#[derive(Debug, Clone)]
pub struct DatalogWriter {
    file: Arc<Mutex<std::fs::File>>,
    path: String,
    cycles_written: Arc<Mutex<u64>>,
}

impl DatalogWriter {
    pub fn new(path: &str) -> Result<Self> {
        info!("Opening datalog file at {}", path);

        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to open datalog file {}: {}", path, e);
                return Err(e.into());
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)) {
                error!("Failed to set permissions on datalog file {}: {}", path, e);
                return Err(e.into());
            }
        }

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path: path.to_string(),
            cycles_written: Arc::new(Mutex::new(0)),
        })
    }

    pub fn write_cycle(&self, serial: Serial, record: &[u8], live: &LiveData) -> Result<()> {
        let line = serde_json::json!({
            "utc_timestamp": chrono::Utc::now().timestamp(),
            "serial": serial.to_string(),
            "raw": record.iter().map(|b| format!("{:02X}", b)).collect::<String>(),
            "live": live,
        });
        let line = serde_json::to_string(&line)?;

        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
            error!("Failed to write to datalog file {}: {}", self.path, e);
            return Err(e.into());
        }

        let mut cycles_written = self.cycles_written.lock();
        *cycles_written += 1;
        debug!("Total cycles stored in datalog file: {}", *cycles_written);

        Ok(())
    }

    pub fn cycles_written(&self) -> u64 {
        *self.cycles_written.lock()
    }
}
