use log::error;
use std::path::{Path, PathBuf};

use crate::geo::CoordinateSample;

use super::ClientError;

/// The last sample the server acknowledged, kept on disk so a restarted
/// client does not immediately resend an unchanged position.
pub struct LastLocationStore {
    path: PathBuf,
}

impl LastLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when nothing was saved yet or the file cannot be read.
    pub fn load(&self) -> Option<CoordinateSample> {
        if !self.path.exists() {
            return None;
        }
        match self.try_load() {
            Ok(sample) => Some(sample),
            Err(e) => {
                error!("Error loading last location: {}", e);
                None
            }
        }
    }

    fn try_load(&self) -> Result<CoordinateSample, ClientError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, sample: &CoordinateSample) {
        let result = serde_json::to_string_pretty(sample)
            .map_err(ClientError::from)
            .and_then(|json| std::fs::write(&self.path, json).map_err(ClientError::from));
        if let Err(e) = result {
            error!("Error saving last location: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn temp_store() -> LastLocationStore {
        LastLocationStore::new(
            std::env::temp_dir().join(format!("last-location-{}.json", uuid::Uuid::new_v4())),
        )
    }

    #[test]
    fn missing_file_is_none() {
        assert!(temp_store().load().is_none());
    }

    #[test]
    fn survives_save_and_load() {
        let store = temp_store();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let sample = CoordinateSample::new(40.7128, -74.006, ts).unwrap();
        store.save(&sample);
        assert_eq!(store.load(), Some(sample));
        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn out_of_range_sample_is_none() {
        let store = temp_store();
        std::fs::write(
            store.path(),
            r#"{"latitude": 95.0, "longitude": -74.0, "timestamp": "2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert!(store.load().is_none());
        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn unreadable_content_is_none() {
        let store = temp_store();
        std::fs::write(store.path(), "[]").unwrap();
        assert!(store.load().is_none());
        std::fs::remove_file(store.path()).unwrap();
    }
}
