//! INI file configuration adapter.

use crate::domain::error::TrendsweepError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendsweepError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TrendsweepError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TrendsweepError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TrendsweepError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// Blank values count as absent.
    fn is_blank(&self, section: &str, key: &str) -> bool {
        self.config
            .get(section, key)
            .is_none_or(|v| v.trim().is_empty())
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        if self.is_blank(section, key) {
            return Ok(None);
        }
        self.config
            .getint(section, key)
            .map_err(|e| format!("expected an integer: {e}"))
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
        if self.is_blank(section, key) {
            return Ok(None);
        }
        self.config
            .getfloat(section, key)
            .map_err(|e| format!("expected a number: {e}"))
    }
}
