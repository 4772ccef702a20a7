use face_crop::CorrectionSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub debug_diagnostics: bool,
    pub high_confidence_threshold: f64,
    pub low_confidence_threshold: f64,
    pub max_jitter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Default)]
pub struct AppConfigOverrides {
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub debug_diagnostics: bool,
    pub high_confidence_threshold: Option<f64>,
    pub low_confidence_threshold: Option<f64>,
    pub seed: Option<u64>,
}

fn base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".facecrop")
}

pub fn default_path() -> PathBuf {
    base_dir().join("config.toml")
}

impl AppConfig {
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(default_path);
        let cfg = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .build()
            .unwrap_or_default();

        let defaults = CorrectionSettings::default();
        let log_level = cfg
            .get_string("log_level")
            .unwrap_or_else(|_| "info".to_string());
        let log_dir = cfg
            .get_string("log_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir().join("logs"));
        let debug_diagnostics = cfg.get_bool("debug_diagnostics").unwrap_or(false);
        let high_confidence_threshold = cfg
            .get_float("high_confidence_threshold")
            .unwrap_or(defaults.high_confidence_threshold);
        let low_confidence_threshold = cfg
            .get_float("low_confidence_threshold")
            .unwrap_or(defaults.low_confidence_threshold);
        let max_jitter = cfg.get_float("max_jitter").unwrap_or(defaults.max_jitter);
        let seed = cfg.get_int("seed").ok().map(|s| s as u64);

        Self {
            log_level,
            log_dir,
            debug_diagnostics,
            high_confidence_threshold,
            low_confidence_threshold,
            max_jitter,
            seed,
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(d) = &ov.log_dir {
            self.log_dir = d.clone();
        }
        if ov.debug_diagnostics {
            self.debug_diagnostics = true;
        }
        if let Some(t) = ov.high_confidence_threshold {
            self.high_confidence_threshold = t;
        }
        if let Some(t) = ov.low_confidence_threshold {
            self.low_confidence_threshold = t;
        }
        if let Some(s) = ov.seed {
            self.seed = Some(s);
        }
        self
    }

    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<()> {
        let path = path.unwrap_or_else(default_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, data)
    }

    pub fn correction_settings(&self) -> CorrectionSettings {
        CorrectionSettings {
            high_confidence_threshold: self.high_confidence_threshold,
            low_confidence_threshold: self.low_confidence_threshold,
            max_jitter: self.max_jitter,
            debug: self.debug_diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(Some(tmp.path().join("absent.toml")));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.high_confidence_threshold, 80.0);
        assert_eq!(cfg.low_confidence_threshold, 50.0);
        assert_eq!(cfg.max_jitter, 0.05);
        assert!(!cfg.debug_diagnostics);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn reads_values_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "log_level = \"debug\"\nhigh_confidence_threshold = 90\nmax_jitter = 0.01\nseed = 7\n",
        )
        .unwrap();
        let cfg = AppConfig::load_from(Some(path));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.high_confidence_threshold, 90.0);
        assert_eq!(cfg.max_jitter, 0.01);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn overrides_win_over_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(Some(tmp.path().join("absent.toml"))).apply_overrides(
            &AppConfigOverrides {
                log_level: Some("trace".into()),
                debug_diagnostics: true,
                seed: Some(3),
                ..AppConfigOverrides::default()
            },
        );
        assert_eq!(cfg.log_level, "trace");
        assert!(cfg.debug_diagnostics);
        assert_eq!(cfg.seed, Some(3));
        assert!(cfg.correction_settings().debug);
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let mut cfg = AppConfig::load_from(Some(path.clone()));
        cfg.low_confidence_threshold = 40.0;
        cfg.log_dir = tmp.path().join("logs");
        cfg.save_to(Some(path.clone())).unwrap();
        assert_eq!(AppConfig::load_from(Some(path)), cfg);
    }
}
