use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use vitrine_state::{ModelCatalog, ModelEntry, ViewSettings};

/// One `models` entry: either a bare path or a path with a display name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelSpec {
    Path(PathBuf),
    Named { path: PathBuf, name: String },
}

#[derive(Debug, Default, Deserialize)]
struct ViewSection {
    default_scale: Option<f32>,
    zoom_factor: Option<f32>,
    min_scale: Option<f32>,
    max_scale: Option<f32>,
    load_timeout_secs: Option<u64>,
}

/// The viewer's TOML configuration: where the models live, which ones the
/// catalog cycles through, and the zoom numbers.
#[derive(Debug, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_models_dir")]
    models_dir: PathBuf,
    models: Vec<ModelSpec>,
    #[serde(default)]
    view: ViewSection,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Builds the ordered catalog. Relative entries resolve under
    /// `models_dir`; every file must exist, since a bad list is a
    /// configuration error rather than a recoverable load failure.
    pub fn catalog(&self) -> Result<ModelCatalog> {
        let mut entries = Vec::with_capacity(self.models.len());
        for spec in &self.models {
            let entry = match spec {
                ModelSpec::Path(path) => ModelEntry::from_path(self.resolve(path)),
                ModelSpec::Named { path, name } => {
                    ModelEntry::new(self.resolve(path), name.clone())
                }
            };
            ensure!(
                entry.path.is_file(),
                "model file {} does not exist",
                entry.path.display()
            );
            entries.push(entry);
        }
        ModelCatalog::new(entries).context("building the model catalog")
    }

    pub fn view_settings(&self) -> Result<ViewSettings> {
        let defaults = ViewSettings::default();
        let settings = ViewSettings {
            default_scale: self.view.default_scale.unwrap_or(defaults.default_scale),
            zoom_factor: self.view.zoom_factor.unwrap_or(defaults.zoom_factor),
            min_scale: self.view.min_scale.unwrap_or(defaults.min_scale),
            max_scale: self.view.max_scale.unwrap_or(defaults.max_scale),
            load_timeout: self.view.load_timeout_secs.map(Duration::from_secs),
        };
        settings.validate().context("invalid [view] settings")?;
        Ok(settings)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.models_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("vitrine-config-test-{}", std::process::id()))
            .join(tag);
        fs::create_dir_all(dir.join("models")).unwrap();
        fs::write(dir.join("models/a.gltf"), b"{}").unwrap();
        fs::write(dir.join("models/b.gltf"), b"{}").unwrap();
        dir
    }

    fn parse(text: &str) -> ViewerConfig {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn full_config_parses() {
        let dir = fixture_dir("full");
        let config = parse(&format!(
            r#"
            models_dir = "{models}"
            models = [
                "a.gltf",
                {{ path = "b.gltf", name = "The B House" }},
            ]

            [view]
            default_scale = 0.1
            zoom_factor = 1.2
            min_scale = 0.001
            max_scale = 1000.0
            load_timeout_secs = 30
            "#,
            models = dir.join("models").display()
        ));

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).name, "a", "bare entries are named by file stem");
        assert_eq!(catalog.get(1).name, "The B House");
        assert!(catalog.get(0).path.ends_with("models/a.gltf"));

        let settings = config.view_settings().unwrap();
        assert_eq!(settings.zoom_factor, 1.2);
        assert_eq!(settings.load_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn view_section_is_optional() {
        let dir = fixture_dir("defaults");
        let config = parse(&format!(
            "models_dir = \"{}\"\nmodels = [\"a.gltf\"]\n",
            dir.join("models").display()
        ));
        let settings = config.view_settings().unwrap();
        assert_eq!(settings, ViewSettings::default());
        assert_eq!(config.catalog().unwrap().len(), 1);
    }

    #[test]
    fn absolute_paths_skip_models_dir() {
        let dir = fixture_dir("absolute");
        let absolute = dir.join("models/a.gltf");
        let config = parse(&format!(
            "models_dir = \"elsewhere\"\nmodels = [\"{}\"]\n",
            absolute.display()
        ));
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.get(0).path, absolute);
    }

    #[test]
    fn empty_model_list_is_fatal() {
        let config = parse("models = []\n");
        let err = config.catalog().unwrap_err();
        assert!(err.to_string().contains("catalog"));
    }

    #[test]
    fn missing_model_file_is_fatal() {
        let dir = fixture_dir("missing");
        let config = parse(&format!(
            "models_dir = \"{}\"\nmodels = [\"ghost.gltf\"]\n",
            dir.join("models").display()
        ));
        let err = config.catalog().unwrap_err();
        assert!(err.to_string().contains("ghost.gltf"));
    }

    #[test]
    fn bad_zoom_factor_is_fatal() {
        let config = parse("models = [\"a.gltf\"]\n\n[view]\nzoom_factor = 0.9\n");
        assert!(config.view_settings().is_err());
    }

    #[test]
    fn unreadable_config_reports_the_path() {
        let err = ViewerConfig::load("definitely/not/vitrine.toml").unwrap_err();
        assert!(format!("{err:#}").contains("vitrine.toml"));
    }
}
