use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub paging: PagingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8081".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Where the gallery keeps its files on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Organized images, named `<perceptual hash>.<ext>`
    #[serde(default = "default_gallery_dir")]
    pub gallery_dir: PathBuf,

    /// Drop folder for images that have not been hashed yet
    #[serde(default = "default_raw_images_dir")]
    pub raw_images_dir: PathBuf,

    /// Tag files, one `<perceptual hash>.txt` per image
    #[serde(default = "default_raw_tags_dir")]
    pub raw_tags_dir: PathBuf,

    /// JSON object mapping tag name to category
    #[serde(default = "default_tag_category_map")]
    pub tag_category_map: PathBuf,

    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_gallery_dir() -> PathBuf {
    PathBuf::from("./gallery")
}

fn default_raw_images_dir() -> PathBuf {
    PathBuf::from("./raw_images")
}

fn default_raw_tags_dir() -> PathBuf {
    PathBuf::from("./raw_txt_files")
}

fn default_tag_category_map() -> PathBuf {
    PathBuf::from("./tag_to_category.json")
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("./exports")
}

fn default_image_extensions() -> Vec<String> {
    vec![
        "jpg".to_string(),
        "jpeg".to_string(),
        "png".to_string(),
        "webp".to_string(),
        "gif".to_string(),
    ]
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            gallery_dir: default_gallery_dir(),
            raw_images_dir: default_raw_images_dir(),
            raw_tags_dir: default_raw_tags_dir(),
            tag_category_map: default_tag_category_map(),
            exports_dir: default_exports_dir(),
            image_extensions: default_image_extensions(),
        }
    }
}

/// Page size bounds applied at the HTTP boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Upper bound for the plain image listing
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    /// Upper bound for filtered and album listings
    #[serde(default = "default_max_filtered_limit")]
    pub max_filtered_limit: u32,
}

fn default_limit() -> u32 {
    20
}

fn default_max_limit() -> u32 {
    100
}

fn default_max_filtered_limit() -> u32 {
    1000
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            max_filtered_limit: default_max_filtered_limit(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ago")
        .join("gallery.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            server: ServerConfig::default(),
            library: LibraryConfig::default(),
            paging: PagingConfig::default(),
        }
    }
}

impl Config {
    /// Load from the `AGO_CONFIG` path if set, otherwise from the default
    /// location, writing a default file there on first run.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("AGO_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ago")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
