use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::api::ProviderId;
use crate::api::providers::{aniwatch, mangadex, zoro};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_provider")]
    pub default_provider: ProviderId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub aniwatch: AniWatchConfig,
    #[serde(default)]
    pub zoro: ZoroConfig,
    #[serde(default)]
    pub mangadex: MangaDexConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AniWatchConfig {
    #[serde(default = "default_aniwatch_url")]
    pub base_url: String,
    #[serde(default = "default_aniwatch_server")]
    pub server: String,
    /// "sub" or "dub"
    #[serde(default = "default_aniwatch_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoroConfig {
    #[serde(default = "default_zoro_url")]
    pub base_url: String,
    #[serde(default = "default_zoro_server")]
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaDexConfig {
    #[serde(default = "default_mangadex_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_command")]
    pub command: String,
    #[serde(default = "default_player_args")]
    pub args: Vec<String>,
    #[serde(default = "default_subtitle")]
    pub preferred_subtitle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Tried in order until one launches.
    #[serde(default = "default_viewers")]
    pub commands: Vec<ViewerCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

fn default_provider() -> ProviderId {
    ProviderId::Zoro
}

fn default_aniwatch_url() -> String {
    aniwatch::DEFAULT_BASE_URL.to_string()
}

fn default_aniwatch_server() -> String {
    aniwatch::DEFAULT_SERVER.to_string()
}

fn default_aniwatch_category() -> String {
    aniwatch::DEFAULT_CATEGORY.to_string()
}

fn default_zoro_url() -> String {
    zoro::DEFAULT_BASE_URL.to_string()
}

fn default_zoro_server() -> String {
    zoro::DEFAULT_SERVER.to_string()
}

fn default_mangadex_url() -> String {
    mangadex::DEFAULT_BASE_URL.to_string()
}

fn default_player_command() -> String {
    "mpv".to_string()
}

fn default_player_args() -> Vec<String> {
    vec![
        "--force-window=immediate".to_string(),
        "--cache=yes".to_string(),
        "--demuxer-max-bytes=150M".to_string(),
    ]
}

fn default_subtitle() -> String {
    "English".to_string()
}

fn default_viewers() -> Vec<ViewerCommand> {
    let viewer = |command: &str, args: &[&str]| ViewerCommand {
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    };
    // `{list}` is the page list file, `{first}` the first page URL.
    // Every viewer also receives the list on stdin.
    vec![
        viewer(
            "feh",
            &["-.", "--scale-down", "--draw-filename", "--image-bg", "black", "-f", "{list}"],
        ),
        viewer("sxiv", &["-a", "-f", "-p", "-i"]),
        viewer("imv", &[]),
        viewer("xdg-open", &["{first}"]),
    ]
}

fn default_accent_color() -> String {
    "magenta".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
        }
    }
}

impl Default for AniWatchConfig {
    fn default() -> Self {
        Self {
            base_url: default_aniwatch_url(),
            server: default_aniwatch_server(),
            category: default_aniwatch_category(),
            timeout_secs: None,
        }
    }
}

impl Default for ZoroConfig {
    fn default() -> Self {
        Self {
            base_url: default_zoro_url(),
            server: default_zoro_server(),
            timeout_secs: None,
        }
    }
}

impl Default for MangaDexConfig {
    fn default() -> Self {
        Self {
            base_url: default_mangadex_url(),
            timeout_secs: None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: default_player_command(),
            args: default_player_args(),
            preferred_subtitle: default_subtitle(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            commands: default_viewers(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            accent_color: default_accent_color(),
        }
    }
}

impl ProvidersConfig {
    /// Configured stream server for an anime provider.
    pub fn server_for(&self, provider: ProviderId) -> Option<&str> {
        match provider {
            ProviderId::AniWatch => Some(&self.aniwatch.server),
            ProviderId::Zoro => Some(&self.zoro.server),
            ProviderId::MangaDex => None,
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "kanshi").ok_or(Error::NoConfigDir)
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn data_dir() -> Result<PathBuf> {
    let dirs = project_dirs().map_err(|_| Error::NoDataDir)?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Reads `path`, writing defaults there first if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
