//! 配置模块：
//! - 定义 `AppConfig`（编辑器路径、脚本目录、素材目录、OpenAI 设置）
//! - 从 `$HOME/.aseprite-assets.yaml` 读写，首次运行时写出默认值
//! - 环境变量覆盖与配置校验

use std::{
    env, fmt, fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aseprite,
    steam,
    utils::{env_opt_path, env_opt_string},
};

pub(crate) const CONFIG_FILE_NAME: &str = ".aseprite-assets.yaml";
pub(crate) const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
/// 默认脚本目录名（相对当前工作目录）
pub(crate) const DEFAULT_SCRIPTS_DIR: &str = "scripts";

/// 配置文件路径覆盖
pub(crate) const ENV_CONFIG: &str = "ASEPRITE_ASSETS_CONFIG";
pub(crate) const ENV_ASEPRITE_PATH: &str = "ASEPRITE_ASSETS_ASEPRITE_PATH";
pub(crate) const ENV_SCRIPTS_DIR: &str = "ASEPRITE_ASSETS_SCRIPTS_DIR";
pub(crate) const ENV_OPENAI_KEY: &str = "ASEPRITE_ASSETS_OPENAI_KEY";
pub(crate) const ENV_OPENAI_URL: &str = "ASEPRITE_ASSETS_OPENAI_URL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct OpenAiConfig {
    pub(crate) api_key: String,
    pub(crate) api_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) from_steam: bool,
    pub(crate) app_id: String,
    pub(crate) aseprite_path: PathBuf,
    pub(crate) scripts_dir: PathBuf,
    /// 精灵目录，兼容旧字段名 `assets_folder_paths`
    #[serde(alias = "assets_folder_paths")]
    pub(crate) sprites_folder_paths: Vec<PathBuf>,
    pub(crate) palettes_folder_paths: Vec<PathBuf>,
    #[serde(alias = "open_ai_api")]
    pub(crate) open_ai: OpenAiConfig,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("无法确定用户主目录")]
    NoHomeDir,
    #[error("读写配置文件失败 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("解析配置文件失败 {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("配置无效:\n{}", format_problems(.0))]
    Invalid(Vec<String>),
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 已加载的配置及其文件路径
#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    pub(crate) config: AppConfig,
    pub(crate) path: PathBuf,
}

/// 配置文件路径：`ASEPRITE_ASSETS_CONFIG` > `$HOME/.aseprite-assets.yaml`
pub(crate) fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(p) = env_opt_path(ENV_CONFIG) {
        return Ok(p);
    }
    dirs::home_dir()
        .map(|h| h.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHomeDir)
}

/// 查找编辑器：环境变量 `ASEPRITE` 优先，其次 Steam 库。返回 (路径, app id, 是否来自 Steam)
pub(crate) fn detect_aseprite() -> (PathBuf, String, bool) {
    if let Some(p) = env_opt_path("ASEPRITE") {
        return (p, String::new(), false);
    }
    let found = steam::find_steam_path()
        .and_then(|dir| steam::find_app_by_name(&dir, aseprite::NAME, aseprite::NAME).ok());
    match found {
        Some(app) => (app.executable, app.app_id, true),
        None => (PathBuf::new(), String::new(), false),
    }
}

fn default_scripts_dir() -> PathBuf {
    env::current_dir()
        .map(|d| d.join(DEFAULT_SCRIPTS_DIR))
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCRIPTS_DIR))
}

impl AppConfig {
    /// 首次运行时的默认配置
    pub(crate) fn with_defaults() -> Self {
        let mut cfg = AppConfig::default();
        cfg.fill_defaults();
        cfg
    }

    /// 为缺失的字段补上默认值
    pub(crate) fn fill_defaults(&mut self) {
        if self.aseprite_path.as_os_str().is_empty() && !self.from_steam {
            let (path, app_id, from_steam) = detect_aseprite();
            self.aseprite_path = path;
            if self.app_id.is_empty() {
                self.app_id = app_id;
            }
            self.from_steam = from_steam;
        }
        if self.scripts_dir.as_os_str().is_empty() {
            self.scripts_dir = default_scripts_dir();
        }
        if self.open_ai.api_url.is_empty() {
            self.open_ai.api_url = DEFAULT_OPENAI_URL.to_string();
        }
        if self.open_ai.api_key.is_empty() {
            self.open_ai.api_key = env_opt_string("OPENAI_API_KEY").unwrap_or_default();
        }
    }

    /// 环境变量覆盖（不写回文件）
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Some(p) = env_opt_path(ENV_ASEPRITE_PATH) {
            self.aseprite_path = p;
        }
        if let Some(p) = env_opt_path(ENV_SCRIPTS_DIR) {
            self.scripts_dir = p;
        }
        if let Some(k) = env_opt_string(ENV_OPENAI_KEY) {
            self.open_ai.api_key = k;
        }
        if let Some(u) = env_opt_string(ENV_OPENAI_URL) {
            self.open_ai.api_url = u;
        }
    }

    /// 校验配置，一次性返回全部问题
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.from_steam && self.app_id.is_empty() {
            problems.push("使用 Steam 版本时缺少 app_id".to_string());
        } else if self.aseprite_path.as_os_str().is_empty() {
            problems.push("缺少必填配置: aseprite_path".to_string());
        } else if !self.aseprite_path.is_absolute() || (cfg!(windows) && !has_exe_extension(&self.aseprite_path)) {
            problems.push("aseprite_path 必须是可执行文件的绝对路径".to_string());
        }

        if self.sprites_folder_paths.is_empty() {
            problems.push("至少需要配置一个精灵目录".to_string());
        }
        for p in &self.sprites_folder_paths {
            if !p.is_absolute() {
                problems.push(format!("精灵目录必须是绝对路径: {}", p.display()));
            }
        }
        for p in &self.palettes_folder_paths {
            if !p.is_absolute() {
                problems.push(format!("调色板目录必须是绝对路径: {}", p.display()));
            }
        }

        if self.scripts_dir.as_os_str().is_empty() {
            problems.push("缺少必填配置: scripts_dir".to_string());
        } else if !self.scripts_dir.is_absolute() {
            problems.push("scripts_dir 必须是绝对路径".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

fn has_exe_extension(p: &Path) -> bool {
    p.extension()
        .map(|e| e.eq_ignore_ascii_case("exe"))
        .unwrap_or(false)
}

/// 读取配置文件（不应用环境变量）；文件不存在时写出默认配置
pub(crate) fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let cfg = AppConfig::with_defaults();
        write_file(&cfg, path)?;
        info!("已写出默认配置: {}", path.display());
        return Ok(cfg);
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: AppConfig = if text.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };
    cfg.fill_defaults();
    Ok(cfg)
}

pub(crate) fn write_file(cfg: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let text = serde_yaml::to_string(cfg).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("配置已保存: {}", path.display());
    Ok(())
}

/// 加载有效配置：文件 + 默认值 + 环境变量覆盖
pub(crate) fn load() -> Result<LoadedConfig, ConfigError> {
    let path = config_path()?;
    let mut config = read_file(&path)?;
    config.apply_env_overrides();
    Ok(LoadedConfig { config, path })
}

/// 只读配置文件本身（含默认值，不含环境变量覆盖），供需要写回的场景使用
pub(crate) fn load_stored() -> Result<LoadedConfig, ConfigError> {
    let path = config_path()?;
    let config = read_file(&path)?;
    Ok(LoadedConfig { config, path })
}

/// 读取、修改并写回配置文件
fn update(f: impl FnOnce(&mut AppConfig)) -> Result<(), ConfigError> {
    let path = config_path()?;
    let mut cfg = read_file(&path)?;
    f(&mut cfg);
    write_file(&cfg, &path)?;
    info!("配置已更新: {}", path.display());
    Ok(())
}

pub(crate) fn save_paths(app: &Path, sprites: &[PathBuf], palettes: &[PathBuf]) -> Result<(), ConfigError> {
    update(|cfg| {
        cfg.aseprite_path = app.to_path_buf();
        cfg.sprites_folder_paths = sprites.to_vec();
        cfg.palettes_folder_paths = palettes.to_vec();
    })
}

pub(crate) fn set_scripts_dir(dir: &Path) -> Result<(), ConfigError> {
    update(|cfg| cfg.scripts_dir = dir.to_path_buf())
}

/// 将脚本目录设为 `<cwd>/scripts`
pub(crate) fn set_default_scripts_dir() -> Result<(), ConfigError> {
    let dir = default_scripts_dir();
    set_scripts_dir(&dir)
}

pub(crate) fn set_open_ai(api_key: &str, api_url: &str) -> Result<(), ConfigError> {
    update(|cfg| {
        cfg.open_ai = OpenAiConfig {
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
        }
    })
}

/// 隐藏密钥中间部分
fn mask_secret(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

impl fmt::Display for LoadedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.config;
        let list = |v: &[PathBuf]| {
            v.iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "使用的配置文件: {}", self.path.display())?;
        writeln!(f, "全部设置:")?;
        writeln!(f, "[")?;
        writeln!(f, "\tfrom_steam: {}", c.from_steam)?;
        writeln!(f, "\tapp_id: {}", c.app_id)?;
        writeln!(f, "\taseprite_path: {}", c.aseprite_path.display())?;
        writeln!(f, "\tscripts_dir: {}", c.scripts_dir.display())?;
        writeln!(f, "\tsprites_folder_paths: [{}]", list(&c.sprites_folder_paths))?;
        writeln!(f, "\tpalettes_folder_paths: [{}]", list(&c.palettes_folder_paths))?;
        writeln!(f, "\topen_ai.api_key: {}", mask_secret(&c.open_ai.api_key))?;
        writeln!(f, "\topen_ai.api_url: {}", c.open_ai.api_url)?;
        write!(f, "]")
    }
}

/// 配置文件与全部设置的文本描述
pub(crate) fn info() -> Result<String, ConfigError> {
    Ok(load()?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// 将配置文件与编辑器路径指向临时目录
    fn isolate(dir: &Path) -> PathBuf {
        let path = dir.join("config.yaml");
        env::set_var(ENV_CONFIG, &path);
        env::set_var("ASEPRITE", "/opt/aseprite/aseprite");
        for k in [ENV_ASEPRITE_PATH, ENV_SCRIPTS_DIR, ENV_OPENAI_KEY, ENV_OPENAI_URL] {
            env::remove_var(k);
        }
        path
    }

    fn valid() -> AppConfig {
        AppConfig {
            aseprite_path: PathBuf::from(if cfg!(windows) { r"C:\a\aseprite.exe" } else { "/a/aseprite" }),
            scripts_dir: PathBuf::from(if cfg!(windows) { r"C:\scripts" } else { "/scripts" }),
            sprites_folder_paths: vec![PathBuf::from(if cfg!(windows) { r"C:\art" } else { "/art" })],
            ..AppConfig::default()
        }
    }

    #[test]
    #[serial]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = isolate(tmp.path());
        let loaded = load().unwrap();
        assert!(path.exists());
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.config.aseprite_path, PathBuf::from("/opt/aseprite/aseprite"));
        assert_eq!(loaded.config.open_ai.api_url, DEFAULT_OPENAI_URL);
        assert!(loaded.config.scripts_dir.ends_with(DEFAULT_SCRIPTS_DIR));
        env::remove_var(ENV_CONFIG);
    }

    #[test]
    #[serial]
    fn legacy_keys_are_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = isolate(tmp.path());
        fs::write(
            &path,
            "aseprite_path: /bin/ase\nassets_folder_paths:\n  - /art\nopen_ai_api:\n  api_key: sk-legacy\n",
        )
        .unwrap();
        let cfg = load().unwrap().config;
        assert_eq!(cfg.sprites_folder_paths, vec![PathBuf::from("/art")]);
        assert_eq!(cfg.open_ai.api_key, "sk-legacy");
        assert_eq!(cfg.open_ai.api_url, DEFAULT_OPENAI_URL);
        env::remove_var(ENV_CONFIG);
    }

    #[test]
    #[serial]
    fn env_overrides_are_not_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = isolate(tmp.path());
        env::set_var(ENV_SCRIPTS_DIR, "/elsewhere/scripts");
        let cfg = load().unwrap().config;
        assert_eq!(cfg.scripts_dir, PathBuf::from("/elsewhere/scripts"));

        set_open_ai("sk-1234567890abcdefghij", "https://example.com/v1").unwrap();
        let on_disk = read_file(&path).unwrap();
        assert_ne!(on_disk.scripts_dir, PathBuf::from("/elsewhere/scripts"));
        assert_eq!(on_disk.open_ai.api_url, "https://example.com/v1");
        env::remove_var(ENV_SCRIPTS_DIR);
        env::remove_var(ENV_CONFIG);
    }

    #[test]
    #[serial]
    fn stored_config_ignores_env_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let path = isolate(tmp.path());
        fs::write(&path, "aseprite_path: /bin/ase\nopen_ai:\n  api_key: sk-from-file\n").unwrap();
        env::set_var(ENV_OPENAI_KEY, "sk-from-env");
        env::set_var(ENV_ASEPRITE_PATH, "/env/ase");
        assert_eq!(load().unwrap().config.open_ai.api_key, "sk-from-env");
        let stored = load_stored().unwrap().config;
        assert_eq!(stored.open_ai.api_key, "sk-from-file");
        assert_eq!(stored.aseprite_path, PathBuf::from("/bin/ase"));
        env::remove_var(ENV_OPENAI_KEY);
        env::remove_var(ENV_ASEPRITE_PATH);
        env::remove_var(ENV_CONFIG);
    }

    #[test]
    #[serial]
    fn save_paths_round_trips_through_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = isolate(tmp.path());
        save_paths(
            Path::new("/apps/aseprite"),
            &[PathBuf::from("/art/a"), PathBuf::from("/art/b")],
            &[PathBuf::from("/pal")],
        )
        .unwrap();
        set_scripts_dir(Path::new("/custom/scripts")).unwrap();
        let cfg = read_file(&path).unwrap();
        assert_eq!(cfg.aseprite_path, PathBuf::from("/apps/aseprite"));
        assert_eq!(cfg.sprites_folder_paths.len(), 2);
        assert_eq!(cfg.palettes_folder_paths, vec![PathBuf::from("/pal")]);
        assert_eq!(cfg.scripts_dir, PathBuf::from("/custom/scripts"));
        env::remove_var(ENV_CONFIG);
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validation_collects_every_problem() {
        let cfg = AppConfig {
            aseprite_path: PathBuf::from("relative/aseprite"),
            scripts_dir: PathBuf::new(),
            palettes_folder_paths: vec![PathBuf::from("pal")],
            ..AppConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 4, "{:?}", problems);
                assert!(problems.iter().any(|p| p.contains("aseprite_path")));
                assert!(problems.iter().any(|p| p.contains("scripts_dir")));
                assert!(problems.iter().any(|p| p.contains("pal")));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn steam_mode_requires_app_id() {
        let mut cfg = valid();
        cfg.from_steam = true;
        cfg.aseprite_path = PathBuf::new();
        match cfg.validate() {
            Err(ConfigError::Invalid(p)) => assert_eq!(p, vec!["使用 Steam 版本时缺少 app_id".to_string()]),
            other => panic!("unexpected: {:?}", other),
        }
        cfg.app_id = "431730".into();
        assert!(cfg.validate().is_err());
        cfg.aseprite_path = valid().aseprite_path;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_error_lists_problems() {
        let msg = ConfigError::Invalid(vec!["a".into(), "b".into()]).to_string();
        assert_eq!(msg, "配置无效:\n  - a\n  - b");
    }

    #[test]
    fn secrets_are_masked() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("sk-abcdefghijklmnop"), "sk-...mnop");
    }
}
