//! Steam 库查找：
//! - 按平台列出 Steam 根目录候选
//! - 解析 `libraryfolders.vdf` 与 `appmanifest_*.acf`
//! - 按应用名定位可执行文件

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::debug;

const APPS_FOLDER: &str = "steamapps";
const LIBRARY_FOLDERS_FILE: &str = "libraryfolders.vdf";
const APP_MANIFEST_PREFIX: &str = "appmanifest_";
const APP_MANIFEST_SUFFIX: &str = ".acf";
const COMMON_FOLDER: &str = "common";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AppInfo {
    pub(crate) app_id: String,
    pub(crate) name: String,
    pub(crate) install_dir: String,
    pub(crate) executable: PathBuf,
}

/// 当前平台上可能的 Steam 安装目录
pub(crate) fn steam_root_candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if cfg!(windows) {
        out.push(PathBuf::from(r"C:\Program Files (x86)\Steam"));
        out.push(PathBuf::from(r"C:\Program Files\Steam"));
    } else if let Some(home) = dirs::home_dir() {
        if cfg!(target_os = "macos") {
            out.push(home.join("Library").join("Application Support").join("Steam"));
        } else {
            out.push(home.join(".steam").join("steam"));
            out.push(home.join(".local").join("share").join("Steam"));
            out.push(home.join(".var/app/com.valvesoftware.Steam/data/Steam"));
        }
    }
    out
}

/// 第一个包含 `steamapps/libraryfolders.vdf` 的候选目录
pub(crate) fn find_steam_path() -> Option<PathBuf> {
    steam_root_candidates()
        .into_iter()
        .find(|p| p.join(APPS_FOLDER).join(LIBRARY_FOLDERS_FILE).is_file())
}

/// 取 VDF 行 `"key"  "value"` 的值
pub(crate) fn vdf_line_value(line: &str) -> Option<&str> {
    let parts: Vec<&str> = line.splitn(5, '"').collect();
    if parts.len() >= 5 {
        Some(parts[3])
    } else {
        None
    }
}

/// Steam 根目录自身 + `libraryfolders.vdf` 中登记的所有库
pub(crate) fn library_paths(steam_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = steam_dir.join(APPS_FOLDER).join(LIBRARY_FOLDERS_FILE);
    let content = fs::read_to_string(&file)
        .with_context(|| format!("读取 Steam 库列表失败: {}", file.display()))?;
    let mut paths = vec![steam_dir.to_path_buf()];
    for line in content.lines().map(str::trim) {
        if !line.starts_with("\"path\"") {
            continue;
        }
        if let Some(v) = vdf_line_value(line).filter(|v| !v.is_empty()) {
            // VDF 中反斜杠被转义
            paths.push(PathBuf::from(v.replace("\\\\", "\\")));
        }
    }
    Ok(paths)
}

/// 解析单个应用清单；缺少 appid 或 name 时返回 None
pub(crate) fn parse_app_manifest(content: &str) -> Option<AppInfo> {
    let mut app = AppInfo::default();
    for line in content.lines().map(str::trim) {
        let slot = if line.starts_with("\"appid\"") {
            &mut app.app_id
        } else if line.starts_with("\"name\"") {
            &mut app.name
        } else if line.starts_with("\"installdir\"") {
            &mut app.install_dir
        } else {
            continue;
        };
        if let Some(v) = vdf_line_value(line) {
            *slot = v.to_string();
        }
    }
    if app.app_id.is_empty() || app.name.is_empty() {
        None
    } else {
        Some(app)
    }
}

/// 读取目录下全部 `appmanifest_*.acf`，无法解析的文件被跳过
pub(crate) fn parse_app_manifests(steamapps: &Path) -> Result<Vec<AppInfo>> {
    let mut apps = Vec::new();
    for entry in fs::read_dir(steamapps)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !(name.starts_with(APP_MANIFEST_PREFIX) && name.ends_with(APP_MANIFEST_SUFFIX)) {
            continue;
        }
        let Ok(content) = fs::read_to_string(entry.path()) else { continue };
        if let Some(app) = parse_app_manifest(&content) {
            apps.push(app);
        }
    }
    apps.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    Ok(apps)
}

/// 在所有库中按名称（忽略大小写）查找应用，并确认可执行文件存在
pub(crate) fn find_app_by_name(steam_dir: &Path, exe_name: &str, app_name: &str) -> Result<AppInfo> {
    let exe = if exe_name.ends_with(env::consts::EXE_SUFFIX) {
        exe_name.to_string()
    } else {
        format!("{}{}", exe_name, env::consts::EXE_SUFFIX)
    };
    for lib in library_paths(steam_dir)? {
        let apps = match parse_app_manifests(&lib.join(APPS_FOLDER)) {
            Ok(apps) => apps,
            Err(e) => {
                debug!("跳过 Steam 库 {}: {}", lib.display(), e);
                continue;
            }
        };
        if let Some(mut app) = apps.into_iter().find(|a| a.name.eq_ignore_ascii_case(app_name)) {
            let path = lib
                .join(APPS_FOLDER)
                .join(COMMON_FOLDER)
                .join(&app.install_dir)
                .join(&exe);
            if !path.is_file() {
                bail!("找到 {} 但可执行文件不存在: {}", app_name, path.display());
            }
            app.executable = path;
            return Ok(app);
        }
    }
    bail!("未在任何 Steam 库中找到应用 {}", app_name)
}
