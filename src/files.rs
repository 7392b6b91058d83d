//! 文件辅助模块：
//! - 按扩展名查找素材（单层 / 递归 / 多目录并发）
//! - 扩展名规范化与替换
//! - 删除、打开文件

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::mpsc,
    thread,
};

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use walkdir::WalkDir;

/// 补全扩展名前导的 `.`
pub(crate) fn pref_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// 文件扩展名（含 `.`，小写）；没有扩展名时为空串
fn lower_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// 文件扩展名是否属于给定列表（忽略大小写）
pub(crate) fn check_extension(path: impl AsRef<Path>, exts: &[&str]) -> bool {
    let ext = lower_extension(path.as_ref());
    !ext.is_empty() && exts.iter().any(|e| pref_extension(e).to_lowercase() == ext)
}

/// 确保文件名带有指定扩展名：已是该扩展名则不变，否则在文件名后追加
pub(crate) fn ensure_extension(path: &Path, ext: &str) -> PathBuf {
    if check_extension(path, &[ext]) {
        return path.to_path_buf();
    }
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(pref_extension(ext));
    path.with_file_name(name)
}

/// 替换文件名的扩展名；没有扩展名时追加
pub(crate) fn change_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext.trim_start_matches('.'))
}

pub(crate) fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

pub(crate) fn dir_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_dir()
}

/// 创建文件所在目录（若不存在）
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| format!("创建目录失败: {}", dir.display()))?;
        }
    }
    Ok(())
}

/// 删除文件；文件不存在时报错
pub(crate) fn remove_file(path: &Path) -> Result<()> {
    if !file_exists(path) {
        bail!("文件不存在: {}", path.display());
    }
    fs::remove_file(path).with_context(|| format!("删除文件失败: {}", path.display()))
}

fn list_dir_matches(dir: &Path, exts: &[&str]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("读取目录失败: {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if check_extension(&path, exts) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// 递归查找，按所在目录分组；不跟随符号链接
pub(crate) fn find_files_recursive(dir: &Path, exts: &[&str]) -> Result<BTreeMap<PathBuf, Vec<String>>> {
    let mut out: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(e).with_context(|| format!("读取目录失败: {}", dir.display()));
            }
            Err(e) => {
                warn!("跳过无法读取的路径: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !check_extension(entry.path(), exts) {
            continue;
        }
        let parent = entry.path().parent().map(Path::to_path_buf).unwrap_or_default();
        out.entry(parent)
            .or_default()
            .push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(out)
}

/// 目录及其中的文件名
pub(crate) type FolderFiles = (PathBuf, Vec<String>);

/// 多目录并发查找（每个目录一个线程），结果按输入目录顺序返回。
/// 目录不存在时报错；没有匹配文件的目录被省略。
pub(crate) fn find_in_folders(folders: &[PathBuf], exts: &[&str], recursive: bool) -> Result<Vec<FolderFiles>> {
    for f in folders {
        if !dir_exists(f) {
            bail!("目录不存在: {}", f.display());
        }
    }

    let (tx, rx) = mpsc::channel::<(usize, Result<Vec<FolderFiles>>)>();
    let exts: Vec<String> = exts.iter().map(|e| e.to_string()).collect();
    for (idx, folder) in folders.iter().enumerate() {
        let tx = tx.clone();
        let folder = folder.clone();
        let exts = exts.clone();
        thread::spawn(move || {
            let exts: Vec<&str> = exts.iter().map(String::as_str).collect();
            let res = if recursive {
                find_files_recursive(&folder, &exts).map(|m| m.into_iter().collect())
            } else {
                list_dir_matches(&folder, &exts).map(|mut names| {
                    names.sort();
                    vec![(folder.clone(), names)]
                })
            };
            let _ = tx.send((idx, res));
        });
    }
    drop(tx);

    let mut collected: Vec<(usize, Vec<FolderFiles>)> = Vec::with_capacity(folders.len());
    for (idx, res) in rx {
        collected.push((idx, res?));
    }
    collected.sort_by_key(|(idx, _)| *idx);

    let out: Vec<FolderFiles> = collected
        .into_iter()
        .flat_map(|(_, groups)| groups)
        .filter(|(_, names)| !names.is_empty())
        .collect();
    debug!("在 {} 个目录中找到 {} 组文件", folders.len(), out.len());
    Ok(out)
}

/// 用系统默认程序打开
pub(crate) fn open_default(path: &Path) -> Result<()> {
    let abs = path
        .canonicalize()
        .with_context(|| format!("文件不存在: {}", path.display()))?;
    let url = url::Url::from_file_path(&abs)
        .map_err(|_| anyhow::anyhow!("无法转换为 file URL: {}", abs.display()))?;
    webbrowser::open(url.as_str()).with_context(|| format!("打开文件失败: {}", abs.display()))
}

/// 用指定程序打开（不等待退出）
pub(crate) fn open_with(path: &Path, app: &Path) -> Result<()> {
    Command::new(app)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("无法用 {} 打开 {}", app.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(p: &Path) {
        ensure_parent_dir(p).unwrap();
        fs::write(p, b"x").unwrap();
    }

    #[test]
    fn extension_helpers() {
        assert_eq!(pref_extension("png"), ".png");
        assert_eq!(pref_extension(".png"), ".png");
        assert_eq!(ensure_extension(Path::new("hero"), "png"), PathBuf::from("hero.png"));
        assert_eq!(ensure_extension(Path::new("hero.PNG"), ".png"), PathBuf::from("hero.PNG"));
        assert_eq!(change_extension(Path::new("/a/b/hero.aseprite"), "gif"), PathBuf::from("/a/b/hero.gif"));
        assert_eq!(change_extension(Path::new("hero"), ".gif"), PathBuf::from("hero.gif"));
        assert!(check_extension("A.GPL", &[".gpl"]));
        assert!(check_extension("a.ase", &["ase"]));
        assert!(!check_extension("a.aseprite.bak", &[".aseprite"]));
        assert!(!check_extension("noext", &[".gpl"]));
    }

    #[test]
    fn dotted_names_and_directories_are_kept() {
        assert_eq!(ensure_extension(Path::new("hero.v2"), ".aseprite"), PathBuf::from("hero.v2.aseprite"));
        assert_eq!(ensure_extension(Path::new("/art.d/hero"), "gpl"), PathBuf::from("/art.d/hero.gpl"));
        assert_eq!(change_extension(Path::new("/art.v1/hero"), "png"), PathBuf::from("/art.v1/hero.png"));
        assert_eq!(change_extension(Path::new("/art.v1/hero.ase"), "png"), PathBuf::from("/art.v1/hero.png"));
    }

    #[test]
    fn flat_search_ignores_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("b.ase"));
        touch(&tmp.path().join("a.aseprite"));
        touch(&tmp.path().join("note.txt"));
        touch(&tmp.path().join("sub/c.ase"));
        let mut names = list_dir_matches(tmp.path(), &[".aseprite", ".ase"]).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.aseprite", "b.ase"]);
        assert!(list_dir_matches(tmp.path(), &[".gpl"]).unwrap().is_empty());
    }

    #[test]
    fn recursive_search_groups_by_directory() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("a.gpl"));
        touch(&tmp.path().join("deep/x/B.GPL"));
        touch(&tmp.path().join("deep/readme.md"));
        let groups = find_files_recursive(tmp.path(), &[".gpl"]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[tmp.path()], vec!["a.gpl"]);
        assert_eq!(groups[&tmp.path().join("deep/x")], vec!["B.GPL"]);
    }

    #[test]
    fn folder_fan_out_keeps_input_order_and_skips_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let c = tmp.path().join("c");
        touch(&a.join("1.ase"));
        fs::create_dir_all(&b).unwrap();
        touch(&c.join("2.ase"));
        touch(&c.join("nested/3.ase"));

        let flat = find_in_folders(&[c.clone(), b.clone(), a.clone()], &[".ase"], false).unwrap();
        assert_eq!(flat, vec![(c.clone(), vec!["2.ase".to_string()]), (a.clone(), vec!["1.ase".to_string()])]);

        let rec = find_in_folders(&[c.clone()], &[".ase"], true).unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec[1].0, c.join("nested"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycles_are_not_followed() {
        let tmp = tempfile::tempdir().unwrap();
        let art = tmp.path().join("art");
        touch(&art.join("hero.ase"));
        std::os::unix::fs::symlink(&art, art.join("loop")).unwrap();
        let groups = find_in_folders(&[art.clone()], &[".ase"], true).unwrap();
        assert_eq!(groups, vec![(art, vec!["hero.ase".to_string()])]);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find_in_folders(&[tmp.path().join("gone")], &[".ase"], false).is_err());
    }

    #[test]
    fn remove_file_errors_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("x.gpl");
        assert!(remove_file(&p).is_err());
        touch(&p);
        remove_file(&p).unwrap();
        assert!(!file_exists(&p));
    }
}
