//! 内置 Lua 脚本的安装与列举
//! - `scripts install` 将编译期打包的脚本写到脚本目录
//! - 已存在的文件默认跳过，`--force` 覆盖

use anyhow::{bail, Context, Result};
use include_dir::{include_dir, Dir};
use log::debug;
use std::{
    fs,
    path::{Path, PathBuf},
};

static BUNDLED_SCRIPTS: Dir = include_dir!("$CARGO_MANIFEST_DIR/scripts");

/// 安装结果
#[derive(Debug, Default)]
pub(crate) struct InstallReport {
    pub(crate) written: Vec<PathBuf>,
    pub(crate) skipped: Vec<PathBuf>,
}

/// 将内置脚本（含子目录）写出到 `target_dir`
pub(crate) fn install_scripts(target_dir: &Path, force: bool) -> Result<InstallReport> {
    if target_dir.exists() && !target_dir.is_dir() {
        bail!("{} 不是目录", target_dir.display());
    }
    fs::create_dir_all(target_dir)
        .with_context(|| format!("创建脚本目录失败: {}", target_dir.display()))?;

    let mut report = InstallReport::default();
    write_dir(&BUNDLED_SCRIPTS, target_dir, force, &mut report)?;
    Ok(report)
}

fn write_dir(dir: &Dir, target_dir: &Path, force: bool, report: &mut InstallReport) -> Result<()> {
    for f in dir.files() {
        let out_path = target_dir.join(f.path());
        if out_path.exists() && !force {
            debug!("跳过已存在的脚本: {}", out_path.display());
            report.skipped.push(out_path);
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, f.contents())
            .with_context(|| format!("写出脚本失败: {}", out_path.display()))?;
        report.written.push(out_path);
    }
    for sub in dir.dirs() {
        write_dir(sub, target_dir, force, report)?;
    }
    Ok(())
}

/// 内置脚本的相对路径，排序后返回
pub(crate) fn bundled_scripts() -> Vec<PathBuf> {
    fn walk(dir: &Dir, out: &mut Vec<PathBuf>) {
        out.extend(dir.files().map(|f| f.path().to_path_buf()));
        for sub in dir.dirs() {
            walk(sub, out);
        }
    }
    let mut out = Vec::new();
    walk(&BUNDLED_SCRIPTS, &mut out);
    out.sort();
    out
}

/// 列出内置脚本及其在 `dir` 中是否已安装
pub(crate) fn list_scripts(dir: &Path) -> Vec<(PathBuf, bool)> {
    bundled_scripts()
        .into_iter()
        .map(|rel| {
            let installed = dir.join(&rel).is_file();
            (rel, installed)
        })
        .collect()
}
