//! Lospec 调色板下载：
//! - 规范化调色板名称（`Sweetie 16` -> `sweetie-16`）
//! - 下载 `https://lospec.com/palette-list/<name>.<format>` 到本地目录

use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

#[cfg(feature = "remote")]
use crate::utils::{print_error, print_success};

pub(crate) const LOSPEC_BASE_URL: &str = "https://lospec.com/palette-list";
pub(crate) const SUPPORTED_FORMATS: &[&str] = &["gpl", "hex", "png", "pal", "ase", "txt"];
pub(crate) const DEFAULT_FORMAT: &str = "gpl";

/// 小写、空白折叠为 `-`，只保留字母、数字与 `-`
pub(crate) fn parse_palette_name(name: &str) -> Result<String> {
    let joined = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let processed: String = joined
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();
    if processed.is_empty() {
        bail!("调色板名称无效: '{}'", name);
    }
    Ok(processed)
}

pub(crate) fn check_format(format: &str) -> Result<()> {
    if !SUPPORTED_FORMATS.contains(&format) {
        bail!("不支持的格式: {}（可选: {}）", format, SUPPORTED_FORMATS.join(", "));
    }
    Ok(())
}

pub(crate) fn palette_url(name: &str, format: &str) -> String {
    format!("{}/{}.{}", LOSPEC_BASE_URL, name, format)
}

pub(crate) fn palette_file(dest: &Path, name: &str, format: &str) -> PathBuf {
    dest.join(format!("{}.{}", name, format))
}

/// 逐个下载；单个失败只打印错误并继续。返回成功写出的文件
#[cfg(feature = "remote")]
pub(crate) fn import_palettes(names: &[String], dest: &Path, format: &str) -> Result<Vec<PathBuf>> {
    use crate::utils::spinner;

    check_format(format)?;
    if !dest.is_dir() {
        bail!("目标目录不存在: {}", dest.display());
    }

    let mut saved = Vec::new();
    for raw in names {
        let name = match parse_palette_name(raw) {
            Ok(n) => n,
            Err(e) => {
                print_error(&e.to_string());
                continue;
            }
        };
        let url = palette_url(&name, format);
        let path = palette_file(dest, &name, format);
        let progress = spinner(format!("正在下载 {}...", raw));
        let res = download(&url, &path);
        progress.finish_and_clear();
        match res {
            Ok(()) => {
                print_success(&format!("已下载 {} ➡ {}", raw, path.display()));
                saved.push(path);
            }
            Err(e) => print_error(&format!("下载并保存 {} 失败: {:#}", raw, e)),
        }
    }
    Ok(saved)
}

#[cfg(not(feature = "remote"))]
pub(crate) fn import_palettes(_names: &[String], _dest: &Path, _format: &str) -> Result<Vec<PathBuf>> {
    bail!("未启用 remote 特性，无法从 Lospec 下载调色板")
}

#[cfg(feature = "remote")]
fn download(url: &str, path: &Path) -> Result<()> {
    let resp = match ureq::get(url).set("User-Agent", "aseprite-assets/0.1").call() {
        Ok(r) => r,
        Err(e) => bail!("HTTP 请求失败 {}: {}", url, e),
    };
    save_stream(&mut resp.into_reader(), path)
}

/// 先写入同目录的临时文件，完整写完后再改名；失败时不留下残缺文件
#[cfg_attr(not(feature = "remote"), allow(dead_code))]
pub(crate) fn save_stream(reader: &mut dyn Read, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).with_context(|| format!("创建临时文件失败: {}", dir.display()))?;
    io::copy(reader, &mut tmp).with_context(|| format!("写入文件失败: {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("保存文件失败: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_slugified() {
        assert_eq!(parse_palette_name("Sweetie 16").unwrap(), "sweetie-16");
        assert_eq!(parse_palette_name("  Endesga   32 ").unwrap(), "endesga-32");
        assert_eq!(parse_palette_name("PICO-8!").unwrap(), "pico-8");
        assert!(parse_palette_name("!!! ").is_err());
        assert!(parse_palette_name("").is_err());
    }

    #[test]
    fn formats_are_checked() {
        assert!(check_format("gpl").is_ok());
        assert!(check_format("txt").is_ok());
        assert!(check_format("GPL").is_err());
        assert!(check_format("json").is_err());
    }

    #[test]
    fn url_and_destination() {
        assert_eq!(palette_url("sweetie-16", "hex"), "https://lospec.com/palette-list/sweetie-16.hex");
        assert_eq!(
            palette_file(Path::new("/pal"), "sweetie-16", "gpl"),
            PathBuf::from("/pal/sweetie-16.gpl")
        );
    }

    /// 先给出部分数据，随后报错
    struct BrokenReader {
        sent: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            let data = b"GIMP Palette\n";
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }
    }

    #[test]
    fn interrupted_transfer_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sweetie-16.gpl");
        assert!(save_stream(&mut BrokenReader { sent: false }, &path).is_err());
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn complete_transfer_replaces_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sweetie-16.hex");
        std::fs::write(&path, "old").unwrap();
        save_stream(&mut &b"1a1c2c\n5d275d\n"[..], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1a1c2c\n5d275d\n");
    }

    #[cfg(feature = "remote")]
    #[test]
    fn bad_format_fails_before_any_request() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(import_palettes(&["x".to_string()], tmp.path(), "bmp").is_err());
    }
}
