//! Aseprite 调用模块：
//! - 组装 `<exe> [args..] --script <scripts_dir/script>` 并执行
//! - 捕获合并后的 stdout/stderr 文本
//! - 资源扩展名表、颜色模式与颜色格式

pub(crate) mod args;
pub(crate) mod preview;
pub(crate) mod scripts;

use std::{
    fmt,
    io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use clap::ValueEnum;
use log::debug;
use thiserror::Error;

use crate::config::AppConfig;
use args::ScriptCommand;

pub(crate) const NAME: &str = "Aseprite";

/// 精灵文件扩展名
pub(crate) const SPRITE_EXTENSIONS: &[&str] = &[".aseprite", ".ase"];
/// 调色板文件扩展名（列表、删除等操作使用）
pub(crate) const PALETTE_EXTENSIONS: &[&str] = &[".gpl", ".png"];

/// Aseprite 可以加载调色板的全部扩展名（含精灵文件）
pub(crate) const LOADABLE_PALETTE_EXTENSIONS: &[&str] = &[
    ".ase", ".aseprite", ".bmp", ".flc", ".fli", ".gif", ".ico", ".jpeg", ".jpg", ".pcc", ".png",
    ".qoi", ".tga", ".webp", ".act", ".col", ".gpl", ".hex", ".pal",
];

/// Aseprite 支持导出的扩展名（不含精灵文件本身）
const EXPORT_ONLY_EXTENSIONS: &[&str] = &[
    ".bmp", ".css", ".flc", ".fli", ".gif", ".ico", ".jpeg", ".jpg", ".pcx", ".pcc", ".png", ".qoi",
    ".svg", ".tga", ".webp",
];

/// 可导出的全部扩展名：精灵格式 + 图像格式
pub(crate) fn export_extensions() -> Vec<&'static str> {
    SPRITE_EXTENSIONS
        .iter()
        .chain(EXPORT_ONLY_EXTENSIONS.iter())
        .copied()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum ColorMode {
    Indexed,
    #[default]
    Rgb,
    Grayscale,
}

impl ColorMode {
    pub(crate) const ALL: [ColorMode; 3] = [ColorMode::Indexed, ColorMode::Rgb, ColorMode::Grayscale];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ColorMode::Indexed => "indexed",
            ColorMode::Rgb => "rgb",
            ColorMode::Grayscale => "grayscale",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 调色板预览中颜色值的输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ColorFormat {
    #[default]
    Hex,
    Rgb,
}

impl ColorFormat {
    /// 未知格式回退为 hex
    pub(crate) fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" => ColorFormat::Rgb,
            _ => ColorFormat::Hex,
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorFormat::Hex => f.write_str("hex"),
            ColorFormat::Rgb => f.write_str("rgb"),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum AsepriteError {
    #[error("无法启动 Aseprite（{path}）: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Aseprite 命令执行失败（{status}）:\n{output}")]
    Failed { status: String, output: String },
    #[error("不支持的文件类型: {0}")]
    UnsupportedFileType(String),
}

/// Aseprite 命令行封装
#[derive(Debug, Clone)]
pub(crate) struct AsepriteCli {
    executable: PathBuf,
    scripts_dir: PathBuf,
}

impl AsepriteCli {
    pub(crate) fn new(executable: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            scripts_dir: scripts_dir.into(),
        }
    }

    pub(crate) fn from_config(cfg: &AppConfig) -> Self {
        Self::new(&cfg.aseprite_path, &cfg.scripts_dir)
    }

    /// 运行 `--version` 确认可执行文件可用，返回版本输出
    pub(crate) fn check_prerequisites(&self) -> Result<String, AsepriteError> {
        self.run(&["--version".to_string()])
    }

    pub(crate) fn script_path(&self, script: &Path) -> PathBuf {
        self.scripts_dir.join(script)
    }

    /// 执行脚本：参数之后追加 `--script <path>`
    pub(crate) fn execute(&self, script: &Path, mut args: Vec<String>) -> Result<String, AsepriteError> {
        args.push("--script".to_string());
        args.push(self.script_path(script).to_string_lossy().into_owned());
        self.run(&args)
    }

    pub(crate) fn execute_command(&self, command: &dyn ScriptCommand) -> Result<(), AsepriteError> {
        self.execute_command_output(command).map(|_| ())
    }

    pub(crate) fn execute_command_output(&self, command: &dyn ScriptCommand) -> Result<String, AsepriteError> {
        self.execute(&command.script_name(), command.args())
    }

    /// 在 Aseprite 界面中打开文件（不等待退出）
    pub(crate) fn open_with_editor(&self, file: &Path) -> Result<(), AsepriteError> {
        Command::new(&self.executable)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| AsepriteError::Spawn {
                path: self.executable.display().to_string(),
                source,
            })
    }

    fn run(&self, args: &[String]) -> Result<String, AsepriteError> {
        debug!("执行 {} {:?}", self.executable.display(), args);
        let out = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| AsepriteError::Spawn {
                path: self.executable.display().to_string(),
                source,
            })?;
        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));
        if !out.status.success() {
            return Err(AsepriteError::Failed {
                status: out.status.to_string(),
                output: text,
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_format_falls_back_to_hex() {
        assert_eq!(ColorFormat::from_str_lossy("rgb"), ColorFormat::Rgb);
        assert_eq!(ColorFormat::from_str_lossy(" RGB "), ColorFormat::Rgb);
        assert_eq!(ColorFormat::from_str_lossy("hsl"), ColorFormat::Hex);
        assert_eq!(ColorFormat::from_str_lossy(""), ColorFormat::Hex);
    }

    #[test]
    fn export_extensions_start_with_sprite_formats() {
        let exts = export_extensions();
        assert_eq!(&exts[..2], SPRITE_EXTENSIONS);
        assert!(exts.contains(&".png"));
        assert!(!exts.contains(&".gpl"));
    }

    #[test]
    fn script_path_is_joined_with_scripts_dir() {
        let cli = AsepriteCli::new("/usr/bin/aseprite", "/opt/scripts");
        assert_eq!(
            cli.script_path(Path::new("helpers/sprite-layers-names.lua")),
            PathBuf::from("/opt/scripts/helpers/sprite-layers-names.lua")
        );
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let cli = AsepriteCli::new("/definitely/not/here/aseprite", "/tmp");
        match cli.check_prerequisites() {
            Err(AsepriteError::Spawn { path, .. }) => assert!(path.contains("not/here")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[cfg(unix)]
    fn fake_editor(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let exe = dir.join("aseprite");
        std::fs::write(&exe, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        exe
    }

    #[cfg(unix)]
    #[test]
    fn execute_appends_script_path_and_captures_output() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = fake_editor(tmp.path(), r#"echo "$@""#);
        let cli = AsepriteCli::new(&exe, "/opt/scripts");
        let out = cli
            .execute(Path::new("sprite-preview.lua"), vec!["-b".into(), "--script-param".into(), "x=1".into()])
            .unwrap();
        assert_eq!(out.trim(), "-b --script-param x=1 --script /opt/scripts/sprite-preview.lua");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_combined_output() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = fake_editor(tmp.path(), "echo partial; echo boom >&2; exit 3");
        let cli = AsepriteCli::new(&exe, tmp.path());
        match cli.execute(Path::new("x.lua"), Vec::new()) {
            Err(AsepriteError::Failed { output, .. }) => {
                assert!(output.contains("partial"));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
