//! 素材信息面板：元数据读取与格式化

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const LABEL_WIDTH: usize = 11;
pub(crate) const MAX_PATH_LEN: usize = 45;
const DATE_FORMAT: &str = "%b %d, %Y %H:%M";
const KB: u64 = 1024;
const MB: u64 = KB * KB;

/// 素材类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssetKind {
    Sprite,
    Palette,
}

impl AssetKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            AssetKind::Sprite => "精灵",
            AssetKind::Palette => "调色板",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AssetInfo {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) size: u64,
    pub(crate) modified: Option<DateTime<Local>>,
    pub(crate) extension: String,
    pub(crate) kind: AssetKind,
}

impl AssetInfo {
    pub(crate) fn from_path(path: &Path, kind: AssetKind) -> Result<Self> {
        let meta = fs::metadata(path).with_context(|| format!("无法读取文件信息: {}", path.display()))?;
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
            kind,
        })
    }

    /// 面板中的标题与字段行
    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(pad_label(label), Style::default().fg(Color::DarkGray)),
                Span::raw(value),
            ])
        };
        vec![
            Line::from(Span::styled(
                self.name.clone(),
                Style::default().fg(Color::Indexed(63)).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            field("类型:", self.kind.label().to_string()),
            field("大小:", format_size(self.size)),
            field("扩展名:", self.extension.clone()),
            field(
                "修改时间:",
                self.modified
                    .map(|m| m.format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            field("路径:", truncate_middle(&self.path.to_string_lossy(), MAX_PATH_LEN)),
        ]
    }
}

/// 按显示宽度（中文占两列）补齐标签
fn pad_label(label: &str) -> String {
    let width: usize = label.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum();
    format!("{}{}", label, " ".repeat(LABEL_WIDTH.saturating_sub(width)))
}

pub(crate) fn format_size(size: u64) -> String {
    if size < KB {
        format!("{} B", size)
    } else if size < MB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{:.2} MB", size as f64 / MB as f64)
    }
}

/// 过长路径保留文件名和尽量多的末级目录，前面用 `...` 代替
pub(crate) fn truncate_middle(path: &str, max_len: usize) -> String {
    const SEP: &str = "...";
    if path.chars().count() <= max_len {
        return path.to_string();
    }
    let p = Path::new(path);
    let base = p
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let sep_char = std::path::MAIN_SEPARATOR;
    let fixed = SEP.len() + 1 + base.chars().count();
    if fixed > max_len {
        return format!("{}{}", SEP, base);
    }

    let mut budget = max_len - fixed;
    let mut tail: Vec<String> = Vec::new();
    if let Some(parent) = p.parent() {
        for comp in parent.iter().rev() {
            let s = comp.to_string_lossy();
            let need = s.chars().count() + 1;
            if need > budget || s == sep_char.to_string() {
                break;
            }
            budget -= need;
            tail.push(s.into_owned());
        }
    }
    tail.reverse();
    let mut out = String::from(SEP);
    for seg in tail {
        out.push(sep_char);
        out.push_str(&seg);
    }
    out.push(sep_char);
    out.push_str(&base);
    out
}
