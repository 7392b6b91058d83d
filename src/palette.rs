//! 调色板文件：
//! - 十六进制颜色解析（`#RGB` / `#RGBA` / `#RRGGBB` / `#RRGGBBAA`）
//! - 写出 GIMP 调色板（.gpl）与 .hex 文件
//! - 终端色块预览

use std::{fmt::Write as _, fs, path::Path};

use anyhow::{bail, Context, Result};
use crossterm::style::{Color as TermColor, Stylize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Color {
    pub(crate) fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Palette {
    pub(crate) name: String,
    pub(crate) colors: Vec<Color>,
}

/// 调色板文件格式（仅文本格式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub(crate) enum PaletteFileType {
    #[default]
    Gpl,
    Hex,
}

impl PaletteFileType {
    pub(crate) const ALL: [PaletteFileType; 2] = [PaletteFileType::Gpl, PaletteFileType::Hex];

    pub(crate) fn extension(self) -> &'static str {
        match self {
            PaletteFileType::Gpl => ".gpl",
            PaletteFileType::Hex => ".hex",
        }
    }
}

fn nibble(c: char) -> Result<u8> {
    c.to_digit(16)
        .map(|d| d as u8)
        .with_context(|| format!("不是十六进制字符: {}", c))
}

/// 解析 `#` 开头的十六进制颜色（忽略大小写与首尾空白）
pub(crate) fn parse_hex_color(input: &str) -> Result<Color> {
    let s = input.trim();
    let Some(hex) = s.strip_prefix('#') else {
        bail!("不支持的颜色格式: {}", s);
    };
    let digits: Vec<char> = hex.chars().collect();
    let short = |i: usize| -> Result<u8> { Ok(nibble(digits[i])? * 17) };
    let long = |i: usize| -> Result<u8> { Ok(nibble(digits[i])? * 16 + nibble(digits[i + 1])?) };
    let color = match digits.len() {
        3 => Color { r: short(0)?, g: short(1)?, b: short(2)?, a: 255 },
        4 => Color { r: short(0)?, g: short(1)?, b: short(2)?, a: short(3)? },
        6 => Color { r: long(0)?, g: long(2)?, b: long(4)?, a: 255 },
        8 => Color { r: long(0)?, g: long(2)?, b: long(4)?, a: long(6)? },
        _ => bail!("十六进制颜色长度无效: {}", s),
    };
    Ok(color)
}

/// 解析逗号分隔的颜色列表（空格被忽略）
pub(crate) fn parse_color_list(text: &str) -> Result<Vec<Color>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| parse_hex_color(s).with_context(|| format!("颜色列表格式无效: {}", text.trim())))
        .collect()
}

/// GIMP 调色板文本
pub(crate) fn gpl_text(palette: &Palette) -> String {
    let mut out = String::new();
    out.push_str("GIMP Palette\n");
    let _ = writeln!(out, "Name: {}", palette.name);
    out.push_str("Columns: 0\n#\n");
    for (i, c) in palette.colors.iter().enumerate() {
        let _ = writeln!(out, "{:<3} {:<3} {:<3} Color {}", c.r, c.g, c.b, i + 1);
    }
    out
}

/// 每行一个小写 `rrggbb`
pub(crate) fn hex_text(palette: &Palette) -> String {
    palette
        .colors
        .iter()
        .map(|c| format!("{:02x}{:02x}{:02x}\n", c.r, c.g, c.b))
        .collect()
}

pub(crate) fn write_gpl(palette: &Palette, path: &Path) -> Result<()> {
    fs::write(path, gpl_text(palette)).with_context(|| format!("写出调色板失败: {}", path.display()))
}

pub(crate) fn write_hex(palette: &Palette, path: &Path) -> Result<()> {
    fs::write(path, hex_text(palette)).with_context(|| format!("写出调色板失败: {}", path.display()))
}

pub(crate) fn write_palette(palette: &Palette, path: &Path, kind: PaletteFileType) -> Result<()> {
    match kind {
        PaletteFileType::Gpl => write_gpl(palette, path),
        PaletteFileType::Hex => write_hex(palette, path),
    }
}

/// 以色块形式渲染颜色，每行 `per_row` 个
pub(crate) fn render_swatches(colors: &[Color], per_row: usize) -> String {
    let per_row = per_row.max(1);
    let mut out = String::new();
    for (i, c) in colors.iter().enumerate() {
        let cell = format!(" {} ", c.hex())
            .with(TermColor::Black)
            .on(TermColor::Rgb { r: c.r, g: c.g, b: c.b });
        let _ = write!(out, "{}", cell);
        if (i + 1) % per_row == 0 {
            out.push('\n');
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
