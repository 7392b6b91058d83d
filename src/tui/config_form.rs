//! 配置表单：
//! - 前三个固定字段：编辑器路径、OpenAI key、OpenAI URL
//! - 之后是任意数量的精灵 / 调色板目录字段
//! - 输入时逐字段校验，Ctrl+S 写回配置文件

use std::{collections::HashSet, path::{Path, PathBuf}};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction as LayoutDirection, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::{ctrl, is_quit, Flow, TuiApp};
use crate::{
    config::{self, AppConfig},
    dialog,
    utils::is_valid_url,
};

/// 固定字段数量
pub(crate) const REQUIRED_FIELDS: usize = 3;
const MIN_KEY_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    AppPath,
    OpenAiKey,
    OpenAiUrl,
    SpritesFolder,
    PalettesFolder,
}

impl FieldKind {
    fn is_open_ai(self) -> bool {
        matches!(self, FieldKind::OpenAiKey | FieldKind::OpenAiUrl)
    }

    fn is_folder(self) -> bool {
        matches!(self, FieldKind::SpritesFolder | FieldKind::PalettesFolder)
    }

    fn label(self) -> &'static str {
        match self {
            FieldKind::AppPath => "Aseprite 可执行文件",
            FieldKind::OpenAiKey => "OpenAI API Key",
            FieldKind::OpenAiUrl => "OpenAI API URL",
            FieldKind::SpritesFolder => "精灵目录",
            FieldKind::PalettesFolder => "调色板目录",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            FieldKind::AppPath => "输入 Aseprite 可执行文件路径，或按 Enter 打开文件对话框",
            FieldKind::OpenAiKey => "输入 OpenAI API key",
            FieldKind::OpenAiUrl => "输入 OpenAI API URL",
            FieldKind::SpritesFolder => "输入精灵目录，或按 Enter 选择",
            FieldKind::PalettesFolder => "输入调色板目录，或按 Enter 选择",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldStatus {
    Neutral,
    Valid,
    Invalid,
}

#[derive(Debug, Clone)]
pub(crate) struct InputField {
    pub(crate) kind: FieldKind,
    pub(crate) value: String,
    pub(crate) status: FieldStatus,
}

impl InputField {
    fn new(kind: FieldKind, value: impl Into<String>) -> Self {
        let mut f = Self {
            kind,
            value: value.into(),
            status: FieldStatus::Neutral,
        };
        f.validate();
        f
    }

    fn validate(&mut self) {
        self.status = validate_value(self.kind, &self.value);
    }
}

/// 单个字段的校验规则
pub(crate) fn validate_value(kind: FieldKind, raw: &str) -> FieldStatus {
    let value = raw.trim();
    if value.is_empty() || value == "\\" {
        return FieldStatus::Invalid;
    }
    let ok = match kind {
        FieldKind::AppPath => {
            let p = Path::new(value);
            p.is_absolute() && p.is_file()
        }
        FieldKind::OpenAiUrl => is_valid_url(value),
        FieldKind::OpenAiKey => value.starts_with("sk-") && value.len() >= MIN_KEY_LEN,
        FieldKind::SpritesFolder | FieldKind::PalettesFolder => {
            let p = Path::new(value);
            p.is_absolute() && p.is_dir()
        }
    };
    if ok {
        FieldStatus::Valid
    } else {
        FieldStatus::Invalid
    }
}

pub(crate) struct ConfigForm {
    fields: Vec<InputField>,
    active: usize,
    show_help: bool,
    error: Option<String>,
    saved: bool,
}

impl ConfigForm {
    pub(crate) fn from_config(cfg: &AppConfig) -> Self {
        let mut fields = vec![
            InputField::new(FieldKind::AppPath, cfg.aseprite_path.to_string_lossy()),
            InputField::new(FieldKind::OpenAiKey, cfg.open_ai.api_key.as_str()),
            InputField::new(FieldKind::OpenAiUrl, cfg.open_ai.api_url.as_str()),
        ];
        fields.extend(
            cfg.sprites_folder_paths
                .iter()
                .map(|p| InputField::new(FieldKind::SpritesFolder, p.to_string_lossy())),
        );
        fields.extend(
            cfg.palettes_folder_paths
                .iter()
                .map(|p| InputField::new(FieldKind::PalettesFolder, p.to_string_lossy())),
        );
        Self {
            fields,
            active: 0,
            show_help: true,
            error: None,
            saved: false,
        }
    }

    /// 从配置文件构建；环境变量覆盖的值不进入表单，避免保存时写回文件
    pub(crate) fn load() -> Result<Self> {
        Ok(Self::from_config(&config::load_stored()?.config))
    }

    /// 是否已成功保存
    pub(crate) fn saved(&self) -> bool {
        self.saved
    }

    fn current(&mut self) -> &mut InputField {
        &mut self.fields[self.active]
    }

    fn move_focus(&mut self, delta: isize) {
        let n = self.fields.len() as isize;
        self.active = ((self.active as isize + delta + n) % n) as usize;
    }

    /// 除 OpenAI 外的字段全部有效
    fn required_valid(&self) -> bool {
        self.fields
            .iter()
            .all(|f| f.kind.is_open_ai() || f.status == FieldStatus::Valid)
    }

    /// 有效目录去重后数量与目录字段数不同，说明存在重复或无效目录
    fn has_duplicates(&self) -> bool {
        let folders: Vec<&InputField> = self.fields.iter().filter(|f| f.kind.is_folder()).collect();
        let unique: HashSet<&str> = folders
            .iter()
            .filter(|f| f.status == FieldStatus::Valid)
            .map(|f| f.value.trim())
            .collect();
        unique.len() != folders.len()
    }

    fn handle_enter(&mut self) {
        let kind = self.current().kind;
        if self.current().value.is_empty() && !kind.is_open_ai() {
            self.browse();
            return;
        }
        if self.current().status == FieldStatus::Valid {
            self.move_focus(1);
        }
    }

    fn browse(&mut self) {
        let picked = match self.current().kind {
            FieldKind::AppPath => dialog::pick_file("选择 Aseprite 可执行文件"),
            FieldKind::PalettesFolder => dialog::pick_directory("选择调色板目录"),
            _ => dialog::pick_directory("选择 Aseprite 素材目录"),
        };
        if let Some(p) = picked {
            let field = self.current();
            field.value = p.to_string_lossy().into_owned();
            field.validate();
        }
    }

    fn add_folder(&mut self, kind: FieldKind) {
        if self.has_duplicates() {
            self.error = Some("存在重复（或为空）的目录".to_string());
            return;
        }
        if !self.required_valid() {
            self.error = Some("请先为所有字段填写有效路径".to_string());
            return;
        }
        self.fields.push(InputField::new(kind, ""));
        self.active = self.fields.len() - 1;
        self.error = None;
    }

    /// 清空当前字段；超出固定字段的空目录字段直接移除
    fn clear_current(&mut self) {
        let idx = self.active;
        let field = &self.fields[idx];
        if field.value.is_empty() && field.kind.is_folder() && self.fields.len() > REQUIRED_FIELDS && idx >= REQUIRED_FIELDS {
            self.fields.remove(idx);
            self.move_focus(-1);
            return;
        }
        let field = self.current();
        field.value.clear();
        field.validate();
    }

    fn folder_values(&self, kind: FieldKind) -> Vec<PathBuf> {
        self.fields
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| PathBuf::from(f.value.trim()))
            .collect()
    }

    /// 校验并写回配置文件
    fn save(&mut self) -> Result<bool> {
        if !self.required_valid() {
            self.error = Some("保存前请为所有字段填写有效路径".to_string());
            return Ok(false);
        }
        if self.has_duplicates() {
            self.error = Some("存在重复（或为空）的目录".to_string());
            return Ok(false);
        }
        let key = &self.fields[1];
        let url = &self.fields[2];
        if key.status == FieldStatus::Valid || url.status == FieldStatus::Valid {
            config::set_open_ai(key.value.trim(), url.value.trim())?;
        }
        config::save_paths(
            Path::new(self.fields[0].value.trim()),
            &self.folder_values(FieldKind::SpritesFolder),
            &self.folder_values(FieldKind::PalettesFolder),
        )?;
        self.saved = true;
        Ok(true)
    }

    fn field_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (i, f) in self.fields.iter().enumerate() {
            let active = i == self.active;
            let (mark, color) = match f.status {
                FieldStatus::Valid => ("✓", Color::Green),
                FieldStatus::Invalid => ("✗", Color::Red),
                FieldStatus::Neutral => ("·", Color::DarkGray),
            };
            let label_style = if active {
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(vec![
                Span::raw(if active { "> " } else { "  " }),
                Span::styled(f.kind.label(), label_style),
                Span::raw(" "),
                Span::styled(mark, Style::default().fg(color)),
            ]));
            let value = if f.value.is_empty() {
                Span::styled(f.kind.placeholder(), Style::default().fg(Color::DarkGray))
            } else if f.kind == FieldKind::OpenAiKey && !active {
                Span::raw("*".repeat(f.value.chars().count().min(32)))
            } else {
                Span::raw(f.value.clone())
            };
            let cursor = if active { "█" } else { "" };
            lines.push(Line::from(vec![Span::raw("    "), value, Span::raw(cursor)]));
        }
        lines
    }
}

impl TuiApp for ConfigForm {
    fn draw(&mut self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(f.area());
        f.render_widget(
            Paragraph::new("⚙️ Aseprite Assets 配置")
                .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            rows[0],
        );
        f.render_widget(Paragraph::new(self.field_lines()), rows[1]);
        if let Some(e) = &self.error {
            f.render_widget(
                Paragraph::new(format!("错误: {}", e)).style(Style::default().fg(Color::Red)),
                rows[2],
            );
        }
        let help = if self.show_help {
            "↑/↓ 移动 • Enter 确认（空时打开对话框） • Ctrl+A 添加精灵目录 • Ctrl+P 添加调色板目录 • \
             Ctrl+D 清空/移除 • Ctrl+S 保存 • Ctrl+H 帮助 • Esc/Ctrl+C 退出"
        } else {
            "Ctrl+H 帮助 • Esc 退出"
        };
        f.render_widget(
            Paragraph::new(help)
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true }),
            rows[3],
        );
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if is_quit(&key) {
            return Flow::Quit;
        }
        if ctrl(&key, 'h') {
            self.show_help = !self.show_help;
        } else if ctrl(&key, 'a') {
            self.add_folder(FieldKind::SpritesFolder);
        } else if ctrl(&key, 'p') {
            self.add_folder(FieldKind::PalettesFolder);
        } else if ctrl(&key, 'd') {
            self.clear_current();
        } else if ctrl(&key, 's') {
            match self.save() {
                Ok(true) => return Flow::Quit,
                Ok(false) => {}
                Err(e) => self.error = Some(format!("{:#}", e)),
            }
        } else {
            match key.code {
                KeyCode::Up => self.move_focus(-1),
                KeyCode::Down => self.move_focus(1),
                KeyCode::Enter => self.handle_enter(),
                KeyCode::Backspace => {
                    let field = self.current();
                    field.value.pop();
                    field.validate();
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    let field = self.current();
                    field.value.push(c);
                    field.validate();
                }
                _ => {}
            }
        }
        Flow::Continue
    }
}
