//! 素材浏览器：
//! - 顶部标题与 `< 上一个 | 当前 | 下一个 >` 目录导航
//! - 左侧编号列表，右侧信息面板与编辑器生成的预览
//! - 预览在后台线程生成，按路径缓存

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use crossterm::event::{KeyCode, KeyEvent};
use log::debug;
use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{
    carousel::{AssetSource, Carousel, Direction, Focus},
    ctrl,
    info::{AssetInfo, AssetKind},
    is_quit, Flow, TuiApp,
};
use crate::aseprite::{
    preview::{PreviewGenerator, PreviewParams},
    AsepriteCli,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum PreviewState {
    Pending,
    Ready(String),
    Failed(String),
}

type PreviewResult = (PathBuf, Result<String, String>);

pub(crate) struct Browser {
    title: String,
    kind: AssetKind,
    carousel: Carousel,
    list_state: ListState,
    cli: AsepriteCli,
    previews: HashMap<PathBuf, PreviewState>,
    tx: Sender<PreviewResult>,
    rx: Receiver<PreviewResult>,
    preview_enabled: bool,
    colors_per_row: usize,
    info_scroll: u16,
    show_help: bool,
    status: Option<String>,
}

impl Browser {
    fn build(title: String, kind: AssetKind, carousel: Carousel, cli: AsepriteCli, preview_enabled: bool) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut b = Self {
            title,
            kind,
            carousel,
            list_state: ListState::default(),
            cli,
            previews: HashMap::new(),
            tx,
            rx,
            preview_enabled,
            colors_per_row: crate::aseprite::preview::DEFAULT_COLORS_PER_ROW,
            info_scroll: 0,
            show_help: true,
            status: None,
        };
        b.sync_selection();
        b
    }

    /// `preview` 为 false 时不调用编辑器生成预览
    pub(crate) fn from_sources(
        title: impl Into<String>,
        kind: AssetKind,
        sources: Vec<AssetSource>,
        cli: AsepriteCli,
        preview: bool,
    ) -> anyhow::Result<Self> {
        Ok(Self::build(title.into(), kind, Carousel::new(sources)?, cli, preview))
    }

    /// 列表控件与轮播保持一致，并为新选中项请求预览
    fn sync_selection(&mut self) {
        self.list_state.select(self.carousel.selected());
        self.info_scroll = 0;
        self.request_preview();
    }

    fn request_preview(&mut self) {
        if !self.preview_enabled {
            return;
        }
        let Some(path) = self.carousel.selected_path() else { return };
        if self.previews.contains_key(&path) {
            return;
        }
        self.previews.insert(path.clone(), PreviewState::Pending);

        let cli = self.cli.clone();
        let tx = self.tx.clone();
        let mut params = PreviewParams::new(path.to_string_lossy().into_owned());
        params.colors_per_row = self.colors_per_row;
        thread::spawn(move || {
            let res = PreviewGenerator::new(&cli)
                .generate(&params)
                .map_err(|e| e.to_string());
            let _ = tx.send((path, res));
        });
    }

    fn collect_previews(&mut self) {
        while let Ok((path, res)) = self.rx.try_recv() {
            debug!("预览完成: {}", path.display());
            let state = match res {
                Ok(text) => PreviewState::Ready(text),
                Err(e) => PreviewState::Failed(e),
            };
            self.previews.insert(path, state);
        }
    }

    fn open_selected(&mut self) {
        let Some(path) = self.carousel.selected_path() else { return };
        self.status = Some(match self.cli.open_with_editor(&path) {
            Ok(()) => format!("已在 Aseprite 中打开 {}", path.display()),
            Err(e) => format!("打开失败: {}", e),
        });
    }

    fn render_navigation(&self, f: &mut Frame, area: Rect) {
        let cols = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
            .split(area);
        let dim = Style::default().fg(Color::DarkGray);
        let prev = self
            .carousel
            .prev_folder()
            .map(|p| format!("< {}", p.display()))
            .unwrap_or_default();
        let next = self
            .carousel
            .next_folder()
            .map(|p| format!("{} >", p.display()))
            .unwrap_or_default();
        let active = self.carousel.active().folder.display().to_string();
        f.render_widget(Paragraph::new(prev).style(dim).alignment(Alignment::Left), cols[0]);
        f.render_widget(
            Paragraph::new(active)
                .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center),
            cols[1],
        );
        f.render_widget(Paragraph::new(next).style(dim).alignment(Alignment::Right), cols[2]);
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .carousel
            .active()
            .assets
            .iter()
            .enumerate()
            .map(|(i, name)| ListItem::new(format!("{}. {}", i + 1, name)))
            .collect();
        let border = if self.carousel.focus() == Focus::List { Color::Magenta } else { Color::DarkGray };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .highlight_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn info_lines(&self) -> Vec<Line<'static>> {
        let Some(path) = self.carousel.selected_path() else {
            return vec![Line::styled("没有选中的素材", Style::default().fg(Color::DarkGray))];
        };
        let mut lines = match AssetInfo::from_path(&path, self.kind) {
            Ok(info) => info.lines(),
            Err(e) => return vec![Line::styled(format!("{:#}", e), Style::default().fg(Color::Red))],
        };
        lines.push(Line::default());
        match self.previews.get(&path) {
            Some(PreviewState::Ready(text)) => {
                lines.extend(text.lines().map(|l| Line::raw(l.to_string())));
            }
            Some(PreviewState::Failed(e)) => {
                lines.push(Line::from(vec![
                    Span::styled("预览失败: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                    Span::raw(e.clone()),
                ]));
            }
            Some(PreviewState::Pending) => {
                lines.push(Line::styled("正在生成预览...", Style::default().fg(Color::DarkGray)));
            }
            None => {}
        }
        lines
    }

    fn render_info(&mut self, f: &mut Frame, area: Rect) {
        self.colors_per_row = (area.width.saturating_sub(2) as usize / 8).max(1);
        let border = if self.carousel.focus() == Focus::Info { Color::Magenta } else { Color::Indexed(63) };
        let p = Paragraph::new(self.info_lines())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.info_scroll, 0));
        f.render_widget(p, area);
    }

    fn help_text(&self) -> &'static str {
        if self.show_help {
            "←/→ 切换目录 • ↑/↓ 选择 • Home/End • Tab 切换焦点 • Enter 在 Aseprite 中打开 • Ctrl+H 帮助 • Esc/Ctrl+C/q 退出"
        } else {
            "Ctrl+H 帮助 • Esc 退出"
        }
    }
}

impl TuiApp for Browser {
    fn draw(&mut self, f: &mut Frame) {
        self.collect_previews();
        let rows = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(f.area());

        f.render_widget(
            Paragraph::new(self.title.clone())
                .style(Style::default().fg(Color::White).bg(Color::Magenta).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center),
            rows[0],
        );
        self.render_navigation(f, rows[1]);

        let body = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[2]);
        self.render_list(f, body[0]);
        self.render_info(f, body[1]);

        if let Some(s) = &self.status {
            f.render_widget(Paragraph::new(s.clone()).style(Style::default().fg(Color::Yellow)), rows[3]);
        }
        f.render_widget(
            Paragraph::new(self.help_text()).style(Style::default().fg(Color::DarkGray)),
            rows[4],
        );
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if is_quit(&key) || key.code == KeyCode::Char('q') {
            return Flow::Quit;
        }
        if ctrl(&key, 'h') {
            self.show_help = !self.show_help;
            return Flow::Continue;
        }
        let info_focused = self.carousel.focus() == Focus::Info;
        match key.code {
            KeyCode::Left => self.carousel.move_folder(Direction::Left),
            KeyCode::Right => self.carousel.move_folder(Direction::Right),
            KeyCode::Tab => {
                self.carousel.toggle_focus();
                return Flow::Continue;
            }
            KeyCode::Up | KeyCode::Char('k') if info_focused => {
                self.info_scroll = self.info_scroll.saturating_sub(1);
                return Flow::Continue;
            }
            KeyCode::Down | KeyCode::Char('j') if info_focused => {
                self.info_scroll = self.info_scroll.saturating_add(1);
                return Flow::Continue;
            }
            KeyCode::Up | KeyCode::Char('k') => self.carousel.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.carousel.select_next(),
            KeyCode::Home => self.carousel.select_first(),
            KeyCode::End => self.carousel.select_last(),
            KeyCode::Enter => {
                self.open_selected();
                return Flow::Continue;
            }
            _ => return Flow::Continue,
        }
        self.status = None;
        self.sync_selection();
        Flow::Continue
    }

    fn on_tick(&mut self) {
        self.collect_previews();
    }
}
