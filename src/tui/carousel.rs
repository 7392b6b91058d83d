//! 目录轮播状态机：
//! - 左右切换当前目录（首尾相接）
//! - 每个目录记住自己的选中位置
//! - 列表 / 信息面板之间的输入焦点

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// 一个目录及其中的素材文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssetSource {
    pub(crate) folder: PathBuf,
    pub(crate) assets: Vec<String>,
}

impl AssetSource {
    pub(crate) fn new(folder: impl Into<PathBuf>, assets: Vec<String>) -> Self {
        Self {
            folder: folder.into(),
            assets,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Left,
    Right,
}

impl Direction {
    fn offset(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Focus {
    #[default]
    List,
    Info,
}

#[derive(Debug, Clone)]
pub(crate) struct Carousel {
    sources: Vec<AssetSource>,
    /// 每个目录记住的选中位置
    cursors: Vec<usize>,
    active: usize,
    focus: Focus,
}

impl Carousel {
    pub(crate) fn new(sources: Vec<AssetSource>) -> Result<Self> {
        if sources.is_empty() {
            bail!("没有可浏览的目录");
        }
        let cursors = vec![0; sources.len()];
        Ok(Self {
            sources,
            cursors,
            active: 0,
            focus: Focus::List,
        })
    }

    pub(crate) fn active_index(&self) -> usize {
        self.active
    }

    pub(crate) fn active(&self) -> &AssetSource {
        &self.sources[self.active]
    }

    pub(crate) fn focus(&self) -> Focus {
        self.focus
    }

    pub(crate) fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::List => Focus::Info,
            Focus::Info => Focus::List,
        };
    }

    /// 当前目录的选中位置；空目录为 None
    pub(crate) fn selected(&self) -> Option<usize> {
        let len = self.active().assets.len();
        if len == 0 {
            None
        } else {
            Some(self.cursors[self.active].min(len - 1))
        }
    }

    pub(crate) fn selected_name(&self) -> Option<&str> {
        self.selected().map(|i| self.active().assets[i].as_str())
    }

    pub(crate) fn selected_path(&self) -> Option<PathBuf> {
        self.selected_name().map(|n| self.active().folder.join(n))
    }

    /// 切换目录：`(i + d + n) % n`，并恢复目标目录记住的位置
    pub(crate) fn move_folder(&mut self, dir: Direction) {
        if let Some(cur) = self.selected() {
            self.cursors[self.active] = cur;
        }
        let n = self.sources.len() as isize;
        self.active = ((self.active as isize + dir.offset() + n) % n) as usize;
        let len = self.active().assets.len();
        let slot = &mut self.cursors[self.active];
        *slot = (*slot).min(len.saturating_sub(1));
    }

    fn set_cursor(&mut self, idx: usize) {
        let len = self.active().assets.len();
        self.cursors[self.active] = idx.min(len.saturating_sub(1));
    }

    pub(crate) fn select_next(&mut self) {
        if let Some(cur) = self.selected() {
            self.set_cursor(cur + 1);
        }
    }

    pub(crate) fn select_prev(&mut self) {
        if let Some(cur) = self.selected() {
            self.set_cursor(cur.saturating_sub(1));
        }
    }

    pub(crate) fn select_first(&mut self) {
        self.set_cursor(0);
    }

    pub(crate) fn select_last(&mut self) {
        let len = self.active().assets.len();
        self.set_cursor(len.saturating_sub(1));
    }

    fn neighbour(&self, offset: isize) -> Option<&Path> {
        let n = self.sources.len() as isize;
        if n == 1 {
            return None;
        }
        let idx = ((self.active as isize + offset + n) % n) as usize;
        Some(self.sources[idx].folder.as_path())
    }

    pub(crate) fn prev_folder(&self) -> Option<&Path> {
        self.neighbour(-1)
    }

    pub(crate) fn next_folder(&self) -> Option<&Path> {
        self.neighbour(1)
    }
}
