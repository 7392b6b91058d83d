//! 终端界面：
//! - `carousel`：目录轮播状态机
//! - `browser`：素材浏览器（`list` 命令）
//! - `config_form`：配置表单（`config edit`）

pub(crate) mod browser;
pub(crate) mod carousel;
pub(crate) mod config_form;
pub(crate) mod info;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// 可在 [`run`] 中驱动的界面
pub(crate) trait TuiApp {
    fn draw(&mut self, frame: &mut Frame);
    fn on_key(&mut self, key: KeyEvent) -> Flow;
    /// 每次事件轮询超时后调用
    fn on_tick(&mut self) {}
}

pub(crate) fn ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

/// Esc 或 Ctrl+C
pub(crate) fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc || ctrl(key, 'c')
}

/// 进入备用屏幕运行界面，结束后恢复终端
pub(crate) fn run<A: TuiApp>(app: &mut A) -> Result<()> {
    enable_raw_mode().context("无法进入终端 raw 模式")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("无法进入备用屏幕");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            return Err(e).context("无法初始化终端");
        }
    };

    let res = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn event_loop<A: TuiApp>(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut A) -> Result<()> {
    terminal.clear()?;
    loop {
        terminal.draw(|f| app.draw(f))?;
        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.on_key(key) == Flow::Quit {
                    return Ok(());
                }
            }
        } else {
            app.on_tick();
        }
    }
}

#[cfg(test)]
pub(crate) fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[cfg(test)]
pub(crate) fn ctrl_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_keys() {
        assert!(is_quit(&key(KeyCode::Esc)));
        assert!(is_quit(&ctrl_key('c')));
        assert!(!is_quit(&key(KeyCode::Char('c'))));
        assert!(ctrl(&ctrl_key('s'), 's'));
        assert!(!ctrl(&key(KeyCode::Char('s')), 's'));
    }
}
