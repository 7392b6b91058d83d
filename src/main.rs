//! aseprite-assets：通过 Aseprite 脚本接口管理精灵与调色板
//! - `cli`：参数定义；`commands`：调度
//! - `aseprite`：参数编组与编辑器调用
//! - `tui`：素材浏览器与配置表单

mod aseprite;
mod cli;
mod commands;
mod config;
mod dialog;
mod export;
mod files;
mod init;
mod lospec;
mod openai;
mod palette;
mod palettes;
mod sprites;
mod steam;
mod tui;
mod utils;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = cli::Cli::parse();
    commands::run(cli)
}
