//! 命令行参数（clap derive）
//! 子命令按素材种类分组：config / sprite / palette / export / list / show / scripts

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::{aseprite::ColorMode, palette::PaletteFileType};

/// 顶层 CLI 入口
#[derive(Parser, Debug)]
#[command(name = "aseprite-assets", about = "通过 Aseprite 脚本管理精灵与调色板素材", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

/// 子命令定义
#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// 查看或编辑配置
    #[command(visible_alias = "cfg")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// 精灵文件：新建、打开、图层、删除
    #[command(visible_alias = "s")]
    Sprite {
        #[command(subcommand)]
        action: SpriteAction,
    },
    /// 调色板：AI 生成、Lospec 下载、删除
    #[command(visible_alias = "p")]
    Palette {
        #[command(subcommand)]
        action: PaletteAction,
    },
    /// 导出精灵为其它格式
    #[command(visible_alias = "e")]
    Export(ExportArgs),
    /// 在终端浏览已有素材
    #[command(visible_alias = "l")]
    List {
        /// 浏览精灵
        #[arg(short, long, conflicts_with = "palettes")]
        sprites: bool,
        /// 浏览调色板
        #[arg(short, long)]
        palettes: bool,
        /// 递归查找子目录
        #[arg(short, long)]
        recursive: bool,
    },
    /// 在终端输出素材预览
    #[command(visible_alias = "sh")]
    Show {
        /// 素材文件
        #[arg(short, long, value_name = "FILE")]
        filename: PathBuf,
        /// 调色板颜色格式（hex|rgb）
        #[arg(short = 'c', long, default_value = "hex", value_name = "FORMAT")]
        color_format: String,
        /// 每行颜色数（仅调色板）
        #[arg(short = 'r', long, default_value_t = 5, value_name = "N")]
        output_row_count: usize,
        /// 对精灵文件输出其调色板
        #[arg(short, long)]
        palette_preview: bool,
    },
    /// 内置 Lua 脚本
    Scripts {
        #[command(subcommand)]
        action: ScriptsAction,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// 输出当前配置
    Info,
    /// 打开配置表单；带参数时直接修改对应配置
    Edit {
        /// 设置脚本目录（`default` 表示 `<当前目录>/scripts`）
        #[arg(long, value_name = "DIR")]
        scripts_dir: Option<String>,
    },
    /// 用默认程序或指定程序打开配置文件
    Open {
        /// 打开配置文件的程序
        #[arg(short, long, value_name = "APP")]
        app_path: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum SpriteAction {
    /// 新建精灵（缺少的参数会交互询问）
    #[command(visible_alias = "cr")]
    Create(CreateSpriteArgs),
    /// 在 Aseprite 中打开精灵
    Open {
        /// 精灵文件；为空时从已配置目录中选择
        #[arg(value_name = "FILES")]
        files: Vec<PathBuf>,
    },
    /// 列出精灵的图层名
    Layers {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// 删除精灵文件
    #[command(visible_alias = "rm")]
    Remove {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        /// 不确认直接删除
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct CreateSpriteArgs {
    /// 精灵名（不含扩展名亦可）
    #[arg(short, long)]
    pub(crate) name: Option<String>,
    /// 宽度（像素）
    #[arg(short, long)]
    pub(crate) width: Option<u32>,
    /// 高度（像素）
    #[arg(long)]
    pub(crate) height: Option<u32>,
    /// 颜色模式
    #[arg(short = 'm', long, value_enum)]
    pub(crate) color_mode: Option<ColorMode>,
    /// 输出目录，默认从已配置的精灵目录中选择
    #[arg(short, long, value_name = "DIR")]
    pub(crate) output_dir: Option<PathBuf>,
    /// 创建后在 Aseprite 中打开
    #[arg(short = 'u', long)]
    pub(crate) open: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PaletteAction {
    /// 通过 OpenAI 生成调色板
    #[command(visible_alias = "cr")]
    Create(CreatePaletteArgs),
    /// 从 Lospec 下载调色板
    Lospec {
        /// 调色板名称（如 "Endesga 32"）
        #[arg(value_name = "NAMES", required = true)]
        names: Vec<String>,
        /// 保存目录，默认第一个调色板目录
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// 文件格式（gpl|hex|png|pal|ase|txt）
        #[arg(short, long, default_value = crate::lospec::DEFAULT_FORMAT)]
        format: String,
    },
    /// 删除调色板文件
    #[command(visible_alias = "rm")]
    Remove {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct CreatePaletteArgs {
    /// 调色板描述（如 "love, robots, batman"）
    #[arg(short, long)]
    pub(crate) description: Option<String>,
    /// 颜色数量，0 表示由模型决定
    #[arg(short = 'n', long)]
    pub(crate) num_colors: Option<usize>,
    /// 使用的模型
    #[arg(short, long)]
    pub(crate) model: Option<String>,
    /// 颜色包含透明度
    #[arg(short, long)]
    pub(crate) transparency: bool,
    /// 保存为 Aseprite 调色板预设
    #[arg(long)]
    pub(crate) preset: bool,
    /// 保存为文件
    #[arg(short, long, value_name = "FILE")]
    pub(crate) output: Option<PathBuf>,
    /// 文件格式
    #[arg(short = 'f', long, value_enum)]
    pub(crate) file_type: Option<PaletteFileType>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// 要导出的精灵
    #[arg(short, long, value_name = "SPRITE")]
    pub(crate) sprite: Option<PathBuf>,
    /// 输出文件，默认与精灵同名、扩展名为导出格式
    #[arg(short, long, value_name = "FILE")]
    pub(crate) output: Option<PathBuf>,
    /// 导出格式（如 png、gif）
    #[arg(short, long)]
    pub(crate) format: Option<String>,
    /// 输出尺寸列表，如 `16x16,32x32`
    #[arg(long, conflicts_with = "scales")]
    pub(crate) sizes: Option<String>,
    /// 整数倍率列表，如 `1,2,4`
    #[arg(long)]
    pub(crate) scales: Option<String>,
    /// 导出的帧：`*`、`N` 或 `A:B`
    #[arg(long)]
    pub(crate) frames: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ScriptsAction {
    /// 将内置脚本写到脚本目录
    Install {
        /// 覆盖已存在的脚本
        #[arg(long)]
        force: bool,
        /// 目标目录，默认配置中的 scripts_dir
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// 列出内置脚本及安装情况
    List,
}
