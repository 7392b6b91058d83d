//! 子命令分发
//! - 参数优先级：CLI > 环境变量 > 配置 > 默认值
//! - 配置、列表、预览、脚本等简单命令在此实现
//! - 精灵、调色板、导出分别交给 `sprites` / `palettes` / `export`

use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    aseprite::{
        preview::{PreviewGenerator, PreviewParams},
        AsepriteCli, ColorFormat, LOADABLE_PALETTE_EXTENSIONS, PALETTE_EXTENSIONS, SPRITE_EXTENSIONS,
    },
    cli::{Cli, Command, ConfigAction, ScriptsAction},
    config::{self, AppConfig, ConfigError},
    export, files, init, palettes, sprites,
    tui::{
        self,
        browser::Browser,
        carousel::AssetSource,
        config_form::ConfigForm,
        info::AssetKind,
    },
    utils::{env_bool_truthy, print_bold, print_error, print_info, print_success, print_warn},
};

/// 设为真值时浏览器不生成预览
const ENV_NO_PREVIEW: &str = "ASEPRITE_ASSETS_NO_PREVIEW";

/// 运行指定的子命令
pub(crate) fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        print_banner();
        return Ok(());
    };
    match command {
        Command::Config { action } => run_config(action),
        Command::Sprite { action } => sprites::run(action),
        Command::Palette { action } => palettes::run(action),
        Command::Export(args) => export::run(args),
        Command::List {
            sprites,
            palettes,
            recursive,
        } => run_list(sprites, palettes, recursive),
        Command::Show {
            filename,
            color_format,
            output_row_count,
            palette_preview,
        } => run_show(&filename, &color_format, output_row_count, palette_preview),
        Command::Scripts { action } => run_scripts(action),
    }
}

fn print_banner() {
    print_bold(&format!("🎨 aseprite-assets {}", env!("CARGO_PKG_VERSION")));
    println!("通过 Aseprite 脚本管理精灵与调色板素材");
    println!();
    println!("  aseprite-assets config edit     编辑配置");
    println!("  aseprite-assets list -s         浏览精灵");
    println!("  aseprite-assets list -p         浏览调色板");
    println!("  aseprite-assets --help          查看全部命令");
}

/// 加载并校验配置；无效时列出问题并打开配置表单，返回 None
pub(crate) fn load_validated() -> Result<Option<AppConfig>> {
    let loaded = config::load()?;
    match loaded.config.validate() {
        Ok(()) => Ok(Some(loaded.config)),
        Err(ConfigError::Invalid(problems)) => {
            print_warn(&format!("配置无效（{}）:", loaded.path.display()));
            for p in &problems {
                print_error(p);
            }
            print_info("请在配置表单中补全配置后重试");
            edit_in_form()?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// 构造编辑器调用器并确认编辑器可以运行
pub(crate) fn editor(cfg: &AppConfig) -> Result<AsepriteCli> {
    if !cfg.scripts_dir.is_dir() {
        bail!(
            "脚本目录不存在: {}\n运行 `aseprite-assets scripts install` 安装内置脚本",
            cfg.scripts_dir.display()
        );
    }
    let cli = AsepriteCli::from_config(cfg);
    let version = cli.check_prerequisites()?;
    debug!("Aseprite 版本: {}", version.trim());
    Ok(cli)
}

fn edit_in_form() -> Result<()> {
    let mut form = ConfigForm::load()?;
    tui::run(&mut form)?;
    if form.saved() {
        print_success("配置已保存");
    }
    Ok(())
}

fn run_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Info => {
            println!("{}", config::info()?);
        }
        ConfigAction::Edit { scripts_dir: Some(dir) } => {
            if dir.trim() == "default" {
                config::set_default_scripts_dir()?;
            } else {
                let path = PathBuf::from(dir.trim());
                if !path.is_absolute() {
                    bail!("脚本目录必须是绝对路径: {}", path.display());
                }
                config::set_scripts_dir(&path)?;
            }
            print_success("脚本目录已更新");
        }
        ConfigAction::Edit { scripts_dir: None } => edit_in_form()?,
        ConfigAction::Open { app_path } => {
            // load 会在文件缺失时写出默认配置
            let path = config::load()?.path;
            println!("{}", path.display());
            match app_path {
                Some(app) => files::open_with(&path, &app)?,
                None => files::open_default(&path)?,
            }
        }
    }
    Ok(())
}

/// 浏览器标题
pub(crate) fn list_title(kind: AssetKind, recursive: bool) -> String {
    let mut title = match kind {
        AssetKind::Sprite => "🖌️ 精灵列表".to_string(),
        AssetKind::Palette => "🎨 调色板列表".to_string(),
    };
    if recursive {
        title.push_str(" | 🔍 递归");
    }
    title
}

fn list_kind(sprites: bool, palettes: bool) -> Result<AssetKind> {
    match (sprites, palettes) {
        (true, true) => bail!("不能同时浏览精灵和调色板"),
        (true, false) => Ok(AssetKind::Sprite),
        (false, true) => Ok(AssetKind::Palette),
        (false, false) => bail!("请指定 --sprites 或 --palettes"),
    }
}

/// 在已配置目录中查找素材，组装为轮播数据
pub(crate) fn asset_sources(cfg: &AppConfig, kind: AssetKind, recursive: bool) -> Result<Vec<AssetSource>> {
    let (folders, exts) = match kind {
        AssetKind::Sprite => (&cfg.sprites_folder_paths, SPRITE_EXTENSIONS),
        AssetKind::Palette => (&cfg.palettes_folder_paths, PALETTE_EXTENSIONS),
    };
    if folders.is_empty() {
        bail!("未配置任何{}目录，运行 `aseprite-assets config edit` 添加", kind.label());
    }
    let found = files::find_in_folders(folders, exts, recursive)?;
    Ok(found
        .into_iter()
        .map(|(folder, names)| AssetSource::new(folder, names))
        .collect())
}

fn run_list(sprites: bool, palettes: bool, recursive: bool) -> Result<()> {
    let kind = list_kind(sprites, palettes)?;
    let Some(cfg) = load_validated()? else { return Ok(()) };
    let sources = asset_sources(&cfg, kind, recursive)?;
    if sources.is_empty() {
        print_info(&format!("已配置的目录中没有找到{}文件", kind.label()));
        return Ok(());
    }
    let cli = editor(&cfg)?;
    let preview = !env_bool_truthy(ENV_NO_PREVIEW).unwrap_or(false);
    let mut browser = Browser::from_sources(list_title(kind, recursive), kind, sources, cli, preview)?;
    tui::run(&mut browser)
}

/// 预览参数：文件必须存在且可被编辑器加载
pub(crate) fn show_params(
    filename: &Path,
    color_format: &str,
    output_row_count: usize,
    palette_preview: bool,
) -> Result<PreviewParams> {
    if !files::file_exists(filename) || !files::check_extension(filename, LOADABLE_PALETTE_EXTENSIONS) {
        bail!("文件不存在或类型不受支持: {}", filename.display());
    }
    let mut params = PreviewParams::new(filename.to_string_lossy().into_owned());
    params.color_format = ColorFormat::from_str_lossy(color_format);
    params.colors_per_row = output_row_count.max(1);
    params.palette_preview = palette_preview;
    Ok(params)
}

fn run_show(filename: &Path, color_format: &str, output_row_count: usize, palette_preview: bool) -> Result<()> {
    let params = show_params(filename, color_format, output_row_count, palette_preview)?;
    let Some(cfg) = load_validated()? else { return Ok(()) };
    let cli = editor(&cfg)?;
    let output = PreviewGenerator::new(&cli).generate(&params)?;
    if output.trim().is_empty() {
        print_info("抱歉，该文件没有可用的预览");
    } else {
        println!("{}", output.trim_end());
    }
    Ok(())
}

fn run_scripts(action: ScriptsAction) -> Result<()> {
    match action {
        ScriptsAction::Install { force, dir } => {
            let target = match dir {
                Some(d) => d,
                None => config::load()?.config.scripts_dir,
            };
            let report = init::install_scripts(&target, force)?;
            for p in &report.written {
                println!("写入: {}", p.display());
            }
            for p in &report.skipped {
                println!("跳过: {} 已存在，使用 --force 可覆盖", p.display());
            }
            print_success(&format!(
                "已安装 {} 个脚本到 {}",
                report.written.len(),
                target.display()
            ));
        }
        ScriptsAction::List => {
            let dir = config::load()?.config.scripts_dir;
            print_bold(&format!("脚本目录: {}", dir.display()));
            for (rel, installed) in init::list_scripts(&dir) {
                let mark = if installed { "✅" } else { "❌" };
                println!("  {} {}", mark, rel.display());
            }
        }
    }
    Ok(())
}

/// 逐个删除素材文件：不存在或扩展名不符的跳过；非 force 时逐个确认
pub(crate) fn remove_assets(paths: &[PathBuf], exts: &[&str], force: bool) -> Result<usize> {
    let mut removed = 0;
    for path in paths {
        if !files::file_exists(path) {
            print_error(&format!("文件不存在: {}", path.display()));
            continue;
        }
        if !files::check_extension(path, exts) {
            print_error(&format!("不支持的文件类型: {}", path.display()));
            continue;
        }
        if !force {
            let ok = Confirm::new()
                .with_prompt(format!("删除 {}?", path.display()))
                .default(false)
                .interact()
                .context("读取确认输入失败")?;
            if !ok {
                print_info(&format!("已跳过: {}", path.display()));
                continue;
            }
        }
        files::remove_file(path)?;
        print_success(&format!("已删除: {}", path.display()));
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn titles() {
        assert_eq!(list_title(AssetKind::Sprite, false), "🖌️ 精灵列表");
        assert_eq!(list_title(AssetKind::Palette, true), "🎨 调色板列表 | 🔍 递归");
    }

    #[test]
    fn exactly_one_list_kind() {
        assert!(list_kind(true, true).is_err());
        assert!(list_kind(false, false).is_err());
        assert_eq!(list_kind(true, false).unwrap(), AssetKind::Sprite);
        assert_eq!(list_kind(false, true).unwrap(), AssetKind::Palette);
    }

    fn cfg_with(sprites: Vec<PathBuf>, palettes: Vec<PathBuf>) -> AppConfig {
        AppConfig {
            sprites_folder_paths: sprites,
            palettes_folder_paths: palettes,
            ..AppConfig::default()
        }
    }

    #[test]
    fn flat_sources_skip_empty_folders() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("hero.aseprite"), "").unwrap();
        fs::write(a.join("notes.txt"), "").unwrap();
        fs::write(b.join("db32.gpl"), "").unwrap();

        let cfg = cfg_with(vec![a.clone(), b.clone()], vec![b.clone()]);
        let sprites = asset_sources(&cfg, AssetKind::Sprite, false).unwrap();
        assert_eq!(sprites, vec![AssetSource::new(a, vec!["hero.aseprite".into()])]);
        let palettes = asset_sources(&cfg, AssetKind::Palette, false).unwrap();
        assert_eq!(palettes, vec![AssetSource::new(b, vec!["db32.gpl".into()])]);
    }

    #[test]
    fn recursive_sources_group_by_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("art");
        let inner = root.join("chars");
        fs::create_dir_all(&inner).unwrap();
        fs::write(root.join("tiles.ase"), "").unwrap();
        fs::write(inner.join("hero.aseprite"), "").unwrap();

        let cfg = cfg_with(vec![root.clone()], vec![]);
        let sources = asset_sources(&cfg, AssetKind::Sprite, true).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].folder, root);
        assert_eq!(sources[1].folder, inner);
    }

    #[test]
    fn missing_or_unconfigured_folders_fail() {
        let cfg = cfg_with(vec![], vec![]);
        assert!(asset_sources(&cfg, AssetKind::Palette, false).is_err());
        let cfg = cfg_with(vec![PathBuf::from("/definitely/not/here")], vec![]);
        assert!(asset_sources(&cfg, AssetKind::Sprite, false).is_err());
    }

    #[test]
    fn show_rejects_missing_and_unknown_files() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(show_params(&tmp.path().join("nope.gpl"), "hex", 5, false).is_err());
        let txt = tmp.path().join("readme.txt");
        fs::write(&txt, "").unwrap();
        assert!(show_params(&txt, "hex", 5, false).is_err());

        let pal = tmp.path().join("db32.gpl");
        fs::write(&pal, "").unwrap();
        let params = show_params(&pal, "RGB", 0, true).unwrap();
        assert_eq!(params.color_format, ColorFormat::Rgb);
        assert_eq!(params.colors_per_row, 1);
        assert!(params.palette_preview);
    }

    #[test]
    fn forced_removal_skips_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        let pal = tmp.path().join("old.gpl");
        let other = tmp.path().join("keep.txt");
        fs::write(&pal, "").unwrap();
        fs::write(&other, "").unwrap();
        let removed = remove_assets(
            &[pal.clone(), other.clone(), tmp.path().join("missing.gpl")],
            PALETTE_EXTENSIONS,
            true,
        )
        .unwrap();
        assert_eq!(removed, 1);
        assert!(!pal.exists());
        assert!(other.exists());
    }
}
