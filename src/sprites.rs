//! 精灵命令：新建、打开、列出图层、删除

use anyhow::{bail, Context, Result};
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

use crate::{
    aseprite::{
        scripts::{CreateSprite, SpriteLayersNames},
        ColorMode, SPRITE_EXTENSIONS,
    },
    cli::{CreateSpriteArgs, SpriteAction},
    commands::{editor, load_validated, remove_assets},
    config::AppConfig,
    files,
    utils::{print_bold, print_info, print_success},
};

const DEFAULT_SIZE: u32 = 32;
const DEFAULT_NAME: &str = "sprite";
const SIZE_SUGGESTIONS: &[u32] = &[16, 32, 64, 128, 256, 512, 1024];

pub(crate) fn run(action: SpriteAction) -> Result<()> {
    match action {
        SpriteAction::Create(args) => create(args),
        SpriteAction::Open { files } => open(files),
        SpriteAction::Layers { file } => layers(&file),
        SpriteAction::Remove { files, force } => {
            let n = remove_assets(&files, SPRITE_EXTENSIONS, force)?;
            print_info(&format!("共删除 {} 个精灵", n));
            Ok(())
        }
    }
}

/// 新建精灵的完整参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CreateOptions {
    pub(crate) name: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) color_mode: ColorMode,
    pub(crate) output_dir: PathBuf,
    pub(crate) open: bool,
}

impl CreateOptions {
    /// 名称与输出目录都给出时不需要交互，其余缺省值补齐
    pub(crate) fn from_args(args: &CreateSpriteArgs) -> Option<Self> {
        let name = args.name.as_ref().filter(|n| !n.trim().is_empty())?;
        let output_dir = args.output_dir.clone()?;
        Some(Self {
            name: name.trim().to_string(),
            width: args.width.unwrap_or(DEFAULT_SIZE),
            height: args.height.unwrap_or(DEFAULT_SIZE),
            color_mode: args.color_mode.unwrap_or_default(),
            output_dir,
            open: args.open,
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("精灵名不能为空");
        }
        if self.width == 0 {
            bail!("宽度必须大于 0");
        }
        if self.height == 0 {
            bail!("高度必须大于 0");
        }
        if self.output_dir.as_os_str().is_empty() {
            bail!("输出目录不能为空");
        }
        if !self.output_dir.is_dir() {
            bail!("输出目录不存在: {}", self.output_dir.display());
        }
        Ok(())
    }

    /// `<输出目录>/<名称>.aseprite`；名称已带精灵扩展名时保持不变
    pub(crate) fn output_path(&self) -> PathBuf {
        let path = self.output_dir.join(self.name.trim());
        if files::check_extension(&path, SPRITE_EXTENSIONS) {
            path
        } else {
            files::ensure_extension(&path, SPRITE_EXTENSIONS[0])
        }
    }

    fn print_summary(&self) {
        println!();
        print_bold("精灵参数:");
        println!("  名称:     {}", self.name);
        println!("  打开:     {}", self.open);
        println!("  尺寸:     {}x{}", self.width, self.height);
        println!("  颜色模式: {}", self.color_mode);
        println!("  输出路径: {}", self.output_path().display());
    }
}

fn prompt_size(label: &str, current: Option<u32>) -> Result<u32> {
    if let Some(v) = current {
        return Ok(v);
    }
    let mut items: Vec<String> = SIZE_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
    items.push("自定义".to_string());
    let default = SIZE_SUGGESTIONS
        .iter()
        .position(|s| *s == DEFAULT_SIZE)
        .unwrap_or(0);
    let idx = Select::new()
        .with_prompt(label)
        .items(&items)
        .default(default)
        .interact()
        .context("读取输入失败")?;
    match SIZE_SUGGESTIONS.get(idx) {
        Some(v) => Ok(*v),
        None => Input::<u32>::new()
            .with_prompt(label)
            .default(DEFAULT_SIZE)
            .interact_text()
            .context("读取输入失败"),
    }
}

/// 只询问缺少的参数
fn collect_options(args: CreateSpriteArgs, sprite_dirs: &[PathBuf]) -> Result<CreateOptions> {
    let name = match args.name.filter(|n| !n.trim().is_empty()) {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("精灵名")
            .default(DEFAULT_NAME.to_string())
            .interact_text()
            .context("读取输入失败")?,
    };
    let open = args.open
        || Confirm::new()
            .with_prompt("创建后在 Aseprite 中打开？")
            .default(false)
            .interact()
            .context("读取输入失败")?;
    let width = prompt_size("宽度", args.width)?;
    let height = prompt_size("高度", args.height)?;
    let color_mode = match args.color_mode {
        Some(m) => m,
        None => {
            let idx = Select::new()
                .with_prompt("颜色模式")
                .items(&ColorMode::ALL.map(|m| m.as_str()))
                .default(1)
                .interact()
                .context("读取输入失败")?;
            ColorMode::ALL[idx]
        }
    };
    let output_dir = match args.output_dir {
        Some(d) => d,
        None if sprite_dirs.is_empty() => PathBuf::from(
            Input::<String>::new()
                .with_prompt("输出目录")
                .interact_text()
                .context("读取输入失败")?,
        ),
        None => {
            let items: Vec<String> = sprite_dirs.iter().map(|d| d.display().to_string()).collect();
            let idx = Select::new()
                .with_prompt("输出目录")
                .items(&items)
                .default(0)
                .interact()
                .context("读取输入失败")?;
            sprite_dirs[idx].clone()
        }
    };
    Ok(CreateOptions {
        name,
        width,
        height,
        color_mode,
        output_dir,
        open,
    })
}

fn create(args: CreateSpriteArgs) -> Result<()> {
    let Some(cfg) = load_validated()? else { return Ok(()) };
    let opts = match CreateOptions::from_args(&args) {
        Some(o) => o,
        None => collect_options(args, &cfg.sprites_folder_paths)?,
    };
    opts.validate()?;

    let output = opts.output_path();
    if output.exists() {
        bail!("文件已存在: {}", output.display());
    }

    let cli = editor(&cfg)?;
    cli.execute_command(&CreateSprite {
        batch_mode: true,
        open_after_creation: opts.open,
        width: opts.width,
        height: opts.height,
        color_mode: opts.color_mode,
        output_path: output.clone(),
    })?;
    opts.print_summary();
    print_success("精灵创建成功");

    if opts.open {
        cli.open_with_editor(&output)?;
    }
    Ok(())
}

/// 已配置目录中的全部精灵
fn discovered_sprites(cfg: &AppConfig) -> Result<Vec<PathBuf>> {
    let groups = files::find_in_folders(&cfg.sprites_folder_paths, SPRITE_EXTENSIONS, true)?;
    Ok(groups
        .into_iter()
        .flat_map(|(folder, names)| names.into_iter().map(move |n| folder.join(n)))
        .collect())
}

/// 交互选择一个已配置目录中的精灵
pub(crate) fn pick_sprite(cfg: &AppConfig) -> Result<PathBuf> {
    let found = discovered_sprites(cfg)?;
    if found.is_empty() {
        bail!("已配置的目录中没有找到精灵文件");
    }
    let items: Vec<String> = found.iter().map(|p| p.display().to_string()).collect();
    let idx = Select::new()
        .with_prompt("选择精灵")
        .items(&items)
        .default(0)
        .interact()
        .context("读取输入失败")?;
    Ok(found[idx].clone())
}

fn check_sprite(path: &Path) -> Result<()> {
    if !files::file_exists(path) {
        bail!("文件不存在: {}", path.display());
    }
    if !files::check_extension(path, SPRITE_EXTENSIONS) {
        bail!("不是精灵文件: {}", path.display());
    }
    Ok(())
}

fn open(paths: Vec<PathBuf>) -> Result<()> {
    let Some(cfg) = load_validated()? else { return Ok(()) };
    let paths = if paths.is_empty() {
        vec![pick_sprite(&cfg)?]
    } else {
        paths
    };
    for p in &paths {
        check_sprite(p)?;
    }
    let cli = editor(&cfg)?;
    for p in &paths {
        cli.open_with_editor(p)?;
        print_success(&format!("已在 Aseprite 中打开: {}", p.display()));
    }
    Ok(())
}

/// 编辑器输出的图层名（每行一个）
pub(crate) fn parse_layer_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn layers(path: &Path) -> Result<()> {
    check_sprite(path)?;
    let Some(cfg) = load_validated()? else { return Ok(()) };
    let cli = editor(&cfg)?;
    let out = cli.execute_command_output(&SpriteLayersNames {
        sprite_filename: path.to_string_lossy().into_owned(),
    })?;
    let names = parse_layer_names(&out);
    if names.is_empty() {
        print_info("该精灵没有图层");
        return Ok(());
    }
    print_bold(&format!("{} 的图层:", path.display()));
    for (i, n) in names.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, n);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn args_without_name_or_dir_need_prompting() {
        assert!(CreateOptions::from_args(&CreateSpriteArgs::default()).is_none());
        let args = CreateSpriteArgs {
            name: Some("  ".into()),
            output_dir: Some(PathBuf::from("/art")),
            ..CreateSpriteArgs::default()
        };
        assert!(CreateOptions::from_args(&args).is_none());
    }

    #[test]
    fn complete_args_fill_defaults() {
        let args = CreateSpriteArgs {
            name: Some(" hero ".into()),
            output_dir: Some(PathBuf::from("/art")),
            height: Some(16),
            ..CreateSpriteArgs::default()
        };
        let opts = CreateOptions::from_args(&args).unwrap();
        assert_eq!(opts.name, "hero");
        assert_eq!(opts.width, DEFAULT_SIZE);
        assert_eq!(opts.height, 16);
        assert_eq!(opts.color_mode, ColorMode::Rgb);
        assert!(!opts.open);
        assert_eq!(opts.output_path(), PathBuf::from("/art").join("hero.aseprite"));
    }

    #[test]
    fn existing_extension_is_kept() {
        let opts = CreateOptions {
            name: "tiles.aseprite".into(),
            width: 8,
            height: 8,
            color_mode: ColorMode::Indexed,
            output_dir: PathBuf::from("/art"),
            open: false,
        };
        assert_eq!(opts.output_path(), PathBuf::from("/art").join("tiles.aseprite"));

        let dotted = CreateOptions { name: "hero.v2".into(), ..opts.clone() };
        assert_eq!(dotted.output_path(), PathBuf::from("/art").join("hero.v2.aseprite"));
        let short = CreateOptions { name: "hero.ase".into(), ..opts };
        assert_eq!(short.output_path(), PathBuf::from("/art").join("hero.ase"));
    }

    #[test]
    fn validation() {
        let tmp = tempfile::tempdir().unwrap();
        let mut opts = CreateOptions {
            name: "hero".into(),
            width: 32,
            height: 32,
            color_mode: ColorMode::Rgb,
            output_dir: tmp.path().to_path_buf(),
            open: false,
        };
        assert!(opts.validate().is_ok());
        opts.width = 0;
        assert!(opts.validate().is_err());
        opts.width = 32;
        opts.output_dir = tmp.path().join("missing");
        assert!(opts.validate().is_err());
    }

    #[test]
    fn discovers_sprites_across_folders() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let nested = a.join("chars");
        fs::create_dir_all(&nested).unwrap();
        fs::write(a.join("tiles.ase"), "").unwrap();
        fs::write(nested.join("hero.aseprite"), "").unwrap();
        fs::write(nested.join("hero.png"), "").unwrap();
        let cfg = AppConfig {
            sprites_folder_paths: vec![a.clone()],
            ..AppConfig::default()
        };
        let found = discovered_sprites(&cfg).unwrap();
        assert_eq!(found, vec![a.join("tiles.ase"), nested.join("hero.aseprite")]);
    }

    #[test]
    fn layer_names_skip_blank_lines() {
        assert_eq!(parse_layer_names("Background\r\n\n  Outline \n"), vec!["Background", "Outline"]);
        assert!(parse_layer_names("").is_empty());
    }

    #[test]
    fn sprite_checks() {
        let tmp = tempfile::tempdir().unwrap();
        let png = tmp.path().join("hero.png");
        fs::write(&png, "").unwrap();
        assert!(check_sprite(&png).is_err());
        assert!(check_sprite(&tmp.path().join("missing.ase")).is_err());
        let ase = tmp.path().join("hero.ASE");
        fs::write(&ase, "").unwrap();
        assert!(check_sprite(&ase).is_ok());
    }
}
