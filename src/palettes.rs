//! 调色板命令：
//! - `create`：OpenAI 生成，保存为预设和/或文件
//! - `lospec`：从 Lospec 下载
//! - `remove`：删除调色板文件

use anyhow::{bail, Context, Result};
use dialoguer::{Confirm, Input, Select};
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{
    aseprite::{scripts::SavePalette, PALETTE_EXTENSIONS},
    cli::{CreatePaletteArgs, PaletteAction},
    commands::{editor, load_validated, remove_assets},
    config, files,
    lospec,
    openai::{GenerationParams, OpenAiClient, MODELS},
    palette::{self, Palette, PaletteFileType},
    utils::{env_opt_string, print_info, print_success, spinner},
};

const DEFAULT_OUTPUT: &str = "ai-palette";
const DEFAULT_NUM_COLORS: usize = 8;
const ENV_MODEL: &str = "ASEPRITE_ASSETS_OPENAI_MODEL";

pub(crate) fn run(action: PaletteAction) -> Result<()> {
    match action {
        PaletteAction::Create(args) => create(args),
        PaletteAction::Lospec { names, dir, format } => import_from_lospec(&names, dir, &format),
        PaletteAction::Remove { files, force } => {
            let n = remove_assets(&files, PALETTE_EXTENSIONS, force)?;
            print_info(&format!("共删除 {} 个调色板", n));
            Ok(())
        }
    }
}

/// 生成结果的保存方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SaveTarget {
    pub(crate) preset: bool,
    pub(crate) file: Option<(PathBuf, PaletteFileType)>,
}

/// 未指定格式时按扩展名推断（`.hex` 之外都按 GPL），并补全扩展名
pub(crate) fn output_file(path: &Path, file_type: Option<PaletteFileType>) -> (PathBuf, PaletteFileType) {
    let kind = file_type.unwrap_or_else(|| {
        if files::check_extension(path, &[PaletteFileType::Hex.extension()]) {
            PaletteFileType::Hex
        } else {
            PaletteFileType::Gpl
        }
    });
    let known = [PaletteFileType::Gpl.extension(), PaletteFileType::Hex.extension()];
    let path = if files::check_extension(path, &known) {
        files::change_extension(path, kind.extension())
    } else {
        files::ensure_extension(path, kind.extension())
    };
    (path, kind)
}

/// 预设名与调色板名
pub(crate) fn preset_name(description: &str) -> String {
    format!("AI Palette: {}", description.trim())
}

impl SaveTarget {
    /// 由命令行参数决定；都未指定时保存为当前目录下的 GPL 文件
    pub(crate) fn from_args(args: &CreatePaletteArgs) -> Self {
        let file = match &args.output {
            Some(p) => Some(output_file(p, args.file_type)),
            None if args.preset => None,
            None => Some(output_file(
                Path::new(DEFAULT_OUTPUT),
                Some(args.file_type.unwrap_or_default()),
            )),
        };
        Self {
            preset: args.preset,
            file,
        }
    }
}

fn prompt_save_target(file_type: Option<PaletteFileType>) -> Result<SaveTarget> {
    let choices = ["保存为 Aseprite 预设", "保存为文件", "预设与文件"];
    let idx = Select::new()
        .with_prompt("保存方式")
        .items(&choices)
        .default(0)
        .interact()
        .context("读取输入失败")?;
    let preset = idx != 1;
    let file = if idx == 0 {
        None
    } else {
        let kind = match file_type {
            Some(k) => k,
            None => {
                let names: Vec<&str> = PaletteFileType::ALL.iter().map(|k| k.extension()).collect();
                let i = Select::new()
                    .with_prompt("文件格式")
                    .items(&names)
                    .default(0)
                    .interact()
                    .context("读取输入失败")?;
                PaletteFileType::ALL[i]
            }
        };
        let raw: String = Input::new()
            .with_prompt("输出文件")
            .default(format!("{}{}", DEFAULT_OUTPUT, kind.extension()))
            .interact_text()
            .context("读取输入失败")?;
        Some(output_file(Path::new(raw.trim()), Some(kind)))
    };
    Ok(SaveTarget { preset, file })
}

/// 缺少描述时进入交互模式，其余参数一并询问
fn collect_generation(args: &CreatePaletteArgs) -> Result<(GenerationParams, SaveTarget)> {
    let default_model = args
        .model
        .clone()
        .or_else(|| env_opt_string(ENV_MODEL))
        .unwrap_or_else(|| MODELS[0].to_string());

    if let Some(desc) = args.description.as_ref().filter(|d| !d.trim().is_empty()) {
        let params = GenerationParams {
            description: desc.trim().to_string(),
            num_colors: args.num_colors.unwrap_or(0),
            model: default_model,
            transparency: args.transparency,
        };
        return Ok((params, SaveTarget::from_args(args)));
    }

    let description: String = Input::new()
        .with_prompt("调色板描述")
        .validate_with(|s: &String| {
            if s.trim().is_empty() {
                Err("描述不能为空")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("读取输入失败")?;
    let num_colors = match args.num_colors {
        Some(n) => n,
        None => Input::<usize>::new()
            .with_prompt("颜色数量（0 表示不限）")
            .default(DEFAULT_NUM_COLORS)
            .interact_text()
            .context("读取输入失败")?,
    };
    let model = match &args.model {
        Some(m) => m.clone(),
        None => {
            let default = MODELS.iter().position(|m| *m == default_model).unwrap_or(0);
            let idx = Select::new()
                .with_prompt("模型")
                .items(MODELS)
                .default(default)
                .interact()
                .context("读取输入失败")?;
            MODELS[idx].to_string()
        }
    };
    let transparency = args.transparency
        || Confirm::new()
            .with_prompt("颜色包含透明度？")
            .default(false)
            .interact()
            .context("读取输入失败")?;
    let target = if args.preset || args.output.is_some() {
        SaveTarget::from_args(args)
    } else {
        prompt_save_target(args.file_type)?
    };
    Ok((
        GenerationParams {
            description: description.trim().to_string(),
            num_colors,
            model,
            transparency,
        },
        target,
    ))
}

fn create(args: CreatePaletteArgs) -> Result<()> {
    let (params, target) = collect_generation(&args)?;

    // 预设需要编辑器，先校验配置
    let cfg = if target.preset {
        match load_validated()? {
            Some(c) => c,
            None => return Ok(()),
        }
    } else {
        config::load()?.config
    };
    let client = OpenAiClient::new(&cfg.open_ai)?;

    let progress = spinner(format!("正在通过 {} 生成调色板...", params.model));
    let res = client.generate_colors(&params);
    progress.finish_and_clear();
    let colors = res?;

    let pal = Palette {
        name: preset_name(&params.description),
        colors,
    };
    println!("{}", palette::render_swatches(&pal.colors, DEFAULT_NUM_COLORS));

    if let Some((path, kind)) = &target.file {
        files::ensure_parent_dir(path)?;
        palette::write_palette(&pal, path, *kind)?;
        print_success(&format!("已生成调色板 {}（{} 种颜色）", path.display(), pal.colors.len()));
    }

    if target.preset {
        let cli = editor(&cfg)?;
        // 没有输出文件时写一个临时 GPL 供脚本读取
        let (source, temporary) = match &target.file {
            Some((path, PaletteFileType::Gpl)) => (path.clone(), false),
            _ => {
                let tmp = env::temp_dir().join(format!("aseprite-assets-{}.gpl", std::process::id()));
                palette::write_gpl(&pal, &tmp)?;
                (tmp, true)
            }
        };
        let res = cli.execute_command(&SavePalette {
            preset_name: pal.name.clone(),
            palette_filename: source.to_string_lossy().into_owned(),
        });
        if temporary {
            let _ = std::fs::remove_file(&source);
        }
        res?;
        print_success(&format!("已保存为 Aseprite 预设: {}", pal.name));
    }
    Ok(())
}

/// 保存目录：命令行参数优先，其次第一个调色板目录
pub(crate) fn lospec_destination(dir: Option<PathBuf>, cfg: &config::AppConfig) -> Result<PathBuf> {
    match dir.or_else(|| cfg.palettes_folder_paths.first().cloned()) {
        Some(d) => Ok(d),
        None => bail!("未配置调色板目录，请使用 --dir 指定保存目录"),
    }
}

fn import_from_lospec(names: &[String], dir: Option<PathBuf>, format: &str) -> Result<()> {
    lospec::check_format(format)?;
    let cfg = config::load()?.config;
    let dest = lospec_destination(dir, &cfg)?;
    let saved = lospec::import_palettes(names, &dest, format)?;
    print_info(&format!("共下载 {}/{} 个调色板", saved.len(), names.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn default_target_is_gpl_file() {
        let target = SaveTarget::from_args(&CreatePaletteArgs::default());
        assert!(!target.preset);
        assert_eq!(
            target.file,
            Some((PathBuf::from("ai-palette.gpl"), PaletteFileType::Gpl))
        );
    }

    #[test]
    fn preset_only() {
        let args = CreatePaletteArgs {
            preset: true,
            ..CreatePaletteArgs::default()
        };
        assert_eq!(
            SaveTarget::from_args(&args),
            SaveTarget {
                preset: true,
                file: None
            }
        );
    }

    #[test]
    fn preset_and_file() {
        let args = CreatePaletteArgs {
            preset: true,
            output: Some(PathBuf::from("out/sunset.hex")),
            ..CreatePaletteArgs::default()
        };
        let target = SaveTarget::from_args(&args);
        assert!(target.preset);
        assert_eq!(
            target.file,
            Some((PathBuf::from("out/sunset.hex"), PaletteFileType::Hex))
        );
    }

    #[test]
    fn output_extension_follows_file_type() {
        assert_eq!(
            output_file(Path::new("sunset"), None),
            (PathBuf::from("sunset.gpl"), PaletteFileType::Gpl)
        );
        assert_eq!(
            output_file(Path::new("sunset.gpl"), Some(PaletteFileType::Hex)),
            (PathBuf::from("sunset.hex"), PaletteFileType::Hex)
        );
        assert_eq!(
            output_file(Path::new("sunset.HEX"), None).1,
            PaletteFileType::Hex
        );
        assert_eq!(
            output_file(Path::new("pals.d/sunset.v2"), None).0,
            PathBuf::from("pals.d/sunset.v2.gpl")
        );
    }

    #[test]
    fn preset_names() {
        assert_eq!(preset_name(" ocean at dusk "), "AI Palette: ocean at dusk");
    }

    #[test]
    fn lospec_destination_prefers_flag() {
        let cfg = AppConfig {
            palettes_folder_paths: vec![PathBuf::from("/pal")],
            ..AppConfig::default()
        };
        assert_eq!(
            lospec_destination(Some(PathBuf::from("/x")), &cfg).unwrap(),
            PathBuf::from("/x")
        );
        assert_eq!(lospec_destination(None, &cfg).unwrap(), PathBuf::from("/pal"));
        assert!(lospec_destination(None, &AppConfig::default()).is_err());
    }

    #[test]
    fn flags_skip_prompts() {
        let args = CreatePaletteArgs {
            description: Some("forest".into()),
            num_colors: Some(4),
            model: Some("gpt-4o".into()),
            ..CreatePaletteArgs::default()
        };
        let (params, target) = collect_generation(&args).unwrap();
        assert_eq!(params.description, "forest");
        assert_eq!(params.num_colors, 4);
        assert_eq!(params.model, "gpt-4o");
        assert!(!params.transparency);
        assert!(target.file.is_some());
    }
}
