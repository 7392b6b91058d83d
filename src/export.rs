//! 导出命令：参数校验、交互补全、调用 `export-sprite.lua`

use anyhow::{bail, Context, Result};
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

use crate::{
    aseprite::{export_extensions, scripts::ExportSprite, SPRITE_EXTENSIONS},
    cli::ExportArgs,
    commands::{editor, load_validated},
    config::AppConfig,
    files,
    sprites::pick_sprite,
    utils::print_success,
};

const DEFAULT_FORMAT: &str = "png";
const ALL_FRAMES: &str = "*";

/// `1,2,3`：逗号分隔的正整数；返回去掉空白后的规范形式
pub(crate) fn normalize_scales(input: &str) -> Result<String> {
    if input.trim().is_empty() {
        bail!("倍率不能为空");
    }
    let mut out = Vec::new();
    for item in input.split(',') {
        match item.trim().parse::<u32>() {
            Ok(n) if n > 0 => out.push(n.to_string()),
            _ => bail!("倍率格式无效: {:?}，应为整数列表（如 1,2,3）", item.trim()),
        }
    }
    Ok(out.join(","))
}

/// `64x64,128x128`：逗号分隔的 `宽x高`；返回 `WxH,WxH` 形式
pub(crate) fn normalize_sizes(input: &str) -> Result<String> {
    if input.trim().is_empty() {
        bail!("尺寸不能为空");
    }
    let mut out = Vec::new();
    for item in input.split(',') {
        let item = item.trim();
        let parsed = item
            .split_once('x')
            .map(|(w, h)| (w.trim().parse::<u32>(), h.trim().parse::<u32>()));
        match parsed {
            Some((Ok(w), Ok(h))) if w > 0 && h > 0 => out.push(format!("{}x{}", w, h)),
            _ => bail!("尺寸格式无效: {:?}，应为 宽x高 列表（如 64x64,128x128）", item),
        }
    }
    Ok(out.join(","))
}

/// `*`、`N` 或 `A:B`（1 ≤ A ≤ B），帧号从 1 开始
pub(crate) fn normalize_frames(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        bail!("帧范围不能为空");
    }
    if input == ALL_FRAMES {
        return Ok(ALL_FRAMES.to_string());
    }
    if let Ok(n) = input.parse::<u32>() {
        if n == 0 {
            bail!("帧号从 1 开始");
        }
        return Ok(n.to_string());
    }
    let Some((a, b)) = input.split_once(':') else {
        bail!("帧范围格式无效: {}", input);
    };
    let start: u32 = a.trim().parse().with_context(|| format!("起始帧无效: {}", a))?;
    let end: u32 = b.trim().parse().with_context(|| format!("结束帧无效: {}", b))?;
    if start == 0 {
        bail!("帧号从 1 开始");
    }
    if start > end {
        bail!("起始帧 {} 大于结束帧 {}", start, end);
    }
    Ok(format!("{}:{}", start, end))
}

/// 去掉前导 `.` 并转小写；不支持的格式报错
pub(crate) fn normalize_format(format: &str) -> Result<String> {
    let f = format.trim().trim_start_matches('.').to_lowercase();
    if f.is_empty() || !export_extensions().contains(&files::pref_extension(&f).as_str()) {
        bail!("不支持的导出格式: {}", format);
    }
    Ok(f)
}

/// 已补全、校验过的导出参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportPlan {
    pub(crate) sprite: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) format: String,
    pub(crate) sizes: String,
    pub(crate) scales: String,
    pub(crate) frames: String,
}

impl ExportPlan {
    /// 输出缺省为精灵路径换成导出格式的扩展名；格式缺省取自输出文件扩展名
    pub(crate) fn resolve(
        sprite: &Path,
        output: Option<&Path>,
        format: Option<&str>,
        sizes: Option<&str>,
        scales: Option<&str>,
        frames: Option<&str>,
    ) -> Result<Self> {
        if !files::file_exists(sprite) || !files::check_extension(sprite, SPRITE_EXTENSIONS) {
            bail!("无效的精灵文件: {}", sprite.display());
        }
        let sizes = sizes.map(str::trim).filter(|s| !s.is_empty()).unwrap_or_default();
        let scales = scales.map(str::trim).filter(|s| !s.is_empty()).unwrap_or_default();
        if !sizes.is_empty() && !scales.is_empty() {
            bail!("不能同时指定 --sizes 和 --scales");
        }
        let sizes = if sizes.is_empty() { String::new() } else { normalize_sizes(sizes)? };
        let scales = if scales.is_empty() { String::new() } else { normalize_scales(scales)? };
        let frames = normalize_frames(frames.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(ALL_FRAMES))?;

        let (output, format) = match (output, format) {
            (Some(out), Some(fmt)) => (out.to_path_buf(), normalize_format(fmt)?),
            (Some(out), None) => {
                let ext = out
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let fmt = normalize_format(&ext)
                    .with_context(|| format!("无法从输出文件推断格式: {}", out.display()))?;
                (out.to_path_buf(), fmt)
            }
            (None, fmt) => {
                let fmt = normalize_format(fmt.unwrap_or(DEFAULT_FORMAT))?;
                (files::change_extension(sprite, &fmt), fmt)
            }
        };

        Ok(Self {
            sprite: sprite.to_path_buf(),
            output,
            format,
            sizes,
            scales,
            frames,
        })
    }

    pub(crate) fn command(&self) -> ExportSprite {
        ExportSprite {
            batch_mode: true,
            sprite_filename: self.sprite.to_string_lossy().into_owned(),
            output_filename: self.output.to_string_lossy().into_owned(),
            format: self.format.clone(),
            sizes: self.sizes.clone(),
            scales: self.scales.clone(),
            frames_included: self.frames.clone(),
        }
    }
}

fn prompt_validated(prompt: &str, default: &str, normalize: fn(&str) -> Result<String>) -> Result<String> {
    let raw = Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .validate_with(move |s: &String| normalize(s).map(|_| ()).map_err(|e| e.to_string()))
        .interact_text()
        .context("读取输入失败")?;
    normalize(&raw)
}

/// 交互补全缺少的参数
fn collect(mut args: ExportArgs, cfg: &AppConfig) -> Result<ExportArgs> {
    if args.sprite.is_none() {
        args.sprite = Some(pick_sprite(cfg)?);
    }
    if args.format.is_none() && args.output.is_none() {
        let formats: Vec<String> = export_extensions()
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
        let default = formats.iter().position(|f| f == DEFAULT_FORMAT).unwrap_or(0);
        let idx = Select::new()
            .with_prompt("导出格式")
            .items(&formats)
            .default(default)
            .interact()
            .context("读取输入失败")?;
        args.format = Some(formats[idx].clone());
    }
    if args.frames.is_none() {
        args.frames = Some(prompt_validated("导出的帧（*、N 或 A:B）", ALL_FRAMES, normalize_frames)?);
    }
    if args.sizes.is_none() && args.scales.is_none() {
        let keep = Confirm::new()
            .with_prompt("保持原尺寸导出？（否则选择倍率或尺寸）")
            .default(true)
            .interact()
            .context("读取输入失败")?;
        if !keep {
            let mode = Select::new()
                .with_prompt("缩放方式")
                .items(&["倍率", "尺寸"])
                .default(0)
                .interact()
                .context("读取输入失败")?;
            if mode == 0 {
                args.scales = Some(prompt_validated("倍率（如 1,2,3）", "1", normalize_scales)?);
            } else {
                args.sizes = Some(prompt_validated("尺寸（如 64x64,128x128）", "64x64", normalize_sizes)?);
            }
        }
    }
    Ok(args)
}

pub(crate) fn run(args: ExportArgs) -> Result<()> {
    let Some(cfg) = load_validated()? else { return Ok(()) };
    let args = if args.sprite.is_none() {
        collect(args, &cfg)?
    } else {
        args
    };
    let sprite = args.sprite.clone().unwrap_or_default();
    let plan = ExportPlan::resolve(
        &sprite,
        args.output.as_deref(),
        args.format.as_deref(),
        args.sizes.as_deref(),
        args.scales.as_deref(),
        args.frames.as_deref(),
    )?;
    files::ensure_parent_dir(&plan.output)?;

    let cli = editor(&cfg)?;
    let out = cli.execute_command_output(&plan.command())?;
    for line in out.lines().filter(|l| !l.trim().is_empty()) {
        println!("  {}", line);
    }
    print_success(&format!(
        "已导出 {} ➡ {}",
        plan.sprite.display(),
        plan.output.display()
    ));
    Ok(())
}
