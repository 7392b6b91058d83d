//! 编辑器脚本命令：每个结构体对应 `scripts/` 下的一个 Lua 脚本

use std::path::PathBuf;

use super::args::{ScriptCommand, ScriptParam};
use super::{ColorFormat, ColorMode};

/// 辅助脚本所在子目录
pub(crate) const HELPERS_FOLDER: &str = "helpers";

/// 新建精灵文件
#[derive(Debug, Clone)]
pub(crate) struct CreateSprite {
    pub(crate) batch_mode: bool,
    /// 不传给脚本；执行成功后在编辑器中打开
    pub(crate) open_after_creation: bool,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) color_mode: ColorMode,
    pub(crate) output_path: PathBuf,
}

impl ScriptCommand for CreateSprite {
    fn script_name(&self) -> PathBuf {
        PathBuf::from("sprite-file.lua")
    }

    fn params(&self) -> Vec<ScriptParam> {
        vec![
            ScriptParam::batch(self.batch_mode),
            ScriptParam::new("OpenAfterCreation", self.open_after_creation).ignore(),
            ScriptParam::new("Width", self.width),
            ScriptParam::new("Height", self.height),
            ScriptParam::new("ColorMode", self.color_mode).key("color-mode"),
            ScriptParam::new("OutputPath", self.output_path.display())
                .key("output-path")
                .quoted(),
        ]
    }
}

/// 导出精灵
#[derive(Debug, Clone, Default)]
pub(crate) struct ExportSprite {
    pub(crate) batch_mode: bool,
    pub(crate) sprite_filename: String,
    pub(crate) output_filename: String,
    pub(crate) format: String,
    /// `WxH` 列表，逗号分隔
    pub(crate) sizes: String,
    /// 整数倍率列表，逗号分隔
    pub(crate) scales: String,
    /// `*`、`N` 或 `A:B`
    pub(crate) frames_included: String,
}

impl ScriptCommand for ExportSprite {
    fn script_name(&self) -> PathBuf {
        PathBuf::from("export-sprite.lua")
    }

    fn params(&self) -> Vec<ScriptParam> {
        vec![
            ScriptParam::batch(self.batch_mode),
            ScriptParam::new("SpriteFilename", &self.sprite_filename)
                .key("sprite-filename")
                .quoted(),
            ScriptParam::new("OutputFilename", &self.output_filename)
                .key("output-filename")
                .quoted(),
            ScriptParam::new("Format", &self.format),
            ScriptParam::new("Sizes", &self.sizes),
            ScriptParam::new("Scales", &self.scales),
            ScriptParam::new("FramesIncluded", &self.frames_included).key("frames-included"),
        ]
    }
}

/// 精灵的文本预览
#[derive(Debug, Clone)]
pub(crate) struct ShowSprite {
    pub(crate) batch_mode: bool,
    pub(crate) sprite_filename: String,
}

impl ScriptCommand for ShowSprite {
    fn script_name(&self) -> PathBuf {
        PathBuf::from("sprite-preview.lua")
    }

    fn params(&self) -> Vec<ScriptParam> {
        vec![
            ScriptParam::batch(self.batch_mode),
            ScriptParam::new("SpriteFilename", &self.sprite_filename)
                .key("sprite-filename")
                .quoted(),
        ]
    }
}

/// 调色板的文本预览
#[derive(Debug, Clone)]
pub(crate) struct ShowPalette {
    pub(crate) batch_mode: bool,
    pub(crate) palette_filename: String,
    pub(crate) output_row_count: usize,
    pub(crate) color_format: ColorFormat,
}

impl ScriptCommand for ShowPalette {
    fn script_name(&self) -> PathBuf {
        PathBuf::from("palette-preview.lua")
    }

    fn params(&self) -> Vec<ScriptParam> {
        vec![
            ScriptParam::batch(self.batch_mode),
            ScriptParam::new("PaletteFilename", &self.palette_filename)
                .key("palette-filename")
                .quoted(),
            ScriptParam::new("OutputRowCount", self.output_row_count).key("output-row-count"),
            ScriptParam::new("ColorFormat", self.color_format).key("color-format"),
        ]
    }
}

/// 将调色板文件保存为编辑器预设
#[derive(Debug, Clone)]
pub(crate) struct SavePalette {
    pub(crate) preset_name: String,
    pub(crate) palette_filename: String,
}

impl ScriptCommand for SavePalette {
    fn script_name(&self) -> PathBuf {
        PathBuf::from("save-palette-as-preset.lua")
    }

    fn params(&self) -> Vec<ScriptParam> {
        vec![
            ScriptParam::new("PresetName", &self.preset_name)
                .key("preset-name")
                .quoted(),
            ScriptParam::new("PaletteFilename", &self.palette_filename).key("palette-filename"),
        ]
    }
}

/// 输出精灵的图层名（每行一个）
#[derive(Debug, Clone)]
pub(crate) struct SpriteLayersNames {
    pub(crate) sprite_filename: String,
}

impl ScriptCommand for SpriteLayersNames {
    fn script_name(&self) -> PathBuf {
        PathBuf::from(HELPERS_FOLDER).join("sprite-layers-names.lua")
    }

    fn params(&self) -> Vec<ScriptParam> {
        vec![ScriptParam::new("SpriteFilename", &self.sprite_filename)
            .key("sprite-filename")
            .quoted()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sprite_skips_open_flag() {
        let cmd = CreateSprite {
            batch_mode: true,
            open_after_creation: true,
            width: 64,
            height: 48,
            color_mode: ColorMode::Indexed,
            output_path: PathBuf::from("/art/hero.aseprite"),
        };
        assert_eq!(cmd.script_name(), PathBuf::from("sprite-file.lua"));
        assert_eq!(
            cmd.args(),
            vec![
                "-b",
                "--script-param",
                "width=64",
                "--script-param",
                "height=48",
                "--script-param",
                "color-mode=indexed",
                "--script-param",
                "output-path=/art/hero.aseprite",
            ]
        );
    }

    #[test]
    fn export_sprite_keeps_empty_optional_values() {
        let cmd = ExportSprite {
            batch_mode: true,
            sprite_filename: "/art/hero.aseprite".into(),
            output_filename: "/art/hero.png".into(),
            format: "png".into(),
            scales: "1,2".into(),
            frames_included: "*".into(),
            ..Default::default()
        };
        let args = cmd.args();
        assert!(args.contains(&"sizes=".to_string()));
        assert!(args.contains(&"scales=1,2".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("frames-included=*"));
    }

    #[test]
    fn show_palette_uses_renamed_keys() {
        let cmd = ShowPalette {
            batch_mode: true,
            palette_filename: "/pal/db32.gpl".into(),
            output_row_count: 8,
            color_format: ColorFormat::Rgb,
        };
        assert_eq!(
            cmd.args(),
            vec![
                "-b",
                "--script-param",
                "palette-filename=/pal/db32.gpl",
                "--script-param",
                "output-row-count=8",
                "--script-param",
                "color-format=rgb",
            ]
        );
    }

    #[test]
    fn save_palette_has_no_batch_flag() {
        let cmd = SavePalette {
            preset_name: "AI Palette: sunset".into(),
            palette_filename: "/pal/sunset.gpl".into(),
        };
        assert_eq!(
            cmd.args(),
            vec![
                "--script-param",
                "preset-name=AI Palette: sunset",
                "--script-param",
                "palette-filename=/pal/sunset.gpl",
            ]
        );
    }

    #[test]
    fn helper_scripts_live_in_subfolder() {
        let cmd = SpriteLayersNames {
            sprite_filename: "a.ase".into(),
        };
        assert_eq!(cmd.script_name(), PathBuf::from("helpers").join("sprite-layers-names.lua"));
        assert_eq!(cmd.args(), vec!["--script-param", "sprite-filename=a.ase"]);
    }
}
