//! 预览生成：按文件类型选择精灵或调色板预览脚本

use super::{
    args::ScriptCommand,
    scripts::{ShowPalette, ShowSprite},
    AsepriteCli, AsepriteError, ColorFormat, LOADABLE_PALETTE_EXTENSIONS, SPRITE_EXTENSIONS,
};
use crate::files::check_extension;

/// 调色板预览默认每行颜色数
pub(crate) const DEFAULT_COLORS_PER_ROW: usize = 8;

#[derive(Debug, Clone)]
pub(crate) struct PreviewParams {
    pub(crate) filename: String,
    pub(crate) color_format: ColorFormat,
    pub(crate) colors_per_row: usize,
    /// 强制按调色板预览（例如从精灵中读取调色板）
    pub(crate) palette_preview: bool,
}

impl PreviewParams {
    pub(crate) fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            color_format: ColorFormat::Hex,
            colors_per_row: DEFAULT_COLORS_PER_ROW,
            palette_preview: false,
        }
    }
}

pub(crate) struct PreviewGenerator<'a> {
    cli: &'a AsepriteCli,
}

impl<'a> PreviewGenerator<'a> {
    pub(crate) fn new(cli: &'a AsepriteCli) -> Self {
        Self { cli }
    }

    pub(crate) fn generate(&self, params: &PreviewParams) -> Result<String, AsepriteError> {
        let cmd = preview_command(params)?;
        self.cli.execute_command_output(cmd.as_ref())
    }
}

/// 选择预览命令：强制调色板 > 精灵扩展名 > 可加载调色板扩展名
pub(crate) fn preview_command(params: &PreviewParams) -> Result<Box<dyn ScriptCommand>, AsepriteError> {
    let palette = || -> Box<dyn ScriptCommand> {
        Box::new(ShowPalette {
            batch_mode: true,
            palette_filename: params.filename.clone(),
            output_row_count: params.colors_per_row,
            color_format: params.color_format,
        })
    };
    if params.palette_preview {
        return Ok(palette());
    }
    if check_extension(&params.filename, SPRITE_EXTENSIONS) {
        return Ok(Box::new(ShowSprite {
            batch_mode: true,
            sprite_filename: params.filename.clone(),
        }));
    }
    if check_extension(&params.filename, LOADABLE_PALETTE_EXTENSIONS) {
        return Ok(palette());
    }
    Err(AsepriteError::UnsupportedFileType(params.filename.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn sprites_use_sprite_preview() {
        let cmd = preview_command(&PreviewParams::new("/art/Hero.ASEPRITE")).unwrap();
        assert_eq!(cmd.script_name(), PathBuf::from("sprite-preview.lua"));
    }

    #[test]
    fn palettes_use_palette_preview() {
        let mut params = PreviewParams::new("/pal/db32.gpl");
        params.color_format = ColorFormat::Rgb;
        params.colors_per_row = 4;
        let cmd = preview_command(&params).unwrap();
        assert_eq!(cmd.script_name(), PathBuf::from("palette-preview.lua"));
        assert!(cmd.args().contains(&"output-row-count=4".to_string()));
        assert!(cmd.args().contains(&"color-format=rgb".to_string()));
    }

    #[test]
    fn forced_palette_preview_wins_over_sprite_extension() {
        let mut params = PreviewParams::new("/art/hero.ase");
        params.palette_preview = true;
        let cmd = preview_command(&params).unwrap();
        assert_eq!(cmd.script_name(), PathBuf::from("palette-preview.lua"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        match preview_command(&PreviewParams::new("notes.txt")) {
            Err(AsepriteError::UnsupportedFileType(f)) => assert_eq!(f, "notes.txt"),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected an error"),
        }
    }
}
