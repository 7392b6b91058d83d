//! 脚本参数编组模块：
//! - 将命令结构体的字段按声明顺序展开为 Aseprite 命令行参数
//! - 普通字段生成 `--script-param key=value`，键名默认取字段名小写
//! - 批处理字段为真时生成 `-b`，为假时不生成任何参数

use std::{fmt::Display, path::PathBuf};

/// Aseprite 脚本参数开关
pub(crate) const SCRIPT_PARAM_ARG: &str = "--script-param";
/// Aseprite 批处理模式开关（不打开 UI）
pub(crate) const BATCH_MODE_ARG: &str = "-b";

/// 字段在编组时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamStyle {
    Plain,
    /// 以字符串形式输出；参数不经过 shell，因此不附加引号字符
    Quoted,
    Batch,
    Ignored,
}

/// 单个字段的编组描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptParam {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) style: ParamStyle,
}

impl ScriptParam {
    /// 以字段名创建参数，键名为字段名的小写形式
    pub(crate) fn new(field: &str, value: impl Display) -> Self {
        Self {
            key: field_key(field),
            value: value.to_string(),
            style: ParamStyle::Plain,
        }
    }

    /// 批处理字段
    pub(crate) fn batch(enabled: bool) -> Self {
        Self {
            key: "batchmode".to_string(),
            value: enabled.to_string(),
            style: ParamStyle::Batch,
        }
    }

    /// 重命名键
    pub(crate) fn key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub(crate) fn quoted(mut self) -> Self {
        self.style = ParamStyle::Quoted;
        self
    }

    pub(crate) fn ignore(mut self) -> Self {
        self.style = ParamStyle::Ignored;
        self
    }
}

/// 字段名 -> 默认键名
pub(crate) fn field_key(field: &str) -> String {
    field.to_lowercase()
}

/// 由 Aseprite 脚本执行的命令
pub(crate) trait ScriptCommand {
    /// 相对脚本目录的脚本路径
    fn script_name(&self) -> PathBuf;

    /// 按声明顺序列出的字段
    fn params(&self) -> Vec<ScriptParam>;

    fn args(&self) -> Vec<String> {
        marshal_params(&self.params())
    }
}

/// 将字段列表展开为扁平的参数列表
pub(crate) fn marshal_params(params: &[ScriptParam]) -> Vec<String> {
    let mut args = Vec::with_capacity(params.len() * 2);
    for p in params {
        match p.style {
            ParamStyle::Ignored => continue,
            ParamStyle::Batch => {
                if p.value == "true" {
                    args.push(BATCH_MODE_ARG.to_string());
                }
            }
            ParamStyle::Plain | ParamStyle::Quoted => {
                args.push(SCRIPT_PARAM_ARG.to_string());
                args.push(format!("{}={}", p.key, p.value));
            }
        }
    }
    args
}
