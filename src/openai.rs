//! AI 调色板生成：
//! - 按颜色数量与透明度构造提示词
//! - 调用 OpenAI 兼容的 `chat/completions` 接口
//! - 回复记录到 `openai_responses.log`

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use log::warn;

use crate::{config::OpenAiConfig, palette::{self, Color}};

pub(crate) const RESPONSES_LOG: &str = "openai_responses.log";

pub(crate) const MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-4o-mini",
    "gpt-4o",
    "o1-mini",
    "gpt-4-turbo",
    "gpt-4",
];

#[derive(Debug, Clone)]
pub(crate) struct GenerationParams {
    pub(crate) description: String,
    /// 0 表示不限定数量
    pub(crate) num_colors: usize,
    pub(crate) model: String,
    pub(crate) transparency: bool,
}

pub(crate) fn build_prompt(params: &GenerationParams) -> String {
    let base = if params.num_colors == 0 {
        "Generate a color palette for: ".to_string()
    } else {
        format!("Generate a color palette with exactly {} colors for: ", params.num_colors)
    };
    let mut prompt = format!(
        "{}: \"{}\". Use color theory principles to ensure a harmonious palette. \
         If the description asks for shades, arrange them from light to dark. \
         Return only hex color codes separated by commas (Upper case only). \
         Example: #FF0000, #00FF00, #0000FF",
        base, params.description
    );
    if params.transparency {
        prompt.push_str("\nInclude transparency in the colors.");
    }
    prompt
}

/// 追加一条带 RFC 3339 时间戳的回复记录
pub(crate) fn log_response(log_path: &Path, response: &str) {
    let entry = format!(
        "Timestamp: {}\nResponse: {}\n\n",
        chrono::Local::now().to_rfc3339(),
        response
    );
    let res = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .and_then(|mut f| f.write_all(entry.as_bytes()));
    if let Err(e) = res {
        warn!("写入 {} 失败: {}", log_path.display(), e);
    }
}

pub(crate) struct OpenAiClient {
    api_key: String,
    api_url: String,
    log_path: PathBuf,
}

impl OpenAiClient {
    pub(crate) fn new(cfg: &OpenAiConfig) -> Result<Self> {
        if cfg.api_key.trim().is_empty() {
            bail!("未设置 OpenAI API key\n运行 `aseprite-assets config edit` 或设置 OPENAI_API_KEY");
        }
        if cfg.api_url.trim().is_empty() {
            bail!("未设置 OpenAI API url\n运行 `aseprite-assets config edit` 进行设置");
        }
        Ok(Self {
            api_key: cfg.api_key.trim().to_string(),
            api_url: cfg.api_url.trim().trim_end_matches('/').to_string(),
            log_path: PathBuf::from(RESPONSES_LOG),
        })
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_url)
    }

    /// 请求生成颜色并解析回复
    pub(crate) fn generate_colors(&self, params: &GenerationParams) -> Result<Vec<Color>> {
        let content = self.chat(&params.model, &build_prompt(params))?;
        log_response(&self.log_path, &content);
        let colors = palette::parse_color_list(&content)?;
        if colors.is_empty() {
            bail!("模型没有返回任何颜色");
        }
        Ok(colors)
    }

    #[cfg(feature = "remote")]
    fn chat(&self, model: &str, prompt: &str) -> Result<String> {
        use anyhow::Context;

        let url = self.endpoint();
        let body = serde_json::json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let resp = match ureq::post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("User-Agent", "aseprite-assets/0.1")
            .send_json(body)
        {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                let text = r.into_string().unwrap_or_default();
                bail!("API 错误 {}: {}", code, text.trim());
            }
            Err(e) => bail!("HTTP 请求失败 {}: {}", url, e),
        };
        let json: serde_json::Value = resp.into_json().with_context(|| format!("解析响应失败: {}", url))?;
        extract_content(&json)
    }

    #[cfg(not(feature = "remote"))]
    fn chat(&self, _model: &str, _prompt: &str) -> Result<String> {
        bail!("未启用 remote 特性，无法调用 OpenAI 接口")
    }
}

/// 取第一个 choice 的消息内容
#[cfg(feature = "remote")]
pub(crate) fn extract_content(json: &serde_json::Value) -> Result<String> {
    match json.pointer("/choices/0/message/content").and_then(|v| v.as_str()) {
        Some(s) => Ok(s.to_string()),
        None => bail!("响应中没有 choices[0].message.content"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(num_colors: usize, transparency: bool) -> GenerationParams {
        GenerationParams {
            description: "ocean at dusk".into(),
            num_colors,
            model: MODELS[0].into(),
            transparency,
        }
    }

    #[test]
    fn prompt_mentions_count_only_when_set() {
        let p = build_prompt(&params(5, false));
        assert!(p.starts_with("Generate a color palette with exactly 5 colors for: : \"ocean at dusk\"."));
        assert!(!p.contains("transparency"));
        let p = build_prompt(&params(0, true));
        assert!(p.starts_with("Generate a color palette for: : \"ocean at dusk\"."));
        assert!(p.ends_with("\nInclude transparency in the colors."));
        assert!(p.contains("Example: #FF0000, #00FF00, #0000FF"));
    }

    #[test]
    fn client_requires_key_and_url() {
        let cfg = OpenAiConfig { api_key: String::new(), api_url: "https://x".into() };
        assert!(OpenAiClient::new(&cfg).is_err());
        let cfg = OpenAiConfig { api_key: "sk-abc".into(), api_url: " ".into() };
        assert!(OpenAiClient::new(&cfg).is_err());
        let cfg = OpenAiConfig { api_key: "sk-abc".into(), api_url: "https://api.example.com/v1/".into() };
        assert_eq!(OpenAiClient::new(&cfg).unwrap().endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn responses_are_appended() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("r.log");
        log_response(&log, "#FFFFFF");
        log_response(&log, "#000000");
        let text = std::fs::read_to_string(&log).unwrap();
        assert_eq!(text.matches("Timestamp: ").count(), 2);
        assert!(text.contains("Response: #000000\n\n"));
    }

    #[cfg(feature = "remote")]
    #[test]
    fn content_is_extracted() {
        let json = serde_json::json!({"choices": [{"message": {"role": "assistant", "content": "#FF0000"}}]});
        assert_eq!(extract_content(&json).unwrap(), "#FF0000");
        assert!(extract_content(&serde_json::json!({"choices": []})).is_err());
    }
}
