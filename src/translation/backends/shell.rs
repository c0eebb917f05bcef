//! 外部命令翻译后端
//!
//! 调用行输出风格的命令行翻译工具（如 translate-shell 的 `trans`），按照构造时
//! 发现的引擎顺序逐个尝试，直到某个引擎给出结果。

use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use crate::translation::config::constants;
use crate::translation::core::{Translation, Translator};
use crate::translation::error::{TranslationError, TranslationResult};

/// 外部命令后端
///
/// 引擎列表在构造时确定，之后不再变化。单个引擎失败只会记录日志并尝试下一个，
/// 只有所有引擎都失败时才向调用方报告。
#[derive(Debug, Clone)]
pub struct ShellBackend {
    binary: String,
    engines: Vec<String>,
}

impl ShellBackend {
    /// 运行 `<binary> -S` 发现可用引擎
    ///
    /// 命令无法运行、非零退出或没有列出任何引擎时构造失败。
    pub async fn discover(binary: impl Into<String>) -> TranslationResult<Self> {
        let binary = binary.into();
        let output = Command::new(&binary)
            .arg(constants::LIST_ENGINES_FLAG)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranslationError::EngineDiscovery(format!("{}: {}", binary, e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push('\n');
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(TranslationError::EngineDiscovery(format!(
                "{} {} 退出状态 {}: {}",
                binary,
                constants::LIST_ENGINES_FLAG,
                output.status,
                combined.trim()
            )));
        }

        let engines = parse_engine_list(&combined);
        if engines.is_empty() {
            return Err(TranslationError::EngineDiscovery(format!(
                "{} 没有列出任何引擎",
                binary
            )));
        }

        tracing::info!("发现翻译引擎: {}", engines.join(", "));
        Ok(Self { binary, engines })
    }

    /// 使用已知的引擎列表创建后端，不调用外部命令
    pub fn with_engines<I, S>(binary: impl Into<String>, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = engines
            .into_iter()
            .map(|e| e.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            binary: binary.into(),
            engines: parse_engine_list(&joined),
        }
    }

    pub fn engines(&self) -> &[String] {
        &self.engines
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    async fn translate_with_engine(
        &self,
        engine: &str,
        lang: &str,
        word: &str,
    ) -> TranslationResult<Translation> {
        let mut args: Vec<String> = vec!["-e".to_string(), engine.to_string()];
        args.extend(constants::TRANSLATE_FLAGS.iter().map(|f| f.to_string()));
        args.push(format!(":{}", lang));
        args.push(word.to_string());

        tracing::debug!("{} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranslationError::CommandError(format!(
                "引擎 {} 退出状态 {}: {}",
                engine,
                output.status,
                stderr.trim()
            )));
        }

        parse_output(&stdout, lang, word)
    }
}

#[async_trait]
impl Translator for ShellBackend {
    async fn translate(&self, lang: &str, word: &str) -> TranslationResult<Translation> {
        for engine in &self.engines {
            match self.translate_with_engine(engine, lang, word).await {
                Ok(translation) => return Ok(translation),
                Err(e) => tracing::warn!("引擎 {} 翻译失败: {}", engine, e),
            }
        }
        Err(TranslationError::AllEnginesFailed {
            word: word.to_string(),
            lang: lang.to_string(),
        })
    }
}

fn ansi_escape() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("ANSI escape pattern is valid")
    })
}

/// 去除 ANSI 转义序列和不可打印字符
pub fn strip_non_printable(line: &str) -> String {
    ansi_escape()
        .replace_all(line, "")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

/// 解析 `-S` 的输出得到引擎列表
///
/// 去掉标记符号（如默认引擎前的 `*`）、重复项和 "aspell"（拼写检查器，不是
/// 翻译引擎），并把 "google" 移到最前面，其余引擎保持原有顺序。
pub fn parse_engine_list(raw: &str) -> Vec<String> {
    // 控制字符换成空格，避免相邻行粘连成一个词
    let cleaned: String = ansi_escape()
        .replace_all(raw, " ")
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let mut engines: Vec<String> = Vec::new();
    for token in cleaned.split(|c: char| c.is_whitespace() || c == ',') {
        let name = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if name.chars().count() < constants::MIN_ENGINE_NAME_LEN {
            continue;
        }
        if name == constants::EXCLUDED_ENGINE || engines.contains(&name) {
            continue;
        }
        engines.push(name);
    }

    if let Some(pos) = engines.iter().position(|e| e == constants::PREFERRED_ENGINE) {
        let preferred = engines.remove(pos);
        engines.insert(0, preferred);
    }
    engines
}

/// 解析单次翻译的输出
///
/// 第一行是译文；之后第一行被括号包裹的内容作为拼写（音标）。
pub fn parse_output(stdout: &str, lang: &str, word: &str) -> TranslationResult<Translation> {
    let lines: Vec<String> = stdout
        .split('\n')
        .map(|line| strip_non_printable(line).trim().to_string())
        .collect();

    if lines.len() < 2 {
        return Err(TranslationError::NoResult(format!(
            "{} -> {}: 输出少于两行",
            word, lang
        )));
    }

    let translated = lines[0].clone();
    if translated.is_empty() {
        return Err(TranslationError::NoResult(format!("{} -> {}: 空译文", word, lang)));
    }

    let spell = lines
        .iter()
        .skip(1)
        .find(|line| line.len() >= 2 && line.starts_with('(') && line.ends_with(')'))
        .map(|line| line[1..line.len() - 1].trim().to_string())
        .unwrap_or_default();

    Ok(Translation::new(word, lang, translated, spell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_ordering() {
        let engines = parse_engine_list("french, google, aspell, german");
        assert_eq!(engines, vec!["google", "french", "german"]);
    }

    #[test]
    fn test_engine_list_with_markers_and_escapes() {
        let raw = "  apertium\n  aspell\n  bing\n* \x1b[1mgoogle\x1b[22m\n  yandex\n";
        let engines = parse_engine_list(raw);
        assert_eq!(engines, vec!["google", "apertium", "bing", "yandex"]);
    }

    #[test]
    fn test_engine_list_drops_short_and_duplicate_tokens() {
        let engines = parse_engine_list("bing bing x - yandex");
        assert_eq!(engines, vec!["bing", "yandex"]);
    }

    #[test]
    fn test_engine_list_without_google_keeps_order() {
        assert_eq!(parse_engine_list("yandex bing"), vec!["yandex", "bing"]);
        assert!(parse_engine_list("aspell").is_empty());
    }

    #[test]
    fn test_parse_output_with_spell() {
        let out = "hola\n\n(ˈoʊ.lə)\n(other)\n";
        let tr = parse_output(out, "es", "hello").unwrap();
        assert_eq!(tr, Translation::new("hello", "es", "hola", "ˈoʊ.lə"));
    }

    #[test]
    fn test_parse_output_without_spell() {
        let tr = parse_output("Katze\nsome dictionary line\n", "de", "cat").unwrap();
        assert_eq!(tr.word, "Katze");
        assert_eq!(tr.spell, "");
    }

    #[test]
    fn test_parse_output_strips_control_characters() {
        let tr = parse_output("\x1b[1mchat\x1b[22m\r\n(\x07ʃa)\n", "fr", "cat").unwrap();
        assert_eq!(tr.word, "chat");
        assert_eq!(tr.spell, "ʃa");
    }

    #[test]
    fn test_parse_output_rejects_single_line_and_empty_word() {
        assert!(matches!(
            parse_output("hola", "es", "hello"),
            Err(TranslationError::NoResult(_))
        ));
        assert!(matches!(
            parse_output("\n(spell)\n", "es", "hello"),
            Err(TranslationError::NoResult(_))
        ));
        assert!(parse_output("", "es", "hello").is_err());
    }

    #[test]
    fn test_with_engines_applies_same_ordering() {
        let backend = ShellBackend::with_engines("trans", ["bing", "aspell", "google"]);
        assert_eq!(backend.engines(), ["google", "bing"]);
        assert_eq!(backend.binary(), "trans");
    }

    #[tokio::test]
    async fn test_missing_binary_fails_discovery() {
        let err = ShellBackend::discover("/nonexistent/wordrelay-trans")
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::EngineDiscovery(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_exhausts_all_engines() {
        let backend = ShellBackend::with_engines("/nonexistent/wordrelay-trans", ["google", "bing"]);
        let err = backend.translate("es", "hello").await.unwrap_err();
        assert!(matches!(err, TranslationError::AllEnginesFailed { .. }));
    }
}
