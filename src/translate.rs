use serde_json::Value;
use std::time::Duration;

const TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const TRANSLATE_TIMEOUT_SECS: u64 = 15;

/// Best-effort translation into English, used only to build better image
/// prompts. Failure of any kind falls back to the clipped original text, so
/// callers never see an error.
pub struct Translator {
    client: reqwest::Client,
    max_chars: usize,
}

impl Translator {
    pub fn new(max_chars: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_chars,
        }
    }

    pub async fn translate(&self, text: &str) -> String {
        let short = clip_chars(text, self.max_chars);
        match self.request(&short).await {
            Some(translated) if !translated.trim().is_empty() => translated,
            _ => short,
        }
    }

    async fn request(&self, text: &str) -> Option<String> {
        let response = self
            .client
            .get(TRANSLATE_ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", "en"),
                ("dt", "t"),
                ("q", text),
            ])
            .timeout(Duration::from_secs(TRANSLATE_TIMEOUT_SECS))
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            log::warn!("translation endpoint returned {}", response.status());
            return None;
        }

        let body = response.text().await.ok()?;
        parse_translation(&body)
    }
}

/// Clips to a character count without splitting a code point.
pub fn clip_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// The gtx endpoint answers with nested arrays; the translated segments sit
/// at `[0][n][0]`.
pub fn parse_translation(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let segments = value.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(Value::as_str) {
            out.push_str(part);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_chars_respects_boundaries() {
        assert_eq!(clip_chars("hello", 10), "hello");
        assert_eq!(clip_chars("hello", 3), "hel");
        // Multi-byte characters count as one each.
        assert_eq!(clip_chars("बिल्ली चटाई", 7), "बिल्ली ");
    }

    #[test]
    fn test_parse_translation() {
        let body = r#"[[["The cat sits. ","बिल्ली बैठती है।",null,null,10],["The mat is red.","चटाई लाल है।",null,null,10]],null,"hi"]"#;
        assert_eq!(
            parse_translation(body).as_deref(),
            Some("The cat sits. The mat is red.")
        );
    }

    #[test]
    fn test_parse_translation_rejects_garbage() {
        assert_eq!(parse_translation("<html>quota exceeded</html>"), None);
        assert_eq!(parse_translation("[]"), None);
        assert_eq!(parse_translation("{\"error\":true}"), None);
    }
}
