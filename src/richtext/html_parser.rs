// HTML Parser
// Flattens markup into a simple token stream and reads inline CSS declarations.
// Building the styled document from the stream happens in html_converter.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};
use std::cell::RefCell;

/// A markup token relevant to styled-text import
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlToken {
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    /// Character data with entities already decoded
    Text(String),
}

impl HtmlToken {
    /// Value of an attribute on a start tag
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            HtmlToken::StartTag { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Result of tokenizing a markup string
#[derive(Debug, Default)]
pub struct TokenStream {
    pub tokens: Vec<HtmlToken>,
    /// Parse errors reported by the tokenizer; recoverable by definition
    pub errors: Vec<String>,
}

struct TokenCollector {
    tokens: RefCell<Vec<HtmlToken>>,
    errors: RefCell<Vec<String>>,
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => {
                        let attrs = tag
                            .attrs
                            .iter()
                            .map(|a| (a.name.local.to_string(), a.value.to_string()))
                            .collect();
                        let raw_kind = raw_text_kind(&name).filter(|_| !tag.self_closing);
                        self.tokens.borrow_mut().push(HtmlToken::StartTag {
                            name,
                            attrs,
                            self_closing: tag.self_closing,
                        });
                        if let Some(kind) = raw_kind {
                            return TokenSinkResult::RawData(kind);
                        }
                    }
                    TagKind::EndTag => self.tokens.borrow_mut().push(HtmlToken::EndTag(name)),
                }
            }
            Token::CharacterTokens(s) => {
                let mut tokens = self.tokens.borrow_mut();
                // The tokenizer delivers text in pieces; keep one token per text node
                if let Some(HtmlToken::Text(prev)) = tokens.last_mut() {
                    prev.push_str(&s);
                } else {
                    tokens.push(HtmlToken::Text(s.to_string()));
                }
            }
            Token::ParseError(message) => {
                self.errors.borrow_mut().push(message.to_string());
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Elements whose content is text up to the matching end tag, never markup
fn raw_text_kind(name: &str) -> Option<RawKind> {
    match name {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "title" | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

/// Tokenize an HTML fragment or document
pub fn tokenize(html: &str) -> TokenStream {
    let sink = TokenCollector {
        tokens: RefCell::new(Vec::new()),
        errors: RefCell::new(Vec::new()),
    };
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let mut queue = BufferQueue::default();
    queue.push_back(StrTendril::from(html));
    // The sink never asks for script execution, so feeding always runs to the end
    match tokenizer.feed(&mut queue) {
        TokenizerResult::Done => {}
        TokenizerResult::Script(()) => tracing::debug!("tokenizer paused at a script"),
    }
    tokenizer.end();

    let sink = tokenizer.sink;
    TokenStream {
        tokens: sink.tokens.into_inner(),
        errors: sink.errors.into_inner(),
    }
}

/// Split an inline `style` attribute into (property, value) pairs.
/// Property names are lowercased; `!important` is dropped.
pub fn parse_style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value.to_string()))
            }
        })
        .collect()
}

/// Parse a CSS length into points. `px` is treated as a point, `em`/`%` scale `base`.
pub fn parse_length(value: &str, base: f32) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(n) = value.strip_suffix("pt") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, base)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, base)
    } else if let Some(n) = value.strip_suffix('%') {
        (n, base / 100.0)
    } else {
        (value.as_str(), 1.0)
    };
    let parsed: f32 = number.trim().parse().ok()?;
    parsed.is_finite().then_some(parsed * scale)
}

/// First family of a `font-family` list, without quotes
pub fn parse_font_family(value: &str) -> Option<String> {
    let first = value.split(',').next()?.trim();
    let unquoted = first.trim_matches(|c| c == '\'' || c == '"').trim();
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

/// Whether a `font-weight` value means bold
pub fn parse_font_weight(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "bold" | "bolder" => Some(true),
        "normal" | "lighter" => Some(false),
        other => other.parse::<u16>().ok().map(|w| w >= 600),
    }
}

/// Underline and line-through flags of a `text-decoration` value
pub fn parse_text_decoration(value: &str) -> (bool, bool) {
    let value = value.to_ascii_lowercase();
    let underline = value.split_whitespace().any(|v| v == "underline");
    let line_through = value.split_whitespace().any(|v| v == "line-through");
    (underline, line_through)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_decodes_entities() {
        let stream = tokenize("<p class=\"x\">a&nbsp;&amp;b</p>");
        assert_eq!(
            stream.tokens,
            vec![
                HtmlToken::StartTag {
                    name: "p".to_string(),
                    attrs: vec![("class".to_string(), "x".to_string())],
                    self_closing: false,
                },
                HtmlToken::Text("a\u{a0}&b".to_string()),
                HtmlToken::EndTag("p".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_reports_unterminated_tag() {
        let stream = tokenize("<p");
        assert!(stream.tokens.is_empty());
        assert!(!stream.errors.is_empty());
    }

    #[test]
    fn test_style_declarations() {
        let decls = parse_style_declarations("Font-Weight: bold; color:#f00 !important;;");
        assert_eq!(
            decls,
            vec![
                ("font-weight".to_string(), "bold".to_string()),
                ("color".to_string(), "#f00".to_string()),
            ]
        );
    }

    #[test]
    fn test_lengths_and_fonts() {
        assert_eq!(parse_length("14pt", 12.0), Some(14.0));
        assert_eq!(parse_length("16px", 12.0), Some(16.0));
        assert_eq!(parse_length("2em", 12.0), Some(24.0));
        assert_eq!(parse_length("wide", 12.0), None);
        assert_eq!(
            parse_font_family("'Times New Roman', serif"),
            Some("Times New Roman".to_string())
        );
        assert_eq!(parse_font_weight("700"), Some(true));
        assert_eq!(parse_font_weight("400"), Some(false));
        assert_eq!(parse_text_decoration("underline line-through"), (true, true));
    }

    #[test]
    fn test_script_and_style_are_raw_text() {
        let stream = tokenize("<script>if (a<b) { x(); }</script><style>p > b {}</style><p>t</p>");
        assert!(stream.errors.is_empty());
        assert_eq!(
            stream.tokens[1],
            HtmlToken::Text("if (a<b) { x(); }".to_string())
        );
        assert_eq!(stream.tokens[2], HtmlToken::EndTag("script".to_string()));
        assert_eq!(stream.tokens[4], HtmlToken::Text("p > b {}".to_string()));
        assert_eq!(stream.tokens[6], HtmlToken::StartTag {
            name: "p".to_string(),
            attrs: Vec::new(),
            self_closing: false,
        });
    }
}
