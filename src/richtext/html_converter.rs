// HTML Converter
// Converts between StyledDocument and HTML.
// Export writes only the attributes that differ from the defaults; import fills
// every gap from the same defaults, so the two stay symmetric.

use super::html_parser::{
    HtmlToken, parse_font_family, parse_font_weight, parse_length, parse_style_declarations,
    parse_text_decoration, tokenize,
};
use super::styled_document::*;
use crate::error::{HtmlImportError, ImportResult};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Indentation added per nesting level when importing nested lists
const NESTED_LIST_INDENT: f32 = 30.0;

static TAG_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("valid tag regex")
});

/// Quick structural check: does the string contain something that looks like a tag?
pub fn is_html(text: &str) -> bool {
    TAG_MARKER.is_match(text)
}

/// Escape text content for HTML. Non-breaking spaces become `&nbsp;`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            NON_BREAKING_SPACE => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

// ── Export ─────────────────────────────────────────────────────────

/// Convert a StyledDocument into a self-contained HTML document
pub fn html_from_document(doc: &StyledDocument, defaults: &DefaultAttributes) -> String {
    let mut body = String::new();

    let blank = doc.paragraph_count() == 1
        && doc.is_empty()
        && doc.paragraphs()[0].style == defaults.paragraph_style;

    if !blank {
        let default_attrs = defaults.text_attributes();
        let mut open_list = ListKind::None;

        for paragraph in doc.paragraphs() {
            let kind = paragraph.style.list;
            if kind != open_list {
                if let Some(tag) = list_tag(open_list) {
                    body.push_str(&format!("</{tag}>\n"));
                }
                if let Some(tag) = list_tag(kind) {
                    body.push_str(&format!("<{tag}>\n"));
                }
                open_list = kind;
            }

            let tag = if kind == ListKind::None { "p" } else { "li" };
            let style = style_attribute(&paragraph_declarations(
                &paragraph.style,
                &defaults.paragraph_style,
            ));
            let content = if paragraph.is_empty() {
                "<br>".to_string()
            } else {
                paragraph_content_to_html(paragraph, &default_attrs)
            };
            body.push_str(&format!("<{tag}{style}>{content}</{tag}>\n"));
        }

        if let Some(tag) = list_tag(open_list) {
            body.push_str(&format!("</{tag}>\n"));
        }
    }

    let mut output = String::new();
    output.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n");
    output.push_str("<body style=\"white-space: pre-wrap;\">\n");
    output.push_str(&body);
    output.push_str("</body>\n</html>\n");
    output
}

fn list_tag(kind: ListKind) -> Option<&'static str> {
    match kind {
        ListKind::None => None,
        ListKind::Bulleted => Some("ul"),
        ListKind::Numbered => Some("ol"),
    }
}

fn style_attribute(declarations: &[String]) -> String {
    if declarations.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(&declarations.join("; ")))
    }
}

/// Block-level declarations that differ from the default paragraph style
fn paragraph_declarations(style: &ParagraphStyle, default: &ParagraphStyle) -> Vec<String> {
    let mut decls = Vec::new();
    if style.alignment != default.alignment {
        decls.push(format!("text-align: {}", style.alignment.to_css()));
    }
    if style.head_indent != default.head_indent {
        decls.push(format!("margin-left: {}pt", format_number(style.head_indent)));
    }
    let text_indent = style.first_line_head_indent - style.head_indent;
    let default_text_indent = default.first_line_head_indent - default.head_indent;
    if text_indent != default_text_indent {
        decls.push(format!("text-indent: {}pt", format_number(text_indent)));
    }
    decls
}

/// Inline declarations that differ from the default attributes
fn run_declarations(attrs: &TextAttributes, default: &TextAttributes) -> Vec<String> {
    let mut decls = Vec::new();
    if attrs.font.family != default.font.family {
        let family = attrs.font.family.replace(['\'', '"'], "");
        decls.push(format!("font-family: '{family}'"));
    }
    if attrs.font.size != default.font.size {
        decls.push(format!("font-size: {}pt", format_number(attrs.font.size)));
    }
    if attrs.is_bold() != default.is_bold() {
        let weight = if attrs.is_bold() { "bold" } else { "normal" };
        decls.push(format!("font-weight: {weight}"));
    }
    if attrs.is_italic() != default.is_italic() {
        let style = if attrs.is_italic() { "italic" } else { "normal" };
        decls.push(format!("font-style: {style}"));
    }
    if attrs.underline != default.underline || attrs.strikethrough != default.strikethrough {
        let mut lines = Vec::new();
        if attrs.underline {
            lines.push("underline");
        }
        if attrs.strikethrough {
            lines.push("line-through");
        }
        if lines.is_empty() {
            lines.push("none");
        }
        decls.push(format!("text-decoration: {}", lines.join(" ")));
    }
    // `initial` marks a run that has no color of its own while the default has one
    if attrs.text_color != default.text_color {
        let value = attrs.text_color.map_or_else(|| "initial".to_string(), |c| c.to_css());
        decls.push(format!("color: {value}"));
    }
    if attrs.background_color != default.background_color {
        let value = attrs
            .background_color
            .map_or_else(|| "initial".to_string(), |c| c.to_css());
        decls.push(format!("background-color: {value}"));
    }
    decls
}

/// Convert the runs of one paragraph to inline markup
fn paragraph_content_to_html(paragraph: &Paragraph, default: &TextAttributes) -> String {
    let mut output = String::new();

    for run in paragraph.runs() {
        let text = escape_html(&run.text);
        let style = style_attribute(&run_declarations(&run.attributes, default));

        match &run.attributes.link {
            Some(link) => {
                output.push_str(&format!(
                    "<a href=\"{}\"{style}>{text}</a>",
                    escape_html(link.as_str())
                ));
            }
            None if !style.is_empty() => {
                output.push_str(&format!("<span{style}>{text}</span>"));
            }
            None => output.push_str(&text),
        }
    }

    output
}

// ── Import ─────────────────────────────────────────────────────────

/// One level of open elements with the formatting they establish
#[derive(Debug, Clone)]
struct Frame {
    tag: String,
    attributes: TextAttributes,
    paragraph_style: ParagraphStyle,
    preserve_whitespace: bool,
}

/// The paragraph being filled
struct OpenParagraph {
    paragraph: Paragraph,
    /// Opened by a block tag and nothing (not even a line break) added yet
    fresh: bool,
    /// Ends in a space produced by whitespace collapsing
    trailing_collapsed_space: bool,
}

struct Importer<'a> {
    defaults: &'a DefaultAttributes,
    frames: Vec<Frame>,
    lists: Vec<ListKind>,
    paragraphs: Vec<Paragraph>,
    current: Option<OpenParagraph>,
    skip_depth: usize,
}

const SKIPPED_ELEMENTS: &[&str] = &["head", "script", "style", "title", "template"];
const VOID_ELEMENTS: &[&str] = &["img", "hr", "meta", "link", "input", "wbr", "col", "area"];
const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "center",
    "dt",
    "dd",
];

impl<'a> Importer<'a> {
    fn new(defaults: &'a DefaultAttributes) -> Self {
        Importer {
            defaults,
            frames: vec![Frame {
                tag: String::new(),
                attributes: defaults.text_attributes(),
                paragraph_style: defaults.paragraph_style.clone(),
                preserve_whitespace: false,
            }],
            lists: Vec::new(),
            paragraphs: Vec::new(),
            current: None,
            skip_depth: 0,
        }
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn run(mut self, tokens: &[HtmlToken]) -> Vec<Paragraph> {
        for token in tokens {
            match token {
                HtmlToken::StartTag {
                    name, self_closing, ..
                } => self.start_tag(name, token, *self_closing),
                HtmlToken::EndTag(name) => self.end_tag(name),
                HtmlToken::Text(text) => self.text(text),
            }
        }
        self.finish_paragraph();
        self.paragraphs
    }

    fn start_tag(&mut self, name: &str, token: &HtmlToken, self_closing: bool) {
        if SKIPPED_ELEMENTS.contains(&name) {
            if !self_closing {
                self.skip_depth += 1;
            }
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        if name == "br" {
            self.line_break();
            return;
        }
        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        if name == "ul" || name == "ol" {
            self.finish_paragraph();
            self.lists.push(if name == "ol" {
                ListKind::Numbered
            } else {
                ListKind::Bulleted
            });
        }

        let frame = self.frame_for(name, token);
        let is_block = BLOCK_ELEMENTS.contains(&name);
        let paragraph_style = frame.paragraph_style.clone();
        self.frames.push(frame);

        if is_block {
            self.open_block(paragraph_style);
        }
        if self_closing {
            self.end_tag(name);
        }
    }

    fn end_tag(&mut self, name: &str) {
        if SKIPPED_ELEMENTS.contains(&name) {
            self.skip_depth = self.skip_depth.saturating_sub(1);
            return;
        }
        if self.skip_depth > 0 {
            return;
        }
        if name == "br" {
            self.line_break();
            return;
        }

        let Some(pos) = self.frames.iter().rposition(|f| f.tag == name) else {
            return;
        };
        self.frames.truncate(pos.max(1));

        if BLOCK_ELEMENTS.contains(&name) {
            self.finish_paragraph();
        }
        if name == "ul" || name == "ol" {
            self.finish_paragraph();
            self.lists.pop();
        }
    }

    /// Formatting established by an element on top of the enclosing frame
    fn frame_for(&self, name: &str, token: &HtmlToken) -> Frame {
        let parent = self.top();
        let mut attrs = parent.attributes.clone();
        let mut style = parent.paragraph_style.clone();
        let mut preserve = parent.preserve_whitespace;
        let base_size = self.defaults.font.size;

        match name {
            "b" | "strong" => attrs.font.traits.bold = true,
            "i" | "em" | "cite" | "var" | "dfn" => attrs.font.traits.italic = true,
            "u" | "ins" => attrs.underline = true,
            "s" | "strike" | "del" => attrs.strikethrough = true,
            "a" => {
                if let Some(href) = token.attr("href") {
                    match Url::parse(href.trim()) {
                        Ok(url) => attrs.link = Some(url),
                        Err(err) => {
                            tracing::debug!(href, %err, "ignoring link without an absolute URL")
                        }
                    }
                }
            }
            "font" => {
                if let Some(color) = token.attr("color").and_then(Color::from_css) {
                    attrs.text_color = Some(color);
                }
                if let Some(face) = token.attr("face").and_then(parse_font_family) {
                    attrs.font.family = face;
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let scale = match name {
                    "h1" => 2.0,
                    "h2" => 1.5,
                    "h3" => 1.17,
                    "h4" => 1.0,
                    "h5" => 0.83,
                    _ => 0.67,
                };
                attrs.font.traits.bold = true;
                attrs.font.size = base_size * scale;
            }
            "pre" => preserve = true,
            "center" => style.alignment = TextAlignment::Center,
            "li" => {
                style.list = self.lists.last().copied().unwrap_or(ListKind::Bulleted);
                let depth = self.lists.len().max(1);
                if depth > 1 {
                    let extra = NESTED_LIST_INDENT * (depth - 1) as f32;
                    style.head_indent += extra;
                    style.first_line_head_indent += extra;
                }
            }
            _ => {}
        }

        if BLOCK_ELEMENTS.contains(&name) && name != "li" {
            style.list = ListKind::None;
        }
        if let Some(align) = token.attr("align").and_then(TextAlignment::from_css) {
            style.alignment = align;
        }

        if let Some(css) = token.attr("style") {
            for (property, value) in parse_style_declarations(css) {
                apply_declaration(
                    &property,
                    &value,
                    base_size,
                    &mut attrs,
                    &mut style,
                    &mut preserve,
                );
            }
        }

        Frame {
            tag: name.to_string(),
            attributes: attrs,
            paragraph_style: style,
            preserve_whitespace: preserve,
        }
    }

    fn open_block(&mut self, style: ParagraphStyle) {
        if let Some(open) = &mut self.current {
            if open.fresh && open.paragraph.is_empty() {
                open.paragraph.style = style;
                return;
            }
            self.finish_paragraph();
        }
        self.start_paragraph(style, true);
    }

    fn start_paragraph(&mut self, style: ParagraphStyle, fresh: bool) {
        let attributes = self.top().attributes.clone();
        self.current = Some(OpenParagraph {
            paragraph: Paragraph::empty_with(style, attributes),
            fresh,
            trailing_collapsed_space: false,
        });
    }

    fn finish_paragraph(&mut self) {
        let Some(mut open) = self.current.take() else {
            return;
        };
        if open.trailing_collapsed_space {
            let len = open.paragraph.len();
            open.paragraph.delete_text_range(len - 1, len);
        }
        self.paragraphs.push(open.paragraph);
    }

    fn line_break(&mut self) {
        match &mut self.current {
            Some(open) if open.fresh && open.paragraph.is_empty() => open.fresh = false,
            Some(open) => {
                let style = open.paragraph.style.clone();
                self.finish_paragraph();
                self.start_paragraph(style, false);
            }
            None => {
                let style = self.top().paragraph_style.clone();
                self.start_paragraph(style, false);
            }
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skip_depth > 0 || raw.is_empty() {
            return;
        }
        // Whitespace between blocks never forms a paragraph. At the start of a
        // block it only survives when whitespace is preserved.
        if raw.chars().all(|c| c.is_ascii_whitespace()) {
            match &self.current {
                None => return,
                Some(open)
                    if open.fresh
                        && open.paragraph.is_empty()
                        && !self.top().preserve_whitespace =>
                {
                    return;
                }
                _ => {}
            }
        }
        if self.current.is_none() {
            let style = self.top().paragraph_style.clone();
            self.start_paragraph(style, false);
        }

        let attributes = self.top().attributes.clone();
        if self.top().preserve_whitespace {
            let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
            for (i, line) in normalized.split('\n').enumerate() {
                if i > 0 {
                    self.line_break();
                }
                self.append(line, &attributes, false);
            }
        } else {
            let mut collapsed = String::with_capacity(raw.len());
            let mut last_space = self
                .current
                .as_ref()
                .is_some_and(|open| open.paragraph.is_empty() || open.trailing_collapsed_space);
            for ch in raw.chars() {
                if ch.is_ascii_whitespace() {
                    if !last_space {
                        collapsed.push(' ');
                        last_space = true;
                    }
                } else {
                    collapsed.push(ch);
                    last_space = false;
                }
            }
            let ends_with_space = collapsed.ends_with(' ');
            if !collapsed.is_empty() {
                self.append(&collapsed, &attributes, ends_with_space);
            }
        }
    }

    fn append(&mut self, text: &str, attributes: &TextAttributes, collapsed_space: bool) {
        if let Some(open) = &mut self.current {
            if !text.is_empty() {
                let len = open.paragraph.len();
                open.paragraph.insert_text(len, text, attributes.clone());
                open.trailing_collapsed_space = collapsed_space;
            }
            open.fresh = false;
        }
    }
}

fn apply_declaration(
    property: &str,
    value: &str,
    base_size: f32,
    attrs: &mut TextAttributes,
    style: &mut ParagraphStyle,
    preserve: &mut bool,
) {
    match property {
        "font-family" => {
            if let Some(family) = parse_font_family(value) {
                attrs.font.family = family;
            }
        }
        "font-size" => {
            if let Some(size) = parse_length(value, base_size).filter(|s| *s > 0.0) {
                attrs.font.size = size;
            }
        }
        "font-weight" => {
            if let Some(bold) = parse_font_weight(value) {
                attrs.font.traits.bold = bold;
            }
        }
        "font-style" => {
            let value = value.to_ascii_lowercase();
            attrs.font.traits.italic = value == "italic" || value == "oblique";
        }
        "text-decoration" | "text-decoration-line" => {
            let (underline, line_through) = parse_text_decoration(value);
            attrs.underline = underline;
            attrs.strikethrough = line_through;
        }
        "color" => {
            if value.eq_ignore_ascii_case("initial") {
                attrs.text_color = None;
            } else if let Some(color) = Color::from_css(value) {
                attrs.text_color = Some(color);
            }
        }
        "background-color" | "background" => {
            if value.eq_ignore_ascii_case("initial") {
                attrs.background_color = None;
            } else if let Some(color) = Color::from_css(value) {
                attrs.background_color = Some(color);
            }
        }
        "text-align" => {
            if let Some(alignment) = TextAlignment::from_css(value) {
                style.alignment = alignment;
            }
        }
        "margin-left" | "padding-left" => {
            if let Some(indent) = parse_length(value, base_size) {
                let text_indent = style.first_line_head_indent - style.head_indent;
                style.head_indent = indent;
                style.first_line_head_indent = indent + text_indent;
            }
        }
        "text-indent" => {
            if let Some(indent) = parse_length(value, base_size) {
                style.first_line_head_indent = style.head_indent + indent;
            }
        }
        "white-space" => {
            let value = value.to_ascii_lowercase();
            *preserve = matches!(value.as_str(), "pre" | "pre-wrap" | "break-spaces");
        }
        _ => {}
    }
}

/// Parse HTML into a StyledDocument, filling unstyled content from `defaults`.
///
/// Fails only when nothing usable can be recovered; callers should then fall
/// back to treating the input as plain text.
pub fn document_from_html(
    html: &str,
    defaults: &DefaultAttributes,
) -> ImportResult<StyledDocument> {
    if html.trim().is_empty() {
        return Err(HtmlImportError::Empty);
    }

    let stream = tokenize(html);
    let paragraphs = Importer::new(defaults).run(&stream.tokens);

    if paragraphs.is_empty() && !stream.errors.is_empty() {
        return Err(HtmlImportError::Malformed {
            errors: stream.errors,
        });
    }
    if !stream.errors.is_empty() {
        tracing::debug!(count = stream.errors.len(), "recovered from HTML parse errors");
    }

    if paragraphs.is_empty() {
        return Ok(StyledDocument::from_paragraphs(vec![Paragraph::empty_with(
            defaults.paragraph_style.clone(),
            defaults.text_attributes(),
        )]));
    }
    Ok(StyledDocument::from_paragraphs(paragraphs))
}
