// Styled Document Model
// Paragraphs of attributed text runs, addressed by character offsets.
// HTML is only used as an exchange format.

use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::fmt;
use url::Url;

/// Character separating two paragraphs in the flattened document text
pub const PARAGRAPH_SEPARATOR: char = '\n';

/// U+00A0, kept distinct from a regular space through every conversion
pub const NON_BREAKING_SPACE: char = '\u{00A0}';

/// A character range (location + length), measured in Unicode scalar values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub location: usize,
    pub length: usize,
}

impl TextRange {
    pub fn new(location: usize, length: usize) -> Self {
        TextRange { location, length }
    }

    /// Collapsed range (an insertion point)
    pub fn caret(location: usize) -> Self {
        Self::new(location, 0)
    }

    /// Range spanning two offsets in either order
    pub fn between(a: usize, b: usize) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self::new(start, end - start)
    }

    /// One past the last character; saturates instead of overflowing
    pub fn end(&self) -> usize {
        self.location.saturating_add(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Overlap of two ranges, if they share at least one character
    pub fn intersection(&self, other: TextRange) -> Option<TextRange> {
        let start = self.location.max(other.location);
        let end = self.end().min(other.end());
        (start < end).then(|| TextRange::between(start, end))
    }
}

/// Number of characters in a string
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the given character offset (clamped to the end of the string)
pub fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Format a point value without trailing zeros ("12", "10.5", "0.502")
pub(crate) fn format_number(value: f32) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// An sRGB color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Standard hyperlink blue
    pub const LINK_BLUE: Color = Color::rgb(0, 0, 238);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// CSS form: `#rrggbb` when opaque, `rgba(r, g, b, alpha)` otherwise
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                self.r,
                self.g,
                self.b,
                format_number(self.a as f32 / 255.0)
            )
        }
    }

    /// Parse a CSS color value (hex, rgb(), rgba() or a basic named color)
    pub fn from_css(value: &str) -> Option<Color> {
        let value = value.trim().to_ascii_lowercase();

        if let Some(hex) = value.strip_prefix('#') {
            return Self::from_hex(hex);
        }

        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
        {
            let args = args.strip_suffix(')')?;
            let parts: Vec<&str> = args
                .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() < 3 || parts.len() > 4 {
                return None;
            }
            let channel = |p: &str| -> Option<u8> {
                if let Some(pct) = p.strip_suffix('%') {
                    let v: f32 = pct.parse().ok()?;
                    Some((v.clamp(0.0, 100.0) * 2.55).round() as u8)
                } else {
                    let v: f32 = p.parse().ok()?;
                    Some(v.clamp(0.0, 255.0).round() as u8)
                }
            };
            let alpha = match parts.get(3) {
                Some(p) => {
                    let v: f32 = match p.strip_suffix('%') {
                        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                        None => p.parse().ok()?,
                    };
                    (v.clamp(0.0, 1.0) * 255.0).round() as u8
                }
                None => 255,
            };
            return Some(Color::rgba(
                channel(parts[0])?,
                channel(parts[1])?,
                channel(parts[2])?,
                alpha,
            ));
        }

        match value.as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 128, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "yellow" => Some(Color::rgb(255, 255, 0)),
            "orange" => Some(Color::rgb(255, 165, 0)),
            "purple" => Some(Color::rgb(128, 0, 128)),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            "transparent" => Some(Color::rgba(0, 0, 0, 0)),
            _ => None,
        }
    }

    fn from_hex(hex: &str) -> Option<Color> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_css(&value).ok_or_else(|| format!("invalid color '{value}'"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_css()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Symbolic font traits. Bold and italic exist only here, never as separate flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FontTraits {
    pub bold: bool,
    pub italic: bool,
}

/// A font description: family, point size and traits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: f32,
    #[serde(default)]
    pub traits: FontTraits,
}

impl Default for Font {
    fn default() -> Self {
        Font::new("Helvetica", 12.0)
    }
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Font {
            family: family.into(),
            size,
            traits: FontTraits::default(),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.traits.bold
    }

    pub fn is_italic(&self) -> bool {
        self.traits.italic
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.traits.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.traits.italic = italic;
        self
    }

    /// This font's family and size carrying the traits of `other`
    pub fn with_traits_of(mut self, other: &Font) -> Self {
        self.traits = other.traits;
        self
    }
}

/// Character-level attributes of a text run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextAttributes {
    pub font: Font,
    pub underline: bool,
    pub strikethrough: bool,
    pub text_color: Option<Color>,
    pub background_color: Option<Color>,
    pub link: Option<Url>,
}

impl TextAttributes {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        TextAttributes {
            font: Font::default().with_bold(true),
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        TextAttributes {
            font: Font::default().with_italic(true),
            ..Default::default()
        }
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_link(mut self, link: Url) -> Self {
        self.link = Some(link);
        self
    }

    /// Derived from the font's traits
    pub fn is_bold(&self) -> bool {
        self.font.is_bold()
    }

    /// Derived from the font's traits
    pub fn is_italic(&self) -> bool {
        self.font.is_italic()
    }
}

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Natural,
    Left,
    Center,
    Right,
    Justified,
}

impl TextAlignment {
    pub fn to_css(self) -> &'static str {
        match self {
            TextAlignment::Natural => "start",
            TextAlignment::Left => "left",
            TextAlignment::Center => "center",
            TextAlignment::Right => "right",
            TextAlignment::Justified => "justify",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Some(TextAlignment::Natural),
            "left" => Some(TextAlignment::Left),
            "center" => Some(TextAlignment::Center),
            "right" | "end" => Some(TextAlignment::Right),
            "justify" => Some(TextAlignment::Justified),
            _ => None,
        }
    }
}

/// List membership of a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    None,
    Bulleted,
    Numbered,
}

/// Paragraph-level attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphStyle {
    pub alignment: TextAlignment,
    /// Indentation of every line, in points
    pub head_indent: f32,
    /// Indentation of the first line, in points (absolute, like `head_indent`)
    pub first_line_head_indent: f32,
    pub list: ListKind,
}

impl ParagraphStyle {
    pub fn is_list(&self) -> bool {
        self.list != ListKind::None
    }

    pub fn with_list(mut self, list: ListKind) -> Self {
        self.list = list;
        self
    }
}

/// Attributes used wherever the document or imported markup says nothing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultAttributes {
    pub font: Font,
    pub text_color: Option<Color>,
    pub paragraph_style: ParagraphStyle,
}

impl DefaultAttributes {
    pub fn text_attributes(&self) -> TextAttributes {
        TextAttributes {
            font: self.font.clone(),
            text_color: self.text_color,
            ..Default::default()
        }
    }
}

/// A run of styled text (a contiguous piece of text with uniform attributes)
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub attributes: TextAttributes,
}

impl TextRun {
    pub fn new(text: impl Into<String>, attributes: TextAttributes) -> Self {
        TextRun {
            text: text.into(),
            attributes,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextAttributes::plain())
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this text run at the given character offset
    /// Returns (left_run, right_run)
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let (left, right) = self.text.split_at(byte_offset(&self.text, offset));
        (
            TextRun::new(left, self.attributes.clone()),
            TextRun::new(right, self.attributes.clone()),
        )
    }
}

/// A paragraph: a style plus the runs between two separators
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    runs: Vec<TextRun>,
    /// Attributes reported (and typed with) while the paragraph has no text
    empty_attributes: TextAttributes,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle) -> Self {
        Paragraph {
            style,
            runs: Vec::new(),
            empty_attributes: TextAttributes::default(),
        }
    }

    /// Empty paragraph that types with the given attributes
    pub fn empty_with(style: ParagraphStyle, attributes: TextAttributes) -> Self {
        Paragraph {
            style,
            runs: Vec::new(),
            empty_attributes: attributes,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>, attributes: TextAttributes) -> Self {
        self.runs.push(TextRun::new(text, attributes));
        self.normalize();
        self
    }

    pub fn with_plain_text(self, text: impl Into<String>) -> Self {
        self.with_text(text, TextAttributes::plain())
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Attributes in effect at a local offset: the run ending at or containing it.
    /// At offset 0 the first run wins.
    pub fn attributes_at(&self, offset: usize) -> &TextAttributes {
        let Some(first) = self.runs.first() else {
            return &self.empty_attributes;
        };
        if offset == 0 {
            return &first.attributes;
        }
        let mut pos = 0usize;
        for run in &self.runs {
            pos += run.len();
            if offset <= pos {
                return &run.attributes;
            }
        }
        self.runs
            .last()
            .map(|r| &r.attributes)
            .unwrap_or(&self.empty_attributes)
    }

    /// Make sure a run boundary exists at `offset`; returns the index of the run starting there
    fn split_runs_at(&mut self, offset: usize) -> usize {
        let mut pos = 0usize;
        for i in 0..self.runs.len() {
            if pos == offset {
                return i;
            }
            let len = self.runs[i].len();
            if offset < pos + len {
                let (left, right) = self.runs[i].split_at(offset - pos);
                self.runs[i] = left;
                self.runs.insert(i + 1, right);
                return i + 1;
            }
            pos += len;
        }
        self.runs.len()
    }

    /// Apply an attribute mutation to the runs in [start..end)
    pub fn map_attributes<F>(&mut self, start: usize, end: usize, apply: &mut F)
    where
        F: FnMut(&mut TextAttributes),
    {
        if self.runs.is_empty() {
            apply(&mut self.empty_attributes);
            return;
        }
        let len = self.len();
        let (start, end) = (min(start, len), min(end, len));
        if start >= end {
            return;
        }
        let a = self.split_runs_at(start);
        let b = self.split_runs_at(end);
        for run in &mut self.runs[a..b] {
            apply(&mut run.attributes);
        }
        self.normalize();
    }

    /// Insert text (without separators) at a local offset
    pub fn insert_text(&mut self, offset: usize, text: &str, attributes: TextAttributes) {
        if text.is_empty() {
            return;
        }
        let idx = self.split_runs_at(min(offset, self.len()));
        self.runs.insert(idx, TextRun::new(text, attributes));
        self.normalize();
    }

    /// Delete text in [start..end)
    pub fn delete_text_range(&mut self, start: usize, end: usize) {
        let len = self.len();
        let (start, end) = (min(start, len), min(end, len));
        if start >= end {
            return;
        }
        let a = self.split_runs_at(start);
        let b = self.split_runs_at(end);
        let removed: Vec<TextRun> = self.runs.drain(a..b).collect();
        if self.runs.is_empty() {
            if let Some(first) = removed.into_iter().next() {
                self.empty_attributes = first.attributes;
            }
        }
        self.normalize();
    }

    /// Split at a local offset, returning the right part as a new paragraph with the same style.
    /// The left part remains in self.
    pub fn split_off(&mut self, offset: usize) -> Paragraph {
        let offset = min(offset, self.len());
        let boundary_attributes = self.attributes_at(offset).clone();
        let idx = self.split_runs_at(offset);
        let right_runs = self.runs.split_off(idx);
        if self.runs.is_empty() {
            self.empty_attributes = boundary_attributes.clone();
        }
        let mut right = Paragraph::empty_with(self.style.clone(), boundary_attributes);
        right.runs = right_runs;
        right.normalize();
        right
    }

    /// Append another paragraph's runs, keeping this paragraph's style
    pub fn append(&mut self, other: Paragraph) {
        self.runs.extend(other.runs);
        self.normalize();
    }

    /// Drop empty runs and merge neighbours with identical attributes
    fn normalize(&mut self) {
        let mut merged: Vec<TextRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.attributes == run.attributes => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        if let Some(first) = merged.first() {
            self.empty_attributes = first.attributes.clone();
        }
        self.runs = merged;
    }
}

/// The styled document: a non-empty sequence of paragraphs
#[derive(Debug, Clone, PartialEq)]
pub struct StyledDocument {
    paragraphs: Vec<Paragraph>,
}

impl StyledDocument {
    /// A document holding a single empty paragraph
    pub fn new() -> Self {
        StyledDocument {
            paragraphs: vec![Paragraph::default()],
        }
    }

    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        if paragraphs.is_empty() {
            return Self::new();
        }
        StyledDocument { paragraphs }
    }

    /// Build a document from plain text; every line becomes a paragraph
    pub fn from_plain_text(text: &str, attributes: &TextAttributes, style: &ParagraphStyle) -> Self {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let paragraphs = text
            .split(PARAGRAPH_SEPARATOR)
            .map(|line| {
                Paragraph::empty_with(style.clone(), attributes.clone())
                    .with_text(line, attributes.clone())
            })
            .collect();
        Self::from_paragraphs(paragraphs)
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Flattened text, paragraphs joined by the separator
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_plain_text(&self) -> String {
        self.text()
    }

    /// Length in characters, separators included
    pub fn len(&self) -> usize {
        self.paragraphs.iter().map(|p| p.len()).sum::<usize>() + self.paragraphs.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clamp a range to the document bounds
    pub fn clamp_range(&self, range: TextRange) -> TextRange {
        let len = self.len();
        let start = min(range.location, len);
        let end = min(range.end(), len);
        TextRange::between(start, end)
    }

    /// Offset of the first character of a paragraph
    pub fn paragraph_start(&self, index: usize) -> usize {
        self.paragraphs
            .iter()
            .take(index)
            .map(|p| p.len() + 1)
            .sum()
    }

    /// Map a document offset to (paragraph index, local offset)
    fn locate(&self, offset: usize) -> (usize, usize) {
        let mut pos = 0usize;
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            let len = paragraph.len();
            if offset <= pos + len {
                return (i, offset - pos);
            }
            pos += len + 1;
        }
        let last = self.paragraphs.len() - 1;
        (last, self.paragraphs[last].len())
    }

    /// Index of the paragraph containing the offset
    pub fn paragraph_index_at(&self, offset: usize) -> usize {
        self.locate(offset).0
    }

    /// Content range of every paragraph (separators excluded), in order.
    /// A document ending in a separator reports a trailing empty paragraph.
    pub fn paragraph_ranges(&self) -> Vec<TextRange> {
        let mut ranges = Vec::with_capacity(self.paragraphs.len());
        let mut pos = 0usize;
        for paragraph in &self.paragraphs {
            let len = paragraph.len();
            ranges.push(TextRange::new(pos, len));
            pos += len + 1;
        }
        ranges
    }

    /// Indices of the paragraphs touched by a range. A collapsed range touches its own paragraph.
    pub fn paragraph_indices_in(&self, range: TextRange) -> std::ops::RangeInclusive<usize> {
        let range = self.clamp_range(range);
        let first = self.locate(range.location).0;
        let last = if range.is_empty() {
            first
        } else {
            self.locate(range.end() - 1).0
        };
        first..=last
    }

    /// Content ranges of the paragraphs touched by a range
    pub fn paragraph_ranges_in(&self, range: TextRange) -> Vec<(usize, TextRange)> {
        let ranges = self.paragraph_ranges();
        self.paragraph_indices_in(range)
            .map(|i| (i, ranges[i]))
            .collect()
    }

    /// Content range of the first paragraph touched by a range
    pub fn first_paragraph_range(&self, range: TextRange) -> TextRange {
        let index = *self.paragraph_indices_in(range).start();
        self.paragraph_ranges()[index]
    }

    /// Attributes at a document offset (see [`Paragraph::attributes_at`])
    pub fn attributes_at(&self, offset: usize) -> &TextAttributes {
        let (index, local) = self.locate(offset);
        self.paragraphs[index].attributes_at(local)
    }

    pub fn paragraph_style_at(&self, offset: usize) -> &ParagraphStyle {
        &self.paragraphs[self.paragraph_index_at(offset)].style
    }

    /// Every attribute run with its document range, in order
    pub fn attribute_runs(&self) -> Vec<(TextRange, &TextAttributes)> {
        let mut result = Vec::new();
        let mut pos = 0usize;
        for paragraph in &self.paragraphs {
            for run in &paragraph.runs {
                let len = run.len();
                result.push((TextRange::new(pos, len), &run.attributes));
                pos += len;
            }
            pos += 1;
        }
        result
    }

    /// Attribute runs clipped to a range
    pub fn attribute_runs_in(&self, range: TextRange) -> Vec<(TextRange, &TextAttributes)> {
        self.attribute_runs()
            .into_iter()
            .filter_map(|(r, attrs)| r.intersection(range).map(|clip| (clip, attrs)))
            .collect()
    }

    /// The link covering the whole range, if any
    pub fn hyperlink_in(&self, range: TextRange) -> Option<Url> {
        let range = self.clamp_range(range);
        if range.is_empty() {
            return self.attributes_at(range.location).link.clone();
        }
        let runs = self.attribute_runs_in(range);
        let covered: usize = runs.iter().map(|(r, _)| r.length).sum();
        let separators = self
            .paragraph_indices_in(range)
            .count()
            .saturating_sub(1);
        if covered + separators < range.length {
            return None;
        }
        let first = runs.first()?.1.link.clone()?;
        runs.iter()
            .all(|(_, attrs)| attrs.link.as_ref() == Some(&first))
            .then_some(first)
    }

    /// Per-paragraph local spans covered by a range: (index, start, end)
    fn local_spans(&self, range: TextRange) -> Vec<(usize, usize, usize)> {
        let range = self.clamp_range(range);
        self.paragraph_ranges_in(range)
            .into_iter()
            .map(|(i, para)| {
                let start = range.location.max(para.location) - para.location;
                let end = range.end().min(para.end()).max(para.location) - para.location;
                (i, start, end.max(start))
            })
            .collect()
    }

    /// Apply an attribute mutation to every run inside the range
    pub fn set_attributes<F>(&mut self, range: TextRange, mut apply: F)
    where
        F: FnMut(&mut TextAttributes),
    {
        if range.is_empty() {
            return;
        }
        for (i, start, end) in self.local_spans(range) {
            let paragraph = &mut self.paragraphs[i];
            if paragraph.is_empty() || start < end {
                paragraph.map_attributes(start, end, &mut apply);
            }
        }
    }

    /// Apply a paragraph-style mutation to every paragraph touched by the range
    pub fn set_paragraph_style<F>(&mut self, range: TextRange, mut apply: F)
    where
        F: FnMut(&mut ParagraphStyle),
    {
        for i in self.paragraph_indices_in(range) {
            apply(&mut self.paragraphs[i].style);
        }
    }

    /// Apply a mutation to every run and empty paragraph in the document
    pub fn set_all_attributes<F>(&mut self, apply: F)
    where
        F: FnMut(&mut TextAttributes),
    {
        let mut apply = apply;
        for paragraph in &mut self.paragraphs {
            let len = paragraph.len();
            paragraph.map_attributes(0, len, &mut apply);
        }
    }

    /// Insert text at an offset. Separators in the text start new paragraphs
    /// that inherit the style of the paragraph they split. Returns the number of
    /// characters inserted.
    pub fn insert_text(&mut self, offset: usize, text: &str, attributes: &TextAttributes) -> usize {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if text.is_empty() {
            return 0;
        }
        let (index, local) = self.locate(offset);
        let pieces: Vec<&str> = text.split(PARAGRAPH_SEPARATOR).collect();

        if pieces.len() == 1 {
            self.paragraphs[index].insert_text(local, &text, attributes.clone());
            return char_len(&text);
        }

        let mut tail = self.paragraphs[index].split_off(local);
        self.paragraphs[index].insert_text(local, pieces[0], attributes.clone());
        let style = self.paragraphs[index].style.clone();

        let mut inserted: Vec<Paragraph> = pieces[1..pieces.len() - 1]
            .iter()
            .map(|piece| {
                Paragraph::empty_with(style.clone(), attributes.clone())
                    .with_text(*piece, attributes.clone())
            })
            .collect();
        if tail.is_empty() {
            tail.empty_attributes = attributes.clone();
        }
        tail.insert_text(0, pieces[pieces.len() - 1], attributes.clone());
        inserted.push(tail);

        let at = index + 1;
        self.paragraphs.splice(at..at, inserted);
        char_len(&text)
    }

    /// Delete the characters in a range, merging paragraphs whose separator is removed
    pub fn delete_range(&mut self, range: TextRange) {
        let range = self.clamp_range(range);
        if range.is_empty() {
            return;
        }
        let (a, la) = self.locate(range.location);
        let (b, lb) = self.locate(range.end());

        if a == b {
            self.paragraphs[a].delete_text_range(la, lb);
            return;
        }

        let len = self.paragraphs[a].len();
        self.paragraphs[a].delete_text_range(la, len);
        let tail = self.paragraphs[b].split_off(lb);
        self.paragraphs.drain(a + 1..=b);
        self.paragraphs[a].append(tail);
    }

    /// Copy of the content inside a range as a standalone document
    pub fn slice(&self, range: TextRange) -> StyledDocument {
        let range = self.clamp_range(range);
        let (a, la) = self.locate(range.location);
        let (b, lb) = self.locate(range.end());

        let mut paragraphs: Vec<Paragraph> = self.paragraphs[a..=b].to_vec();
        if let Some(last) = paragraphs.last_mut() {
            last.split_off(lb);
        }
        if let Some(first) = paragraphs.first_mut() {
            *first = first.split_off(la);
        }
        Self::from_paragraphs(paragraphs)
    }

    /// Insert another document at an offset. The first inserted paragraph merges into
    /// the destination paragraph; the text after the offset ends up after the last
    /// inserted paragraph. Returns the number of characters inserted.
    pub fn insert_document(&mut self, offset: usize, other: &StyledDocument) -> usize {
        let inserted_len = other.len();
        let (index, local) = self.locate(offset);
        let tail = self.paragraphs[index].split_off(local);

        let mut incoming = other.paragraphs.clone().into_iter();
        if let Some(first) = incoming.next() {
            self.paragraphs[index].append(first);
        }
        let mut rest: Vec<Paragraph> = incoming.collect();
        match rest.last_mut() {
            Some(last) => last.append(tail),
            None => self.paragraphs[index].append(tail),
        }
        let at = index + 1;
        self.paragraphs.splice(at..at, rest);
        inserted_len
    }
}

impl Default for StyledDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StyledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "StyledDocument ({} paragraphs):", self.paragraphs.len())?;
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            write!(f, "  [{}] ", i)?;
            match paragraph.style.list {
                ListKind::None => write!(f, "Paragraph")?,
                ListKind::Bulleted => write!(f, "Bulleted")?,
                ListKind::Numbered => write!(f, "Numbered")?,
            }
            if paragraph.style.alignment != TextAlignment::Natural {
                write!(f, "({:?})", paragraph.style.alignment)?;
            }
            writeln!(f, ": {:?}", paragraph.text())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> StyledDocument {
        StyledDocument::from_paragraphs(
            lines
                .iter()
                .map(|l| Paragraph::default().with_plain_text(*l))
                .collect(),
        )
    }

    #[test]
    fn test_text_run_split_uses_characters() {
        let run = TextRun::plain("héllo wörld");
        assert_eq!(run.len(), 11);

        let (left, right) = run.split_at(5);
        assert_eq!(left.text, "héllo");
        assert_eq!(right.text, " wörld");
    }

    #[test]
    fn test_range_end_saturates_and_clamps() {
        let huge = TextRange::new(usize::MAX, 1);
        assert_eq!(huge.end(), usize::MAX);
        let d = doc(&["ab", "c"]);
        assert_eq!(d.clamp_range(huge), TextRange::caret(4));
        assert_eq!(d.clamp_range(TextRange::new(1, usize::MAX)), TextRange::new(1, 3));
        assert_eq!(huge.intersection(TextRange::new(0, 4)), None);
    }

    #[test]
    fn test_paragraph_ranges_include_trailing_empty_paragraph() {
        let d = StyledDocument::from_plain_text("ab\n\ncd\n", &TextAttributes::plain(), &ParagraphStyle::default());
        assert_eq!(d.paragraph_count(), 4);
        assert_eq!(
            d.paragraph_ranges(),
            vec![
                TextRange::new(0, 2),
                TextRange::new(3, 0),
                TextRange::new(4, 2),
                TextRange::new(7, 0),
            ]
        );
        assert_eq!(d.len(), 7);
        assert_eq!(d.text(), "ab\n\ncd\n");
    }

    #[test]
    fn test_paragraph_indices_for_selection_ending_after_separator() {
        let d = doc(&["abc", "def"]);
        assert_eq!(d.paragraph_indices_in(TextRange::new(0, 4)), 0..=0);
        assert_eq!(d.paragraph_indices_in(TextRange::new(2, 3)), 0..=1);
        assert_eq!(d.paragraph_indices_in(TextRange::caret(4)), 1..=1);
    }

    #[test]
    fn test_set_attributes_splits_and_coalesces_runs() {
        let mut d = doc(&["hello world"]);
        d.set_attributes(TextRange::new(0, 5), |a| a.font.traits.bold = true);
        assert_eq!(d.paragraphs()[0].runs().len(), 2);
        assert!(d.attributes_at(3).is_bold());
        assert!(!d.attributes_at(7).is_bold());

        d.set_attributes(TextRange::new(0, 5), |a| a.font.traits.bold = false);
        assert_eq!(d.paragraphs()[0].runs().len(), 1);
    }

    #[test]
    fn test_attributes_at_run_boundary_prefers_preceding_run() {
        let d = StyledDocument::from_paragraphs(vec![
            Paragraph::default()
                .with_text("bold", TextAttributes::bold())
                .with_plain_text(" plain"),
        ]);
        assert!(d.attributes_at(4).is_bold());
        assert!(!d.attributes_at(5).is_bold());
        assert!(d.attributes_at(0).is_bold());
    }

    #[test]
    fn test_insert_text_with_newlines_splits_paragraph() {
        let mut d = doc(&["Hello world"]);
        d.set_paragraph_style(TextRange::caret(0), |s| s.list = ListKind::Bulleted);
        let inserted = d.insert_text(5, ",\nnew\n", &TextAttributes::plain());
        assert_eq!(inserted, 6);
        assert_eq!(d.text(), "Hello,\nnew\n world");
        assert_eq!(d.paragraph_count(), 3);
        assert!(d.paragraphs().iter().all(|p| p.style.list == ListKind::Bulleted));
    }

    #[test]
    fn test_delete_range_within_paragraph() {
        let mut d = doc(&["Hello world"]);
        d.delete_range(TextRange::new(5, 6));
        assert_eq!(d.text(), "Hello");
    }

    #[test]
    fn test_delete_range_across_paragraphs_merges() {
        let mut d = doc(&["First para", "Second", "Third para"]);
        // "Fir|st para" .. "Th|ird para"
        d.delete_range(TextRange::between(3, 20));
        assert_eq!(d.paragraph_count(), 1);
        assert_eq!(d.text(), "Firird para");
    }

    #[test]
    fn test_deleting_all_text_keeps_attributes_for_typing() {
        let mut d = StyledDocument::from_paragraphs(vec![
            Paragraph::default().with_text("bold", TextAttributes::bold()),
        ]);
        d.delete_range(TextRange::new(0, 4));
        assert!(d.is_empty());
        assert!(d.attributes_at(0).is_bold());
    }

    #[test]
    fn test_slice_and_insert_document() {
        let d = doc(&["one two", "three four"]);
        let piece = d.slice(TextRange::new(4, 9));
        assert_eq!(piece.text(), "two\nthree");

        let mut target = doc(&["[]"]);
        let n = target.insert_document(1, &piece);
        assert_eq!(n, 9);
        assert_eq!(target.text(), "[two\nthree]");
    }

    #[test]
    fn test_hyperlink_in_requires_full_coverage() {
        let url = Url::parse("https://example.com/").unwrap();
        let d = StyledDocument::from_paragraphs(vec![
            Paragraph::default()
                .with_text("link", TextAttributes::plain().with_link(url.clone()))
                .with_plain_text(" text"),
        ]);
        assert_eq!(d.hyperlink_in(TextRange::new(0, 4)), Some(url.clone()));
        assert_eq!(d.hyperlink_in(TextRange::new(1, 2)), Some(url));
        assert_eq!(d.hyperlink_in(TextRange::new(0, 6)), None);
    }

    #[test]
    fn test_color_css_round_trip() {
        assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
        assert_eq!(Color::from_css("#ff0010"), Some(Color::rgb(255, 0, 16)));
        assert_eq!(Color::from_css("#f00"), Some(Color::rgb(255, 0, 0)));
        let translucent = Color::rgba(10, 20, 30, 128);
        assert_eq!(translucent.to_css(), "rgba(10, 20, 30, 0.502)");
        assert_eq!(Color::from_css(&translucent.to_css()), Some(translucent));
        assert_eq!(Color::from_css("rgb(1, 2, 3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(Color::from_css("not a color"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(10.5), "10.5");
        assert_eq!(format_number(0.0), "0");
    }
}
