// List Layout
// Render-time bullet and numbering markers for list paragraphs.
// Markers are derived from paragraph styles on every pass and never stored in the text.

use super::styled_document::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Glyph drawn in front of bulleted paragraphs
pub const BULLET_STRING: &str = "\u{2022}";

/// Separator between a marker and the paragraph text in plain-text renderings
pub const INDENTATION_STRING: &str = "\t";

const ENCODED_BULLET: &str = "\u{200B}rte-bullet\u{200B}";
const ENCODED_NUMBERING: &str = "\u{200B}rte-numbering\u{200B}";

/// Marker text of the n-th (1-based) item of a numbered list
pub fn numbering_string(ordinal: usize) -> String {
    format!("{ordinal}.")
}

impl ListKind {
    /// Invisible identifier for the list kind, usable as a tag outside the text
    pub fn encoded_marker(self) -> Option<&'static str> {
        match self {
            ListKind::None => None,
            ListKind::Bulleted => Some(ENCODED_BULLET),
            ListKind::Numbered => Some(ENCODED_NUMBERING),
        }
    }

    pub fn from_encoded_marker(marker: &str) -> Option<ListKind> {
        match marker {
            ENCODED_BULLET => Some(ListKind::Bulleted),
            ENCODED_NUMBERING => Some(ListKind::Numbered),
            _ => None,
        }
    }
}

/// Configurable geometry and color of list markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListLayoutSettings {
    /// Marker color; `None` uses the paragraph's first text color
    pub marker_color: Option<Color>,
    /// Gap between the right edge of a marker and the paragraph text
    pub bullet_numbering_indent: f32,
    /// Extra indentation of list paragraphs, where the text starts
    pub first_line_head_indent: f32,
    /// Head indent per nesting level
    pub indent_step: f32,
}

impl Default for ListLayoutSettings {
    fn default() -> Self {
        ListLayoutSettings {
            marker_color: None,
            bullet_numbering_indent: 15.0,
            first_line_head_indent: 52.0,
            indent_step: 30.0,
        }
    }
}

/// List metadata of one paragraph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphListState {
    pub paragraph_index: usize,
    pub indent_level: usize,
    pub kind: ListKind,
    /// 1-based position in the list run; only set for numbered paragraphs
    pub ordinal: Option<usize>,
}

impl ParagraphListState {
    /// Visible marker text, if the paragraph is a list item
    pub fn marker(&self) -> Option<String> {
        match self.kind {
            ListKind::None => None,
            ListKind::Bulleted => Some(BULLET_STRING.to_string()),
            ListKind::Numbered => self.ordinal.map(numbering_string),
        }
    }
}

impl fmt::Display for ParagraphListState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] level {}", self.paragraph_index, self.indent_level)?;
        if let Some(marker) = self.marker() {
            write!(f, " {marker}")?;
        }
        Ok(())
    }
}

fn indent_level(style: &ParagraphStyle, step: f32) -> usize {
    if step <= 0.0 || style.head_indent <= 0.0 {
        return 0;
    }
    (style.head_indent / step).round() as usize
}

/// List state of every paragraph, computed in one forward pass
pub fn list_states(doc: &StyledDocument, settings: &ListLayoutSettings) -> Vec<ParagraphListState> {
    let mut states = Vec::with_capacity(doc.paragraph_count());
    let mut run_length = 0usize;

    for (i, paragraph) in doc.paragraphs().iter().enumerate() {
        let kind = paragraph.style.list;
        run_length = if kind == ListKind::Numbered {
            run_length + 1
        } else {
            0
        };
        states.push(ParagraphListState {
            paragraph_index: i,
            indent_level: indent_level(&paragraph.style, settings.indent_step),
            kind,
            ordinal: (kind == ListKind::Numbered).then_some(run_length),
        });
    }

    states
}

/// Ordinal of a single numbered paragraph, found by scanning back through its list run
pub fn ordinal_at(doc: &StyledDocument, paragraph_index: usize) -> Option<usize> {
    let paragraphs = doc.paragraphs();
    if paragraphs.get(paragraph_index)?.style.list != ListKind::Numbered {
        return None;
    }
    let preceding = paragraphs[..paragraph_index]
        .iter()
        .rev()
        .take_while(|p| p.style.list == ListKind::Numbered)
        .count();
    Some(preceding + 1)
}

/// Drawing backend for list markers
pub trait MarkerPainter {
    fn set_color(&mut self, color: Color);
    fn set_font(&mut self, font: &Font);
    fn text_width(&mut self, text: &str, font: &Font) -> f32;
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
}

/// A marker to draw in front of a paragraph's first line
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerAnnotation {
    pub paragraph_index: usize,
    pub text: String,
    /// Right edge of the marker, relative to the paragraph's line fragment origin
    pub x: f32,
    pub color: Color,
    pub font: Font,
}

/// Where a paragraph's first line and wrapped lines start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveIndents {
    pub first_line: f32,
    pub head: f32,
}

/// Computes and draws list markers without touching the document
#[derive(Debug, Clone, Default)]
pub struct ListMarkerLayout {
    pub settings: ListLayoutSettings,
}

impl ListMarkerLayout {
    pub fn new(settings: ListLayoutSettings) -> Self {
        ListMarkerLayout { settings }
    }

    /// Text indentation a paragraph is laid out with. List items make room for
    /// their marker on every line so wrapped lines align with the first one.
    pub fn effective_indents(&self, style: &ParagraphStyle) -> EffectiveIndents {
        if style.is_list() {
            let indent = style.head_indent + self.settings.first_line_head_indent;
            EffectiveIndents {
                first_line: indent,
                head: indent,
            }
        } else {
            EffectiveIndents {
                first_line: style.first_line_head_indent,
                head: style.head_indent,
            }
        }
    }

    /// Markers for every list paragraph. `font` is used for paragraphs
    /// without text; otherwise the font of the first run is kept, minus its traits.
    pub fn annotations(&self, doc: &StyledDocument, font: &Font) -> Vec<MarkerAnnotation> {
        list_states(doc, &self.settings)
            .into_iter()
            .filter_map(|state| {
                let text = state.marker()?;
                let paragraph = doc.paragraph(state.paragraph_index)?;
                let attributes = paragraph.attributes_at(0);
                let marker_font = if paragraph.is_empty() {
                    font.clone()
                } else {
                    attributes.font.clone().with_bold(false).with_italic(false)
                };
                let color = self
                    .settings
                    .marker_color
                    .or(attributes.text_color)
                    .unwrap_or(Color::BLACK);
                Some(MarkerAnnotation {
                    paragraph_index: state.paragraph_index,
                    text,
                    x: paragraph.style.head_indent + self.settings.first_line_head_indent
                        - self.settings.bullet_numbering_indent,
                    color,
                    font: marker_font,
                })
            })
            .collect()
    }

    /// Draw markers for the paragraphs the host has laid out. `origins` maps
    /// paragraph indices to the baseline origin of their first line fragment.
    pub fn draw<P: MarkerPainter>(
        &self,
        doc: &StyledDocument,
        font: &Font,
        origins: &[(usize, f32, f32)],
        painter: &mut P,
    ) -> usize {
        let annotations = self.annotations(doc, font);
        let mut drawn = 0;

        for &(index, origin_x, origin_y) in origins {
            let Some(annotation) = annotations.iter().find(|a| a.paragraph_index == index) else {
                continue;
            };
            painter.set_color(annotation.color);
            painter.set_font(&annotation.font);
            let width = painter.text_width(&annotation.text, &annotation.font);
            painter.draw_text(&annotation.text, origin_x + annotation.x - width, origin_y);
            drawn += 1;
        }

        drawn
    }

    /// Plain-text rendering with markers, one paragraph per line
    pub fn render_plain_text(&self, doc: &StyledDocument) -> String {
        let states = list_states(doc, &self.settings);
        doc.paragraphs()
            .iter()
            .zip(states)
            .map(|(paragraph, state)| {
                let indent = INDENTATION_STRING.repeat(state.indent_level);
                match state.marker() {
                    Some(marker) => {
                        format!("{indent}{marker}{INDENTATION_STRING}{}", paragraph.text())
                    }
                    None => format!("{indent}{}", paragraph.text()),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_doc(kinds: &[ListKind]) -> StyledDocument {
        StyledDocument::from_paragraphs(
            kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| {
                    Paragraph::new(ParagraphStyle::default().with_list(*kind))
                        .with_plain_text(format!("item {i}"))
                })
                .collect(),
        )
    }

    struct RecordingPainter {
        calls: Vec<String>,
    }

    impl MarkerPainter for RecordingPainter {
        fn set_color(&mut self, color: Color) {
            self.calls.push(format!("color {color}"));
        }

        fn set_font(&mut self, font: &Font) {
            self.calls.push(format!("font {} {}", font.family, font.size));
        }

        fn text_width(&mut self, text: &str, _font: &Font) -> f32 {
            text.chars().count() as f32 * 6.0
        }

        fn draw_text(&mut self, text: &str, x: f32, y: f32) {
            self.calls.push(format!("text {text} at {x},{y}"));
        }
    }

    #[test]
    fn test_ordinals_restart_after_break() {
        use ListKind::*;
        let doc = list_doc(&[
            Numbered, Numbered, Numbered, Numbered, Numbered, None, Numbered, Numbered,
        ]);
        let ordinals: Vec<Option<usize>> = list_states(&doc, &ListLayoutSettings::default())
            .iter()
            .map(|s| s.ordinal)
            .collect();
        assert_eq!(
            ordinals,
            vec![
                Some(1),
                Some(2),
                Some(3),
                Some(4),
                Some(5),
                Option::None,
                Some(1),
                Some(2)
            ]
        );
        for (i, expected) in ordinals.iter().enumerate() {
            assert_eq!(ordinal_at(&doc, i), *expected);
        }
    }

    #[test]
    fn test_bulleted_paragraph_breaks_numbering() {
        use ListKind::*;
        let doc = list_doc(&[Numbered, Bulleted, Numbered]);
        assert_eq!(ordinal_at(&doc, 2), Some(1));
        assert_eq!(ordinal_at(&doc, 1), Option::None);
    }

    #[test]
    fn test_encoded_markers() {
        for kind in [ListKind::Bulleted, ListKind::Numbered] {
            let marker = kind.encoded_marker().unwrap();
            assert!(marker.starts_with('\u{200B}'));
            assert_eq!(ListKind::from_encoded_marker(marker), Some(kind));
        }
        assert_eq!(ListKind::None.encoded_marker(), None);
        assert_eq!(ListKind::from_encoded_marker(BULLET_STRING), None);
    }

    #[test]
    fn test_annotations_position_and_color() {
        let mut doc = list_doc(&[ListKind::Bulleted, ListKind::None]);
        doc.set_paragraph_style(TextRange::caret(0), |s| s.head_indent = 30.0);
        let layout = ListMarkerLayout::new(ListLayoutSettings {
            marker_color: Some(Color::rgb(200, 0, 0)),
            ..Default::default()
        });
        let annotations = layout.annotations(&doc, &Font::default());
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].text, BULLET_STRING);
        assert_eq!(annotations[0].x, 30.0 + 52.0 - 15.0);
        assert_eq!(annotations[0].color, Color::rgb(200, 0, 0));

        let indents = layout.effective_indents(&doc.paragraphs()[0].style);
        assert_eq!(indents.first_line, 82.0);
        assert_eq!(indents.head, 82.0);
        let plain = layout.effective_indents(&doc.paragraphs()[1].style);
        assert_eq!(plain.first_line, 0.0);
    }

    #[test]
    fn test_draw_right_aligns_markers_and_leaves_document_alone() {
        let doc = list_doc(&[ListKind::Numbered, ListKind::Numbered]);
        let before = doc.clone();
        let layout = ListMarkerLayout::default();
        let mut painter = RecordingPainter { calls: Vec::new() };

        let drawn = layout.draw(&doc, &Font::default(), &[(1, 10.0, 40.0)], &mut painter);
        assert_eq!(drawn, 1);
        assert_eq!(
            painter.calls,
            vec![
                "color #000000".to_string(),
                "font Helvetica 12".to_string(),
                "text 2. at 35,40".to_string(),
            ]
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_render_plain_text() {
        let mut doc = list_doc(&[ListKind::Bulleted, ListKind::Numbered, ListKind::None]);
        doc.set_paragraph_style(TextRange::caret(7), |s| s.head_indent = 30.0);
        let text = ListMarkerLayout::default().render_plain_text(&doc);
        assert_eq!(text, "\u{2022}\titem 0\n\t1.\titem 1\nitem 2");
    }
}
