// Text Format
// Point-in-time snapshot of the formatting at a location or selection

use super::styled_document::*;
use url::Url;

/// Formatting state reported to hosts on every selection change.
///
/// Every field is derived from the document; nothing here is stored back.
/// Bold and italic come from the font's traits, underline and strikethrough
/// from the line-style attributes, and the two list flags from the
/// paragraph's [`ListKind`], so at most one of them is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextFormat {
    pub font: Option<Font>,
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_underline: bool,
    pub is_strikethrough: bool,
    pub is_bulleted_list: bool,
    pub is_numbered_list: bool,
    pub hyperlink_enabled: bool,
    pub hyperlink: Option<Url>,
    pub text_alignment: TextAlignment,
    pub text_color: Option<Color>,
    pub text_background_color: Option<Color>,
}

impl TextFormat {
    /// Build a snapshot from a set of character attributes and a paragraph style
    pub fn from_attributes(attributes: &TextAttributes, style: &ParagraphStyle) -> Self {
        TextFormat {
            font: Some(attributes.font.clone()),
            is_bold: attributes.is_bold(),
            is_italic: attributes.is_italic(),
            is_underline: attributes.underline,
            is_strikethrough: attributes.strikethrough,
            is_bulleted_list: style.list == ListKind::Bulleted,
            is_numbered_list: style.list == ListKind::Numbered,
            hyperlink_enabled: attributes.link.is_some(),
            hyperlink: attributes.link.clone(),
            text_alignment: style.alignment,
            text_color: attributes.text_color,
            text_background_color: attributes.background_color,
        }
    }

    /// Format at a single document location
    pub fn at(doc: &StyledDocument, location: usize) -> Self {
        Self::from_attributes(doc.attributes_at(location), doc.paragraph_style_at(location))
    }

    /// Format for a selection: attributes of the first selected character,
    /// paragraph style of the first touched paragraph, and a hyperlink only
    /// when one link covers the whole selection.
    pub fn for_range(doc: &StyledDocument, range: TextRange) -> Self {
        let range = doc.clamp_range(range);
        if range.is_empty() {
            return Self::at(doc, range.location);
        }
        // The run before `location + 1` is the one holding the first selected character
        let mut format = Self::at(doc, range.location + 1);
        format.text_alignment = doc.paragraph_style_at(range.location).alignment;
        let style = doc.paragraph_style_at(range.location);
        format.is_bulleted_list = style.list == ListKind::Bulleted;
        format.is_numbered_list = style.list == ListKind::Numbered;
        format.hyperlink = doc.hyperlink_in(range);
        format.hyperlink_enabled = format.hyperlink.is_some();
        format
    }

    /// Point size of the reported font, if any
    pub fn font_size(&self) -> Option<f32> {
        self.font.as_ref().map(|f| f.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StyledDocument {
        let url = Url::parse("https://example.org/").unwrap();
        StyledDocument::from_paragraphs(vec![
            Paragraph::default()
                .with_text("bold", TextAttributes::bold())
                .with_plain_text(" ")
                .with_text("link", TextAttributes::plain().with_link(url)),
            Paragraph::new(ParagraphStyle::default().with_list(ListKind::Numbered))
                .with_plain_text("item"),
        ])
    }

    #[test]
    fn test_bold_is_derived_from_font() {
        let doc = sample();
        let format = TextFormat::for_range(&doc, TextRange::new(0, 4));
        assert!(format.is_bold);
        assert!(format.font.as_ref().unwrap().is_bold());
        assert!(!format.is_italic);
    }

    #[test]
    fn test_selection_uses_first_selected_character() {
        let doc = sample();
        // Starts right after the bold run: the first selected character is the plain space
        let format = TextFormat::for_range(&doc, TextRange::new(4, 2));
        assert!(!format.is_bold);
    }

    #[test]
    fn test_hyperlink_requires_whole_selection() {
        let doc = sample();
        let on_link = TextFormat::for_range(&doc, TextRange::new(5, 4));
        assert!(on_link.hyperlink_enabled);
        assert_eq!(on_link.hyperlink.unwrap().as_str(), "https://example.org/");

        let partial = TextFormat::for_range(&doc, TextRange::new(3, 6));
        assert!(!partial.hyperlink_enabled);
        assert!(partial.hyperlink.is_none());
    }

    #[test]
    fn test_list_flags_are_exclusive() {
        let doc = sample();
        let format = TextFormat::at(&doc, 12);
        assert!(format.is_numbered_list);
        assert!(!format.is_bulleted_list);

        let plain = TextFormat::at(&doc, 0);
        assert!(!plain.is_numbered_list && !plain.is_bulleted_list);
        assert!(plain.text_color.is_none());
    }
}
