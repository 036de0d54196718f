// Rich Text Editor
// Headless editing controller: owns the styled document and the selection,
// turns user intents into document mutations and reports them to a host.

use super::html_converter::{document_from_html, html_from_document, is_html};
use super::list_layout::BULLET_STRING;
use super::preview_change::{PreviewChange, Shortcuts};
use super::styled_document::*;
use super::text_format::TextFormat;
use crate::error::{EditError, EditResult};
use crate::settings::EditorSettings;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Clipboard type tag of content copied out of this editor
pub const PASTEBOARD_DATA_TYPE: &str = "net.roblillack.rich-text-editor.html";

const DEFAULT_LEVELS_OF_UNDO: usize = 10;

/// Callbacks into the host. Every method has a no-op default.
pub trait RichTextEditorDelegate {
    fn became_first_responder(&mut self) {}
    fn resigned_first_responder(&mut self) {}
    fn selection_changed(&mut self, _range: TextRange, _format: &TextFormat) {}
    /// Return true to claim the event; the editor then ignores it
    fn key_down(&mut self, _event: &KeyEvent) -> bool {
        false
    }
    fn change_about_to_occur(&mut self, _change: PreviewChange) {}
    fn text_did_change(&mut self) {}
    fn handles_undo_redo(&self) -> bool {
        false
    }
    fn performed_undo(&mut self) {}
    fn performed_redo(&mut self) {}
}

/// Host-provided configuration queried on demand
pub trait RichTextEditorDataSource {
    fn levels_of_undo(&self) -> usize {
        DEFAULT_LEVELS_OF_UNDO
    }
    fn enabled_keyboard_shortcuts(&self) -> Shortcuts {
        Shortcuts::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub command: bool,
    pub option: bool,
    pub control: bool,
}

/// A key press as delivered by the host toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        KeyEvent {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_command(mut self) -> Self {
        self.modifiers.command = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// Content offered to or taken from the clipboard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipboardContents {
    /// Tag identifying the producer of the rich content
    pub type_tag: Option<String>,
    pub html: Option<String>,
    pub plain: Option<String>,
}

impl ClipboardContents {
    pub fn plain_text(text: impl Into<String>) -> Self {
        ClipboardContents {
            plain: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn html(html: impl Into<String>, type_tag: Option<&str>) -> Self {
        ClipboardContents {
            type_tag: type_tag.map(str::to_string),
            html: Some(html.into()),
            plain: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphIndentation {
    Increase,
    Decrease,
}

/// The editor controller
pub struct RichTextEditor {
    document: StyledDocument,
    selection: TextRange,
    /// Fixed end of the selection while extending with the mouse or shift+arrows
    anchor: usize,
    typing_attributes: TextAttributes,
    settings: EditorSettings,
    defaults: DefaultAttributes,
    delegate: Option<Box<dyn RichTextEditorDelegate>>,
    data_source: Option<Box<dyn RichTextEditorDataSource>>,
    placeholder: Option<StyledDocument>,
    has_focus: bool,
    last_single_key_pressed: Option<char>,
}

impl RichTextEditor {
    /// Create an editor with an empty document and default settings
    pub fn new() -> Self {
        Self::with_settings(EditorSettings::default(), DefaultAttributes::default())
    }

    pub fn with_settings(settings: EditorSettings, defaults: DefaultAttributes) -> Self {
        let document = StyledDocument::from_paragraphs(vec![Paragraph::empty_with(
            defaults.paragraph_style.clone(),
            defaults.text_attributes(),
        )]);
        RichTextEditor {
            typing_attributes: defaults.text_attributes(),
            document,
            selection: TextRange::default(),
            anchor: 0,
            settings: settings.normalized(),
            defaults,
            delegate: None,
            data_source: None,
            placeholder: None,
            has_focus: false,
            last_single_key_pressed: None,
        }
    }

    /// Create an editor with an existing document
    pub fn with_document(document: StyledDocument) -> Self {
        let mut editor = Self::new();
        editor.set_document(document);
        editor
    }

    pub fn set_delegate(&mut self, delegate: Box<dyn RichTextEditorDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn set_data_source(&mut self, data_source: Box<dyn RichTextEditorDataSource>) {
        self.data_source = Some(data_source);
    }

    pub fn document(&self) -> &StyledDocument {
        &self.document
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.settings = settings.normalized();
    }

    pub fn defaults(&self) -> &DefaultAttributes {
        &self.defaults
    }

    pub fn selection(&self) -> TextRange {
        self.selection
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Attributes applied to text typed at a collapsed selection
    pub fn typing_attributes(&self) -> &TextAttributes {
        &self.typing_attributes
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Last character typed without command or control held
    pub fn last_single_key_pressed(&self) -> Option<char> {
        self.last_single_key_pressed
    }

    pub fn bullet_string(&self) -> &'static str {
        BULLET_STRING
    }

    pub fn set_placeholder(&mut self, placeholder: Option<StyledDocument>) {
        self.placeholder = placeholder;
    }

    /// The placeholder to show, present only while the document is empty
    pub fn visible_placeholder(&self) -> Option<&StyledDocument> {
        self.placeholder
            .as_ref()
            .filter(|_| self.document.is_empty())
    }

    pub fn levels_of_undo(&self) -> usize {
        self.data_source
            .as_ref()
            .map(|source| source.levels_of_undo())
            .unwrap_or(DEFAULT_LEVELS_OF_UNDO)
    }

    pub fn is_html(text: &str) -> bool {
        is_html(text)
    }

    /// Formatting at the selection. A collapsed selection reports the typing attributes.
    pub fn current_format(&self) -> TextFormat {
        if self.selection.is_empty() {
            TextFormat::from_attributes(
                &self.typing_attributes,
                self.document.paragraph_style_at(self.selection.location),
            )
        } else {
            TextFormat::for_range(&self.document, self.selection)
        }
    }

    // ── Notifications ──────────────────────────────────────────────

    fn send_preview_change(&mut self, change: PreviewChange) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.change_about_to_occur(change);
        }
    }

    fn send_text_changed(&mut self) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.text_did_change();
        }
    }

    fn send_selection_changed(&mut self) {
        let format = self.current_format();
        let range = self.selection;
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.selection_changed(range, &format);
        }
    }

    /// Announce a change, apply it, then report the new text and format
    fn perform<F>(&mut self, change: PreviewChange, edit: F)
    where
        F: FnOnce(&mut Self),
    {
        tracing::debug!(%change, selection = ?self.selection, "applying edit");
        self.send_preview_change(change);
        edit(self);
        self.send_text_changed();
        self.send_selection_changed();
    }

    // ── Selection ──────────────────────────────────────────────────

    fn place_selection(&mut self, anchor: usize, head: usize) {
        let range = self.document.clamp_range(TextRange::between(anchor, head));
        self.selection = range;
        self.anchor = anchor.min(self.document.len());
        self.typing_attributes = if range.is_empty() {
            self.document.attributes_at(range.location).clone()
        } else {
            self.document.attributes_at(range.location + 1).clone()
        };
    }

    /// Move the caret after typing, keeping the attributes the text was typed with
    fn place_caret_after_typing(&mut self, offset: usize) {
        let attributes = self.typing_attributes.clone();
        self.place_selection(offset, offset);
        self.typing_attributes = attributes;
    }

    /// Select a range and report the new format to the delegate
    pub fn select(&mut self, range: TextRange) {
        self.place_selection(range.location, range.end());
        self.send_selection_changed();
    }

    pub fn set_selection(&mut self, range: TextRange) {
        self.select(range);
    }

    pub fn select_all(&mut self) {
        self.select(TextRange::new(0, self.document.len()));
    }

    /// The moving end of the selection
    fn selection_head(&self) -> usize {
        if self.selection.location == self.anchor {
            self.selection.end()
        } else {
            self.selection.location
        }
    }

    pub fn mouse_down(&mut self, offset: usize) {
        self.send_preview_change(PreviewChange::MouseDown);
        self.select(TextRange::caret(offset));
    }

    pub fn mouse_dragged(&mut self, offset: usize) {
        self.send_preview_change(PreviewChange::MouseDragged);
        let anchor = self.anchor;
        self.place_selection(anchor, offset);
        self.send_selection_changed();
    }

    fn move_caret(&mut self, key: Key, extend: bool) {
        self.send_preview_change(PreviewChange::ArrowKey);
        let head = self.selection_head();
        let collapsing = !extend && !self.selection.is_empty();

        let target = match key {
            Key::Left if collapsing => self.selection.location,
            Key::Right if collapsing => self.selection.end(),
            Key::Left => self.previous_boundary(head),
            Key::Right => self.next_boundary(head),
            Key::Up | Key::Down => self.vertical_target(head, key == Key::Up),
            _ => head,
        };

        if extend {
            let anchor = self.anchor;
            self.place_selection(anchor, target);
        } else {
            self.place_selection(target, target);
        }
        self.send_selection_changed();
    }

    /// Same local offset in the previous or next paragraph
    fn vertical_target(&self, offset: usize, up: bool) -> usize {
        let index = self.document.paragraph_index_at(offset);
        let local = offset - self.document.paragraph_start(index);
        let target = if up {
            match index.checked_sub(1) {
                Some(previous) => previous,
                None => return 0,
            }
        } else if index + 1 < self.document.paragraph_count() {
            index + 1
        } else {
            return self.document.len();
        };
        let length = self.document.paragraph(target).map_or(0, |p| p.len());
        self.document.paragraph_start(target) + local.min(length)
    }

    /// Offset of the grapheme boundary before `offset`
    fn previous_boundary(&self, offset: usize) -> usize {
        if offset == 0 {
            return 0;
        }
        let index = self.document.paragraph_index_at(offset);
        let start = self.document.paragraph_start(index);
        if offset == start {
            return offset - 1;
        }
        let text = self.document.paragraph(index).map(|p| p.text()).unwrap_or_default();
        let prefix = &text[..byte_offset(&text, offset - start)];
        let last = prefix.graphemes(true).next_back().map_or(1, char_len);
        offset - last
    }

    /// Offset of the grapheme boundary after `offset`
    fn next_boundary(&self, offset: usize) -> usize {
        let len = self.document.len();
        if offset >= len {
            return len;
        }
        let index = self.document.paragraph_index_at(offset);
        let start = self.document.paragraph_start(index);
        let text = self.document.paragraph(index).map(|p| p.text()).unwrap_or_default();
        let local = offset - start;
        if local >= char_len(&text) {
            return offset + 1;
        }
        let suffix = &text[byte_offset(&text, local)..];
        let first = suffix.graphemes(true).next().map_or(1, char_len);
        offset + first
    }

    // ── Document replacement ───────────────────────────────────────

    /// Replace the whole document; the caret moves to the start
    pub fn set_document(&mut self, document: StyledDocument) {
        self.document = document;
        self.place_selection(0, 0);
    }

    pub fn set_attributed_string(&mut self, document: StyledDocument) {
        self.set_document(document);
    }

    pub fn html_string(&self) -> String {
        html_from_document(&self.document, &self.defaults)
    }

    /// Load HTML; input that cannot be imported is shown as plain text
    pub fn set_html_string(&mut self, html: &str) {
        let document = match document_from_html(html, &self.defaults) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(%err, "HTML import failed; loading as plain text");
                StyledDocument::from_plain_text(
                    html,
                    &self.defaults.text_attributes(),
                    &self.defaults.paragraph_style,
                )
            }
        };
        self.set_document(document);
    }

    // ── Character attributes ───────────────────────────────────────

    /// Mutate the selected runs, or the typing attributes at a collapsed selection
    fn apply_attributes<F>(&mut self, change: PreviewChange, mut apply: F)
    where
        F: FnMut(&mut TextAttributes),
    {
        self.perform(change, |editor| {
            if editor.selection.is_empty() {
                apply(&mut editor.typing_attributes);
            } else {
                editor.document.set_attributes(editor.selection, &mut apply);
            }
        });
    }

    pub fn user_selected_bold(&mut self) {
        let bold = !self.current_format().is_bold;
        self.apply_attributes(PreviewChange::Bold, |a| a.font.traits.bold = bold);
    }

    pub fn user_selected_italic(&mut self) {
        let italic = !self.current_format().is_italic;
        self.apply_attributes(PreviewChange::Italic, |a| a.font.traits.italic = italic);
    }

    pub fn user_selected_underline(&mut self) {
        let underline = !self.current_format().is_underline;
        self.apply_attributes(PreviewChange::Underline, |a| a.underline = underline);
    }

    pub fn user_selected_strikethrough(&mut self) {
        let strikethrough = !self.current_format().is_strikethrough;
        self.apply_attributes(PreviewChange::Strikethrough, |a| {
            a.strikethrough = strikethrough
        });
    }

    pub fn user_selected_text_color(&mut self, color: Option<Color>) {
        self.apply_attributes(PreviewChange::FontColor, |a| a.text_color = color);
    }

    pub fn user_selected_text_background_color(&mut self, color: Option<Color>) {
        self.apply_attributes(PreviewChange::Highlight, |a| a.background_color = color);
    }

    /// Link the selection to `url`, or remove the link when `url` is `None`.
    /// A caret inside a link acts on the whole link.
    pub fn user_apply_hyperlink(&mut self, url: Option<Url>, color: Option<Color>, underline: bool) {
        let range = self.link_target_range();
        let default_color = self.defaults.text_color;
        let mut apply = move |a: &mut TextAttributes| match &url {
            Some(url) => {
                a.link = Some(url.clone());
                a.text_color = Some(color.unwrap_or(Color::LINK_BLUE));
                a.underline = underline;
            }
            None => {
                a.link = None;
                a.text_color = default_color;
                a.underline = false;
            }
        };
        self.perform(PreviewChange::HyperLink, |editor| {
            if range.is_empty() {
                apply(&mut editor.typing_attributes);
            } else {
                editor.document.set_attributes(range, &mut apply);
            }
        });
    }

    /// Link the selection to a URL typed by the user; an empty string removes the link
    pub fn user_apply_hyperlink_str(&mut self, input: &str) -> EditResult<()> {
        let input = input.trim();
        if input.is_empty() {
            self.user_apply_hyperlink(None, None, false);
            return Ok(());
        }
        let url = Url::parse(input).map_err(|source| EditError::InvalidHyperlink {
            input: input.to_string(),
            source,
        })?;
        self.user_apply_hyperlink(Some(url), None, true);
        Ok(())
    }

    fn link_target_range(&self) -> TextRange {
        if !self.selection.is_empty() {
            return self.selection;
        }
        let caret = self.selection.location;
        self.document
            .attribute_runs()
            .into_iter()
            .find(|(range, attrs)| {
                attrs.link.is_some() && range.location < caret && caret < range.end()
            })
            .map(|(range, _)| range)
            .unwrap_or(self.selection)
    }

    // ── Fonts ──────────────────────────────────────────────────────

    /// Switch the whole document (and the default font) to `font`, keeping bold and italic
    pub fn change_font_to(&mut self, font: Font) {
        self.perform(PreviewChange::FontSize, |editor| {
            editor
                .document
                .set_all_attributes(|a| a.font = font.clone().with_traits_of(&a.font));
            editor.typing_attributes.font =
                font.clone().with_traits_of(&editor.typing_attributes.font);
            editor.defaults.font = font;
        });
    }

    pub fn user_changed_to_font_name(&mut self, name: &str) {
        let family = name.to_string();
        self.apply_attributes(PreviewChange::FontSize, |a| a.font.family = family.clone());
    }

    /// Set an explicit point size, clamped to the configured bounds
    pub fn user_changed_to_font_size(&mut self, size: f32) -> EditResult<()> {
        if !size.is_finite() {
            return Err(EditError::InvalidFontSize(size));
        }
        let size = self.settings.clamp_font_size(size);
        self.apply_attributes(PreviewChange::FontSize, |a| a.font.size = size);
        Ok(())
    }

    pub fn increase_font_size(&mut self) {
        self.resize_font(self.settings.font_size_change_amount);
    }

    pub fn decrease_font_size(&mut self) {
        self.resize_font(-self.settings.font_size_change_amount);
    }

    fn resize_font(&mut self, delta: f32) {
        let (min, max) = (self.settings.min_font_size, self.settings.max_font_size);
        self.apply_attributes(PreviewChange::FontResize, |a| {
            a.font.size = (a.font.size + delta).clamp(min, max)
        });
    }

    // ── Paragraph attributes ───────────────────────────────────────

    fn apply_paragraph_style<F>(&mut self, change: PreviewChange, apply: F)
    where
        F: FnMut(&mut ParagraphStyle),
    {
        self.perform(change, |editor| {
            editor.document.set_paragraph_style(editor.selection, apply)
        });
    }

    pub fn user_selected_bullet(&mut self) {
        self.toggle_list(ListKind::Bulleted, PreviewChange::BulletedList);
    }

    pub fn user_selected_numbering(&mut self) {
        self.toggle_list(ListKind::Numbered, PreviewChange::OrderedList);
    }

    fn toggle_list(&mut self, kind: ListKind, change: PreviewChange) {
        let current = self.document.paragraph_style_at(self.selection.location).list;
        let next = if current == kind { ListKind::None } else { kind };
        self.apply_paragraph_style(change, |s| s.list = next);
    }

    pub fn user_selected_increase_indent(&mut self) {
        self.change_indent(ParagraphIndentation::Increase);
    }

    pub fn user_selected_decrease_indent(&mut self) {
        self.change_indent(ParagraphIndentation::Decrease);
    }

    fn change_indent(&mut self, direction: ParagraphIndentation) {
        let step = self.settings.default_indentation_size;
        let (change, delta) = match direction {
            ParagraphIndentation::Increase => (PreviewChange::IndentIncrease, step),
            ParagraphIndentation::Decrease => (PreviewChange::IndentDecrease, -step),
        };
        self.apply_paragraph_style(change, |s| {
            s.head_indent = (s.head_indent + delta).max(0.0);
            s.first_line_head_indent = (s.first_line_head_indent + delta).max(0.0);
        });
    }

    /// Toggle an extra first-line indent on the selected paragraphs
    pub fn user_selected_paragraph_first_line_head_indent(&mut self) {
        let style = self.document.paragraph_style_at(self.selection.location);
        let adding = style.first_line_head_indent <= style.head_indent;
        let indent = self.settings.default_indentation_size;
        let change = if adding {
            PreviewChange::IndentIncrease
        } else {
            PreviewChange::IndentDecrease
        };
        self.apply_paragraph_style(change, |s| {
            s.first_line_head_indent = if adding {
                s.head_indent + indent
            } else {
                s.head_indent
            };
        });
    }

    /// Alignment has no preview kind of its own and is announced as a layout change
    pub fn user_selected_text_alignment(&mut self, alignment: TextAlignment) {
        self.apply_paragraph_style(PreviewChange::IndentIncrease, |s| s.alignment = alignment);
    }

    // ── Text input ─────────────────────────────────────────────────

    fn replace_selection_with_text(&mut self, text: &str) {
        let attributes = self.typing_attributes.clone();
        let at = self.selection.location;
        self.document.delete_range(self.selection);
        let inserted = self.document.insert_text(at, text, &attributes);
        self.place_caret_after_typing(at + inserted);
    }

    fn replace_selection_with_document(&mut self, document: &StyledDocument) {
        let at = self.selection.location;
        self.document.delete_range(self.selection);
        let inserted = self.document.insert_document(at, document);
        self.place_selection(at + inserted, at + inserted);
    }

    fn delete_and_collapse(&mut self, range: TextRange) {
        self.document.delete_range(range);
        self.place_selection(range.location, range.location);
    }

    /// Type text at the selection with the typing attributes
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let change = if text == " " {
            PreviewChange::Space
        } else {
            PreviewChange::KeyDown
        };
        self.perform(change, |editor| editor.replace_selection_with_text(text));
    }

    fn current_paragraph(&self) -> Option<&Paragraph> {
        self.document
            .paragraph(self.document.paragraph_index_at(self.selection.location))
    }

    fn in_empty_list_item(&self) -> bool {
        self.selection.is_empty()
            && self
                .current_paragraph()
                .is_some_and(|p| p.style.is_list() && p.is_empty())
    }

    /// Start a new paragraph. Lists continue, except that Enter on an empty item leaves the list.
    pub fn insert_newline(&mut self) {
        let leave_list = self.in_empty_list_item();
        self.perform(PreviewChange::Enter, |editor| {
            if leave_list {
                editor
                    .document
                    .set_paragraph_style(editor.selection, |s| s.list = ListKind::None);
            } else {
                editor.replace_selection_with_text("\n");
            }
        });
    }

    /// Start a new paragraph outside the current list
    pub fn user_selected_leave_list(&mut self) {
        let leave_in_place = self.in_empty_list_item();
        self.perform(PreviewChange::Enter, |editor| {
            if !leave_in_place {
                editor.replace_selection_with_text("\n");
            }
            editor
                .document
                .set_paragraph_style(editor.selection, |s| s.list = ListKind::None);
        });
    }

    /// Backspace. At the start of a list item the list flag goes first.
    pub fn delete_backward(&mut self) {
        if self.selection.is_empty() {
            let caret = self.selection.location;
            let index = self.document.paragraph_index_at(caret);
            if caret == self.document.paragraph_start(index)
                && self.document.paragraph_style_at(caret).is_list()
            {
                self.apply_paragraph_style(PreviewChange::Delete, |s| s.list = ListKind::None);
                return;
            }
            if caret == 0 {
                return;
            }
        }
        let range = if self.selection.is_empty() {
            let caret = self.selection.location;
            TextRange::between(self.previous_boundary(caret), caret)
        } else {
            self.selection
        };
        self.perform(PreviewChange::Delete, |editor| editor.delete_and_collapse(range));
    }

    /// Forward delete
    pub fn delete_forward(&mut self) {
        let range = if self.selection.is_empty() {
            let caret = self.selection.location;
            if caret >= self.document.len() {
                return;
            }
            TextRange::between(caret, self.next_boundary(caret))
        } else {
            self.selection
        };
        self.perform(PreviewChange::Delete, |editor| editor.delete_and_collapse(range));
    }

    /// Replace every occurrence of `needle`; each replacement takes the
    /// attributes of the first character it replaces. Returns the count.
    pub fn find_and_replace(&mut self, needle: &str, replacement: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let text = self.document.text();
        let matches: Vec<TextRange> = text
            .match_indices(needle)
            .map(|(byte, _)| TextRange::new(char_len(&text[..byte]), char_len(needle)))
            .collect();
        if matches.is_empty() {
            return 0;
        }
        self.perform(PreviewChange::FindReplace, |editor| {
            for range in matches.iter().rev() {
                let attributes = editor.document.attributes_at(range.location + 1).clone();
                editor.document.delete_range(*range);
                editor
                    .document
                    .insert_text(range.location, replacement, &attributes);
            }
            editor.place_selection(0, 0);
        });
        matches.len()
    }

    // ── Clipboard ──────────────────────────────────────────────────

    /// The selection as clipboard contents tagged with this editor's type
    pub fn copy(&self) -> Option<ClipboardContents> {
        if self.selection.is_empty() {
            return None;
        }
        let piece = self.document.slice(self.selection);
        Some(ClipboardContents {
            type_tag: Some(PASTEBOARD_DATA_TYPE.to_string()),
            html: Some(html_from_document(&piece, &self.defaults)),
            plain: Some(piece.text()),
        })
    }

    pub fn cut(&mut self) -> Option<ClipboardContents> {
        let contents = self.copy()?;
        let range = self.selection;
        self.perform(PreviewChange::Cut, |editor| editor.delete_and_collapse(range));
        Some(contents)
    }

    fn accepts_rich_paste(&self, contents: &ClipboardContents) -> bool {
        if contents.html.is_none() {
            return false;
        }
        if self.settings.allows_rich_text_paste_only_from_this_class {
            contents.type_tag.as_deref() == Some(PASTEBOARD_DATA_TYPE)
        } else {
            true
        }
    }

    fn rich_paste_document(&self, contents: &ClipboardContents) -> Option<StyledDocument> {
        if !self.accepts_rich_paste(contents) {
            return None;
        }
        let html = contents.html.as_deref()?;
        match document_from_html(html, &self.defaults) {
            Ok(document) => Some(document),
            Err(err) => {
                tracing::warn!(%err, "pasted HTML could not be imported; pasting plain text");
                None
            }
        }
    }

    fn plain_paste_text(&self, contents: &ClipboardContents) -> Option<String> {
        if let Some(plain) = &contents.plain {
            return Some(plain.clone());
        }
        let html = contents.html.as_deref()?;
        if is_html(html) {
            document_from_html(html, &self.defaults)
                .ok()
                .map(|document| document.text())
        } else {
            Some(html.to_string())
        }
    }

    /// Paste clipboard contents. Rich content from elsewhere is reduced to
    /// plain text typed with the current format when rich paste is restricted.
    pub fn paste(&mut self, contents: &ClipboardContents) {
        if let Some(document) = self.rich_paste_document(contents) {
            self.perform(PreviewChange::Paste, |editor| {
                editor.replace_selection_with_document(&document)
            });
            return;
        }
        let Some(text) = self.plain_paste_text(contents).filter(|t| !t.is_empty()) else {
            return;
        };
        self.perform(PreviewChange::Paste, |editor| {
            editor.replace_selection_with_text(&text)
        });
    }

    // ── Keyboard ───────────────────────────────────────────────────

    fn shortcut_enabled(&self, shortcut: Shortcuts) -> bool {
        self.data_source
            .as_ref()
            .map(|source| source.enabled_keyboard_shortcuts())
            .unwrap_or(Shortcuts::ALL)
            .contains(shortcut)
    }

    fn tab_indents(&self) -> bool {
        self.settings.tab_key_always_indents_outdents
            || self
                .document
                .paragraph_style_at(self.selection.location)
                .is_list()
    }

    /// Handle a key press. Returns whether the event was consumed.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        if let Some(delegate) = self.delegate.as_mut() {
            if delegate.key_down(&event) {
                return true;
            }
        }

        let modifiers = event.modifiers;
        self.last_single_key_pressed = match event.key {
            Key::Char(c) if !modifiers.command && !modifiers.control => Some(c),
            _ => None,
        };

        if modifiers.command {
            return self.handle_shortcut(event);
        }

        match event.key {
            Key::Char(c) => self.insert_text(&c.to_string()),
            Key::Tab if self.tab_indents() => {
                let (shortcut, direction) = if modifiers.shift {
                    (Shortcuts::DECREASE_INDENT, ParagraphIndentation::Decrease)
                } else {
                    (Shortcuts::INCREASE_INDENT, ParagraphIndentation::Increase)
                };
                if !self.shortcut_enabled(shortcut) {
                    return false;
                }
                self.change_indent(direction);
            }
            Key::Tab => self.insert_text("\t"),
            Key::Enter
                if modifiers.shift
                    && self.shortcut_enabled(Shortcuts::LEAVE_BULLETED_LIST)
                    && self.current_paragraph().is_some_and(|p| p.style.is_list()) =>
            {
                self.user_selected_leave_list()
            }
            Key::Enter => self.insert_newline(),
            Key::Backspace => self.delete_backward(),
            Key::Delete => self.delete_forward(),
            Key::Left | Key::Right | Key::Up | Key::Down => {
                self.move_caret(event.key, modifiers.shift)
            }
            Key::Escape => return false,
        }
        true
    }

    fn handle_shortcut(&mut self, event: KeyEvent) -> bool {
        let Key::Char(c) = event.key else {
            return false;
        };
        let shift = event.modifiers.shift;
        let (shortcut, action): (Shortcuts, fn(&mut Self)) = match (c.to_ascii_lowercase(), shift)
        {
            ('b', false) => (Shortcuts::BOLD, Self::user_selected_bold),
            ('i', false) => (Shortcuts::ITALIC, Self::user_selected_italic),
            ('u', false) => (Shortcuts::UNDERLINE, Self::user_selected_underline),
            ('x', true) => (Shortcuts::STRIKETHROUGH, Self::user_selected_strikethrough),
            ('>', _) | ('.', true) => (Shortcuts::INCREASE_FONT_SIZE, Self::increase_font_size),
            ('<', _) | (',', true) => (Shortcuts::DECREASE_FONT_SIZE, Self::decrease_font_size),
            ('l', true) => (Shortcuts::BULLETED_LIST, Self::user_selected_bullet),
            ('n', true) => (Shortcuts::ORDERED_LIST, Self::user_selected_numbering),
            (']', false) => (Shortcuts::INCREASE_INDENT, Self::user_selected_increase_indent),
            ('[', false) => (Shortcuts::DECREASE_INDENT, Self::user_selected_decrease_indent),
            _ => return false,
        };
        if !self.shortcut_enabled(shortcut) {
            tracing::debug!(key = %c, "keyboard shortcut disabled by data source");
            return false;
        }
        action(self);
        true
    }

    // ── Focus and undo ─────────────────────────────────────────────

    pub fn focus_gained(&mut self) {
        self.has_focus = true;
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.became_first_responder();
        }
    }

    pub fn focus_lost(&mut self) {
        self.has_focus = false;
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.resigned_first_responder();
        }
    }

    /// Undo is owned by the host. Returns whether a host handled it.
    pub fn undo(&mut self) -> bool {
        match self.delegate.as_mut() {
            Some(delegate) if delegate.handles_undo_redo() => {
                delegate.performed_undo();
                true
            }
            _ => {
                tracing::debug!("undo requested without a host undo handler");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.delegate.as_mut() {
            Some(delegate) if delegate.handles_undo_redo() => {
                delegate.performed_redo();
                true
            }
            _ => {
                tracing::debug!("redo requested without a host undo handler");
                false
            }
        }
    }
}

impl Default for RichTextEditor {
    fn default() -> Self {
        Self::new()
    }
}
