// Library exports for rich-text-editor

pub mod error;
pub mod richtext;
pub mod settings;

pub use error::{EditError, HtmlImportError, SettingsError};
pub use richtext::editor::{
    ClipboardContents, Key, KeyEvent, Modifiers, PASTEBOARD_DATA_TYPE, RichTextEditor,
    RichTextEditorDataSource, RichTextEditorDelegate,
};
pub use richtext::html_converter::{document_from_html, html_from_document, is_html};
pub use richtext::list_layout::{ListLayoutSettings, ListMarkerLayout, MarkerPainter};
pub use richtext::preview_change::{PreviewChange, PreviewChangeNames, Shortcuts};
pub use richtext::styled_document::{
    Color, DefaultAttributes, Font, ListKind, Paragraph, ParagraphStyle, StyledDocument,
    TextAlignment, TextAttributes, TextRange,
};
pub use richtext::text_format::TextFormat;
pub use settings::EditorSettings;
