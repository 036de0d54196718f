// End-to-end editing sessions driven through the public controller API

use rich_text_editor::richtext::editor::{
    ClipboardContents, Key, KeyEvent, PASTEBOARD_DATA_TYPE, RichTextEditor,
};
use rich_text_editor::richtext::styled_document::{ListKind, TextRange};

fn editor_with(text: &str) -> RichTextEditor {
    let mut editor = RichTextEditor::new();
    editor.insert_text(text);
    editor
}

#[test]
fn test_link_export() {
    let mut editor = editor_with("Hello world");
    editor.select(TextRange::new(0, 5));
    editor.user_apply_hyperlink_str("https://example.com").unwrap();

    let html = editor.html_string();
    assert!(html.contains(
        r##"<p><a href="https://example.com/" style="text-decoration: underline; color: #0000ee">Hello</a> world</p>"##
    ));
    assert!(editor.current_format().hyperlink_enabled);

    // Removing the link with an empty string restores plain text
    editor.user_apply_hyperlink_str("").unwrap();
    assert!(editor.html_string().contains("<p>Hello world</p>"));
}

#[test]
fn test_copy_paste_between_editors_keeps_formatting() {
    let mut source = editor_with("Hello world");
    source.select(TextRange::new(6, 5));
    source.user_selected_bold();
    let clipboard = source.copy().unwrap();
    assert_eq!(clipboard.type_tag.as_deref(), Some(PASTEBOARD_DATA_TYPE));
    assert_eq!(clipboard.plain.as_deref(), Some("world"));

    let mut target = RichTextEditor::new();
    target.paste(&clipboard);
    assert_eq!(target.document().text(), "world");
    assert!(target.document().paragraphs()[0].runs()[0].attributes.is_bold());
}

#[test]
fn test_foreign_html_is_pasted_as_plain_text() {
    let mut editor = RichTextEditor::new();
    editor.paste(&ClipboardContents::html(
        "<p><b>loud</b> words</p>",
        Some("public.html"),
    ));
    assert_eq!(editor.document().text(), "loud words");
    assert!(
        editor
            .document()
            .paragraphs()
            .iter()
            .flat_map(|p| p.runs())
            .all(|run| !run.attributes.is_bold())
    );
}

#[test]
fn test_typing_a_numbered_list() {
    let mut editor = RichTextEditor::new();
    editor.user_selected_numbering();
    editor.insert_text("one");
    editor.handle_key(KeyEvent::new(Key::Enter));
    editor.insert_text("two");
    editor.handle_key(KeyEvent::new(Key::Enter));
    // Enter on the empty third item ends the list
    editor.handle_key(KeyEvent::new(Key::Enter));
    editor.insert_text("after");

    let doc = editor.document();
    assert_eq!(doc.text(), "one\ntwo\nafter");
    let kinds: Vec<ListKind> = doc.paragraphs().iter().map(|p| p.style.list).collect();
    assert_eq!(
        kinds,
        vec![ListKind::Numbered, ListKind::Numbered, ListKind::None]
    );

    let html = editor.html_string();
    assert!(html.contains("<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n<p>after</p>"));
}
