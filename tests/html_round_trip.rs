// Round-trip tests for the HTML exchange format

use rich_text_editor::richtext::html_converter::{document_from_html, html_from_document, is_html};
use rich_text_editor::richtext::styled_document::{
    Color, DefaultAttributes, Font, ListKind, Paragraph, ParagraphStyle, StyledDocument,
    TextAlignment, TextAttributes,
};
use url::Url;

fn defaults() -> DefaultAttributes {
    DefaultAttributes::default()
}

/// Visible text and style flags of every run, paragraph by paragraph
fn run_summary(doc: &StyledDocument) -> Vec<(ListKind, Vec<(String, bool, bool, Option<Url>)>)> {
    doc.paragraphs()
        .iter()
        .map(|p| {
            let runs = p
                .runs()
                .iter()
                .map(|r| {
                    (
                        r.text.clone(),
                        r.attributes.is_bold(),
                        r.attributes.is_italic(),
                        r.attributes.link.clone(),
                    )
                })
                .collect();
            (p.style.list, runs)
        })
        .collect()
}

#[test]
fn test_export_then_import_preserves_styles_lists_and_links() {
    let link = Url::parse("https://example.org/docs").unwrap();
    let doc = StyledDocument::from_paragraphs(vec![
        Paragraph::default()
            .with_plain_text("Plain ")
            .with_text("bold", TextAttributes::bold())
            .with_plain_text(" and ")
            .with_text("italic", TextAttributes::italic()),
        Paragraph::new(ParagraphStyle::default().with_list(ListKind::Bulleted))
            .with_plain_text("first item"),
        Paragraph::new(ParagraphStyle::default().with_list(ListKind::Bulleted))
            .with_plain_text("second item"),
        Paragraph::default()
            .with_plain_text("See ")
            .with_text("the site", TextAttributes::plain().with_link(link))
            .with_plain_text("."),
    ]);

    let html = html_from_document(&doc, &defaults());
    let imported = document_from_html(&html, &defaults()).unwrap();

    assert_eq!(imported.text(), doc.text());
    assert_eq!(run_summary(&imported), run_summary(&doc));
}

#[test]
fn test_export_is_idempotent_after_import() {
    let source = "<h2>Title</h2>\n<p>Some <b>bold</b>&nbsp;text with <font color=\"red\">color</font></p>\n<ol><li>one</li><li>two</li></ol>";

    let first = document_from_html(source, &defaults()).unwrap();
    let html1 = html_from_document(&first, &defaults());
    let second = document_from_html(&html1, &defaults()).unwrap();
    let html2 = html_from_document(&second, &defaults());

    assert_eq!(html1, html2);
    assert_eq!(first.text(), "Title\nSome bold\u{a0}text with color\none\ntwo");
}

#[test]
fn test_export_snapshot() {
    let heading = TextAttributes::plain().with_font(Font::default().with_size(18.0).with_bold(true));
    let red = TextAttributes {
        text_color: Some(Color::rgb(0xcc, 0, 0)),
        ..TextAttributes::plain()
    };
    let marked = TextAttributes {
        background_color: Some(Color::rgb(255, 255, 0)),
        ..TextAttributes::plain()
    };
    let doc = StyledDocument::from_paragraphs(vec![
        Paragraph::new(ParagraphStyle {
            alignment: TextAlignment::Center,
            ..Default::default()
        })
        .with_text("Report", heading),
        Paragraph::default()
            .with_plain_text("Plain, ")
            .with_text("red", red)
            .with_plain_text(" and ")
            .with_text("marked", marked),
        Paragraph::new(ParagraphStyle::default().with_list(ListKind::Numbered))
            .with_plain_text("one"),
        Paragraph::new(ParagraphStyle::default().with_list(ListKind::Numbered))
            .with_plain_text("two"),
        Paragraph::default(),
        Paragraph::default().with_plain_text("x < y & z"),
    ]);

    let html = html_from_document(&doc, &defaults());
    insta::assert_snapshot!(html, @r##"
    <!DOCTYPE html>
    <html>
    <head>
    <meta charset="utf-8">
    </head>
    <body style="white-space: pre-wrap;">
    <p style="text-align: center"><span style="font-size: 18pt; font-weight: bold">Report</span></p>
    <p>Plain, <span style="color: #cc0000">red</span> and <span style="background-color: #ffff00">marked</span></p>
    <ol>
    <li>one</li>
    <li>two</li>
    </ol>
    <p><br></p>
    <p>x &lt; y &amp; z</p>
    </body>
    </html>
    "##);

    let back = document_from_html(&html, &defaults()).unwrap();
    assert_eq!(back.text(), doc.text());
    assert_eq!(run_summary(&back), run_summary(&doc));
    assert_eq!(back.attributes_at(1).font.size, 18.0);
    assert_eq!(back.paragraph_style_at(0).alignment, TextAlignment::Center);
}

#[test]
fn test_non_breaking_space_round_trips_as_entity() {
    let doc = StyledDocument::from_plain_text(
        "a\u{a0}b",
        &TextAttributes::plain(),
        &ParagraphStyle::default(),
    );
    let html = html_from_document(&doc, &defaults());
    assert!(html.contains("<p>a&nbsp;b</p>"));
    let back = document_from_html(&html, &defaults()).unwrap();
    assert_eq!(back.text(), "a\u{a0}b");
}

#[test]
fn test_trailing_empty_paragraph_survives() {
    let doc = StyledDocument::from_plain_text(
        "line\n",
        &TextAttributes::plain(),
        &ParagraphStyle::default(),
    );
    assert_eq!(doc.paragraph_count(), 2);
    let back = document_from_html(&html_from_document(&doc, &defaults()), &defaults()).unwrap();
    assert_eq!(back.text(), "line\n");
}

#[test]
fn test_defaults_fill_unstyled_content() {
    let defaults = DefaultAttributes {
        font: Font::new("Georgia", 15.0),
        text_color: Some(Color::rgb(20, 20, 20)),
        ..Default::default()
    };
    let doc = document_from_html("<p>plain <span style=\"font-size: 20px\">big</span></p>", &defaults)
        .unwrap();
    let plain = doc.attributes_at(2);
    assert_eq!(plain.font.family, "Georgia");
    assert_eq!(plain.font.size, 15.0);
    assert_eq!(plain.text_color, Some(Color::rgb(20, 20, 20)));
    assert_eq!(doc.attributes_at(8).font.size, 20.0);

    // Exporting against the same defaults writes only the difference
    let html = html_from_document(&doc, &defaults);
    assert!(html.contains("<p>plain <span style=\"font-size: 20pt\">big</span></p>"));
}

#[test]
fn test_is_html_probe() {
    assert!(is_html("<p>hello</p>"));
    assert!(!is_html("hello world"));
    assert!(is_html("<a href=\"x\">link</a>"));
    assert!(!is_html("1 < 2 and 3 > 2"));
}

#[test]
fn test_whitespace_only_text_round_trips() {
    let doc = StyledDocument::from_plain_text(
        "a\n   \nb",
        &TextAttributes::plain(),
        &ParagraphStyle::default(),
    );
    let back = document_from_html(&html_from_document(&doc, &defaults()), &defaults()).unwrap();
    assert_eq!(back.text(), "a\n   \nb");

    let doc = StyledDocument::from_paragraphs(vec![
        Paragraph::default()
            .with_plain_text("  ")
            .with_text("x", TextAttributes::bold()),
    ]);
    let back = document_from_html(&html_from_document(&doc, &defaults()), &defaults()).unwrap();
    assert_eq!(back.text(), "  x");
    assert_eq!(run_summary(&back), run_summary(&doc));
}

#[test]
fn test_uncolored_runs_round_trip_against_colored_defaults() {
    let defaults = DefaultAttributes {
        text_color: Some(Color::rgb(0x14, 0x14, 0x14)),
        ..Default::default()
    };
    let doc = StyledDocument::from_paragraphs(vec![
        Paragraph::default().with_plain_text("uncolored"),
    ]);
    let back = document_from_html(&html_from_document(&doc, &defaults), &defaults).unwrap();
    assert_eq!(back.attributes_at(1).text_color, None);
}
