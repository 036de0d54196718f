// SVG-based MarkerPainter implementation for testing and visualization
// Generates SVG output from list marker drawing

use rich_text_editor::richtext::list_layout::MarkerPainter;
use rich_text_editor::richtext::styled_document::{Color, Font};
use std::fmt::Write;

/// SVG painter that records every marker as a `<text>` element
pub struct SvgMarkerPainter {
    svg_content: String,
    current_color: Color,
    current_font: Font,
}

impl SvgMarkerPainter {
    /// Create a new SVG painter
    pub fn new(width: i32, height: i32) -> Self {
        let mut painter = SvgMarkerPainter {
            svg_content: String::new(),
            current_color: Color::BLACK,
            current_font: Font::default(),
        };

        writeln!(
            &mut painter.svg_content,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, height, width, height
        )
        .unwrap();

        // White background
        writeln!(
            &mut painter.svg_content,
            r##"  <rect width="{}" height="{}" fill="#ffffff"/>"##,
            width, height
        )
        .unwrap();

        painter
    }

    /// Get the generated SVG content
    pub fn finish(mut self) -> String {
        writeln!(&mut self.svg_content, "</svg>").unwrap();
        self.svg_content
    }

    /// Escape XML text
    fn escape_xml(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}

impl MarkerPainter for SvgMarkerPainter {
    fn set_color(&mut self, color: Color) {
        self.current_color = color;
    }

    fn set_font(&mut self, font: &Font) {
        self.current_font = font.clone();
    }

    fn text_width(&mut self, text: &str, font: &Font) -> f32 {
        // Approximate width: 0.6 * font size per character
        text.chars().count() as f32 * font.size * 0.6
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        if text.is_empty() {
            return;
        }

        let weight = if self.current_font.is_bold() {
            "bold"
        } else {
            "normal"
        };

        writeln!(
            &mut self.svg_content,
            r#"  <text x="{:.1}" y="{:.1}" fill="{}" font-family="{}" font-size="{}" font-weight="{}">{}</text>"#,
            x,
            y,
            self.current_color.to_css(),
            Self::escape_xml(&self.current_font.family),
            self.current_font.size,
            weight,
            Self::escape_xml(text)
        )
        .unwrap();
    }
}
