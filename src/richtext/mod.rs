// Rich text editing core
// Styled document model, HTML exchange, list layout and the editor controller

pub mod editor;
pub mod html_converter;
pub mod html_parser;
pub mod list_layout;
pub mod preview_change;
pub mod styled_document;
pub mod text_format;
