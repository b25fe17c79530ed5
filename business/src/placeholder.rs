//! Placeholder text marking an upload in progress inside a live buffer.

use std::fmt;

use imgdrop_storage::random_id;

use crate::buffer::{Position, TextBuffer};

/// Token embedded in a placeholder, unique per upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderId(String);

impl PlaceholderId {
    pub fn generate() -> Self {
        Self(random_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text written into the buffer, without the trailing newline.
    pub fn marker(&self) -> String {
        format!("![Uploading file...{}]()", self.0)
    }
}

impl From<&str> for PlaceholderId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What became of the placeholder on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Replaced,
    /// The user edited the placeholder away; nothing was written.
    Vanished,
}

/// Writes the placeholder and a newline, at `at` or over the selection.
pub fn insert_placeholder(buffer: &dyn TextBuffer, id: &PlaceholderId, at: Option<Position>) {
    let text = format!("{}\n", id.marker());
    match at {
        Some(pos) => buffer.replace_range(&text, pos, pos),
        None => buffer.replace_selection(&text),
    }
}

/// Replaces the first occurrence of the placeholder with `final_text`.
pub fn resolve_placeholder(
    buffer: &dyn TextBuffer,
    id: &PlaceholderId,
    final_text: &str,
) -> Resolution {
    let marker = id.marker();
    let Some(start) = buffer.find(&marker) else {
        log::debug!(
            target: "imgdrop_business::placeholder",
            "placeholder_vanished id={id}"
        );
        return Resolution::Vanished;
    };

    buffer.replace_range(final_text, start, start.advance(&marker));
    Resolution::Replaced
}

/// Markdown embed of an uploaded image.
pub fn embed_markup(url: &str) -> String {
    format!("![]({url})")
}

/// Inert comment carrying an error message.
pub fn error_comment(message: &str) -> String {
    format!("<!--{message}-->")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::StringBuffer;

    #[test]
    fn test_marker_format() {
        let id = PlaceholderId::from("abc123");
        assert_eq!(id.marker(), "![Uploading file...abc123]()");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(PlaceholderId::generate(), PlaceholderId::generate());
    }

    #[test]
    fn test_insert_over_selection() {
        let buffer = StringBuffer::with_cursor_at_end("intro ");
        let id = PlaceholderId::from("id1");
        insert_placeholder(&buffer, &id, None);
        assert_eq!(buffer.text(), "intro ![Uploading file...id1]()\n");
    }

    #[test]
    fn test_insert_at_position() {
        let buffer = StringBuffer::new("line one\n\nline three");
        let id = PlaceholderId::from("id2");
        insert_placeholder(&buffer, &id, Some(Position::new(1, 0)));
        assert_eq!(
            buffer.text(),
            "line one\n![Uploading file...id2]()\n\nline three"
        );
    }

    #[test]
    fn test_resolve_replaces_first_occurrence() {
        let buffer = StringBuffer::new("a ![Uploading file...x]() b ![Uploading file...x]()");
        let id = PlaceholderId::from("x");

        let resolution = resolve_placeholder(&buffer, &id, "DONE");

        assert_eq!(resolution, Resolution::Replaced);
        assert_eq!(buffer.text(), "a DONE b ![Uploading file...x]()");
    }

    #[test]
    fn test_resolve_survives_edits_around_placeholder() {
        let buffer = StringBuffer::with_cursor_at_end("");
        let id = PlaceholderId::from("x");
        insert_placeholder(&buffer, &id, None);
        buffer.set_text(format!("typed meanwhile\n{}\nmore", id.marker()));

        resolve_placeholder(&buffer, &id, &embed_markup("https://cdn/x.png"));
        assert_eq!(buffer.text(), "typed meanwhile\n![](https://cdn/x.png)\nmore");
    }

    #[test]
    fn test_resolve_vanished_placeholder_is_noop() {
        let buffer = StringBuffer::new("user deleted it");
        let before = buffer.revision();

        let resolution = resolve_placeholder(&buffer, &PlaceholderId::from("gone"), "x");

        assert_eq!(resolution, Resolution::Vanished);
        assert_eq!(buffer.revision(), before);
        assert_eq!(buffer.text(), "user deleted it");
    }

    #[test]
    fn test_resolution_texts() {
        assert_eq!(embed_markup("https://a/b.png"), "![](https://a/b.png)");
        assert_eq!(error_comment("oops"), "<!--oops-->");
    }
}
