//! Markdown and wiki link parsing.
//!
//! Columns are character offsets within a single line, matching
//! [`Position::ch`](crate::buffer::Position).

use std::sync::LazyLock;

use regex::Regex;

static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[\[([^\[\]|#]*)(#[^\[\]|]*)?(?:\|([^\[\]]*))?\]\]").expect("valid regex")
});

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\[\]]*)\]\(\s*(<[^<>]+>|[^\s()<>]+)(?:\s+"[^"]*")?\s*\)"#)
        .expect("valid regex")
});

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// `[[target|label]]`
    Wiki,
    /// `[label](target)`
    Markdown,
}

/// A link found in a line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Start column of the whole link, including a leading `!`.
    pub start: usize,
    /// Column just past the link.
    pub end: usize,
    /// The link exactly as written.
    pub text: String,
    /// Destination with any `#fragment` removed and URL escapes decoded.
    pub target: String,
    /// Wiki alias or markdown link text.
    pub label: Option<String>,
    pub embed: bool,
    pub style: LinkStyle,
}

impl Link {
    /// Whether the destination points outside the vault.
    pub fn is_remote(&self) -> bool {
        is_remote(&self.target)
    }

    /// Replacement pointing at `url`: embeds stay embeds, links stay links.
    pub fn render_replacement(&self, url: &str) -> String {
        if self.embed {
            let alt = match self.style {
                LinkStyle::Wiki => "",
                LinkStyle::Markdown => self.label.as_deref().unwrap_or_default(),
            };
            return format!("![{alt}]({url})");
        }

        let label = match (&self.label, self.style) {
            (Some(label), _) if !label.is_empty() => label.as_str(),
            (_, LinkStyle::Wiki) => self.target.as_str(),
            (_, LinkStyle::Markdown) => "",
        };
        format!("[{label}]({url})")
    }
}

/// Whether `target` carries a URL scheme.
pub fn is_remote(target: &str) -> bool {
    let target = target.trim();
    // Single letter schemes are Windows drive letters.
    URL_SCHEME
        .find(target)
        .is_some_and(|scheme| scheme.as_str().len() > 2)
}

fn char_column(line: &str, byte: usize) -> usize {
    line[..byte].chars().count()
}

/// Every link in `line`, in order of appearance.
pub fn links_in_line(line: &str) -> Vec<Link> {
    let mut links: Vec<Link> = WIKI_LINK
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let target = caps.get(2)?.as_str().trim();
            if target.is_empty() {
                return None;
            }
            Some(Link {
                start: char_column(line, whole.start()),
                end: char_column(line, whole.end()),
                text: whole.as_str().to_owned(),
                target: target.to_owned(),
                label: caps.get(4).map(|m| m.as_str().to_owned()),
                embed: !caps.get(1)?.as_str().is_empty(),
                style: LinkStyle::Wiki,
            })
        })
        .collect();

    let markdown = MARKDOWN_LINK.captures_iter(line).filter_map(|caps| {
        let whole = caps.get(0)?;
        let destination = caps.get(3)?.as_str();
        let destination = destination
            .strip_prefix('<')
            .and_then(|d| d.strip_suffix('>'))
            .unwrap_or(destination);
        let without_fragment = destination.split('#').next().unwrap_or_default();
        let target = urlencoding::decode(without_fragment)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_err| without_fragment.to_owned());
        if target.is_empty() {
            return None;
        }
        Some(Link {
            start: char_column(line, whole.start()),
            end: char_column(line, whole.end()),
            text: whole.as_str().to_owned(),
            target,
            label: caps.get(2).map(|m| m.as_str().to_owned()),
            embed: !caps.get(1)?.as_str().is_empty(),
            style: LinkStyle::Markdown,
        })
    });

    for link in markdown {
        let overlaps = links
            .iter()
            .any(|other| link.start < other.end && other.start < link.end);
        if !overlaps {
            links.push(link);
        }
    }

    links.sort_by_key(|link| link.start);
    links
}

/// The link covering column `ch`, boundaries included.
pub fn link_at(line: &str, ch: usize) -> Option<Link> {
    links_in_line(line)
        .into_iter()
        .find(|link| link.start <= ch && ch <= link.end)
}

/// Parses `text` as exactly one link.
pub fn parse_link(text: &str) -> Option<Link> {
    let mut links = links_in_line(text);
    if links.len() != 1 {
        return None;
    }
    let link = links.remove(0);
    (link.start == 0 && link.text.len() == text.len()).then_some(link)
}
