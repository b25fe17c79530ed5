//! Located references from documents to a local resource.

use std::collections::BTreeMap;

use crate::buffer::Position;
use crate::links::links_in_line;

/// One occurrence of a link to a local resource inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub document_path: String,
    pub start: Position,
    pub end: Position,
    pub link_text: String,
}

/// The reference a rewrite was triggered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginatingReference {
    pub document_path: String,
    pub start: Position,
}

impl OriginatingReference {
    pub fn matches(&self, reference: &Reference) -> bool {
        reference.document_path == self.document_path && reference.start == self.start
    }
}

/// Query side of the host's link metadata.
pub trait ReferenceIndex: Send + Sync {
    /// Every reference to the vault path `resource`, across all documents.
    fn references_to(&self, resource: &str) -> Vec<Reference>;
}

/// Blanks out `<!-- -->` comments, keeping every character position.
fn mask_comments(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("<!--") {
        masked.push_str(&rest[..open]);
        let comment_len = rest[open..]
            .find("-->")
            .map_or(rest.len() - open, |close| close + 3);
        let comment = &rest[open..open + comment_len];
        masked.extend(blank(comment));
        rest = &rest[open + comment_len..];
    }

    masked.push_str(rest);
    masked
}

fn blank(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().map(|c| if c == '\n' { '\n' } else { ' ' })
}

/// Opening fence of a fenced code block: its character and length.
fn fence_of(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn closes_fence(line: &str, (marker, len): (char, usize)) -> bool {
    let trimmed = line.trim();
    trimmed.chars().count() >= len && trimmed.chars().all(|c| c == marker)
}

/// Blanks out the backtick code spans of one line.
fn mask_code_spans(line: &str, masked: &mut String) {
    let chars: Vec<char> = line.chars().collect();
    let run_at = |i: usize| chars[i..].iter().take_while(|c| **c == '`').count();

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '`' {
            masked.push(chars[i]);
            i += 1;
            continue;
        }
        let open = run_at(i);
        let mut close = None;
        let mut j = i + open;
        while j < chars.len() {
            if chars[j] == '`' {
                let run = run_at(j);
                if run == open {
                    close = Some(j + run);
                    break;
                }
                j += run;
            } else {
                j += 1;
            }
        }
        match close {
            Some(end) => {
                masked.extend(std::iter::repeat_n(' ', end - i));
                i = end;
            }
            None => {
                masked.extend(&chars[i..i + open]);
                i += open;
            }
        }
    }
}

/// Blanks out fenced code blocks and inline code spans, keeping every
/// character position. An unclosed fence runs to the end of the text.
fn mask_code(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut fence = None;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            masked.push('\n');
        }
        match fence {
            Some(open) => {
                masked.extend(blank(line));
                if closes_fence(line, open) {
                    fence = None;
                }
            }
            None => {
                if let Some(open) = fence_of(line) {
                    fence = Some(open);
                    masked.extend(blank(line));
                } else {
                    mask_code_spans(line, &mut masked);
                }
            }
        }
    }

    masked
}

/// References located in one document's text that resolve to `resource`.
///
/// `resolve` maps a link target written in `document_path` to a vault path.
/// Links inside HTML comments or code are not references.
pub fn references_in_document(
    document_path: &str,
    text: &str,
    resource: &str,
    resolve: impl Fn(&str, &str) -> Option<String>,
) -> Vec<Reference> {
    mask_comments(&mask_code(text))
        .split('\n')
        .enumerate()
        .flat_map(|(line_no, line)| {
            links_in_line(line)
                .into_iter()
                .filter(|link| !link.is_remote())
                .map(move |link| (line_no, link))
        })
        .filter(|(_, link)| {
            resolve(&link.target, document_path).as_deref() == Some(resource)
        })
        .map(|(line, link)| Reference {
            document_path: document_path.to_owned(),
            start: Position::new(line, link.start),
            end: Position::new(line, link.end),
            link_text: link.text,
        })
        .collect()
}

/// Aggregate size of a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewriteStats {
    pub files: usize,
    pub links: usize,
}

/// References grouped by document. Never holds a document without references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceGroup {
    documents: BTreeMap<String, Vec<Reference>>,
}

impl ReferenceGroup {
    pub fn from_references(references: impl IntoIterator<Item = Reference>) -> Self {
        let mut documents: BTreeMap<String, Vec<Reference>> = BTreeMap::new();
        for reference in references {
            documents
                .entry(reference.document_path.clone())
                .or_default()
                .push(reference);
        }
        for references in documents.values_mut() {
            references.sort_by_key(|r| r.start);
        }
        Self { documents }
    }

    /// Drops the originating reference, and its document if nothing is left.
    pub fn exclude(&mut self, originating: &OriginatingReference) {
        let Some(references) = self.documents.get_mut(&originating.document_path) else {
            return;
        };
        references.retain(|r| !originating.matches(r));
        if references.is_empty() {
            self.documents.remove(&originating.document_path);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, document_path: &str) -> Option<&[Reference]> {
        self.documents.get(document_path).map(Vec::as_slice)
    }

    pub fn documents(&self) -> impl Iterator<Item = (&str, &[Reference])> {
        self.documents
            .iter()
            .map(|(path, refs)| (path.as_str(), refs.as_slice()))
    }

    pub fn stats(&self) -> RewriteStats {
        RewriteStats {
            files: self.documents.len(),
            links: self.documents.values().map(Vec::len).sum(),
        }
    }
}

/// Every reference to `resource`, grouped by document.
pub fn find_references(index: &dyn ReferenceIndex, resource: &str) -> ReferenceGroup {
    ReferenceGroup::from_references(index.references_to(resource))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(doc: &str, line: usize, ch: usize) -> Reference {
        Reference {
            document_path: doc.to_owned(),
            start: Position::new(line, ch),
            end: Position::new(line, ch + 12),
            link_text: "![[cat.png]]".to_owned(),
        }
    }

    fn resolve_cats(link: &str, _from: &str) -> Option<String> {
        (link == "cat.png" || link == "img/cat.png").then(|| "img/cat.png".to_owned())
    }

    #[test]
    fn test_references_in_document_positions() {
        let text = "intro\nsee ![[cat.png]] and [dog](dog.png)\n![x](img/cat.png)";
        let refs = references_in_document("a.md", text, "img/cat.png", resolve_cats);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].start, Position::new(1, 4));
        assert_eq!(refs[0].end, Position::new(1, 16));
        assert_eq!(refs[0].link_text, "![[cat.png]]");
        assert_eq!(refs[1].start, Position::new(2, 0));
        assert_eq!(refs[1].link_text, "![x](img/cat.png)");
    }

    #[test]
    fn test_commented_links_are_not_references() {
        let text = "<!--![[cat.png]]-->\n![[cat.png]] <!-- multi\n![[cat.png]] -->";
        let refs = references_in_document("a.md", text, "img/cat.png", resolve_cats);

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].start, Position::new(1, 0));
    }

    #[test]
    fn test_links_in_code_are_not_references() {
        let text = concat!(
            "```md\n![[cat.png]]\n```\n",
            "inline `![[cat.png]]` here\n",
            "~~~~\n![x](img/cat.png)\n~~~~",
        );
        let refs = references_in_document("a.md", text, "img/cat.png", resolve_cats);
        assert!(refs.is_empty(), "{refs:?}");

        let text = "``a ` ![[cat.png]]`` then ![[cat.png]] and `unclosed ![[cat.png]]";
        let refs = references_in_document("a.md", text, "img/cat.png", resolve_cats);
        let starts: Vec<Position> = refs.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![Position::new(0, 26), Position::new(0, 53)]);
    }

    #[test]
    fn test_links_after_fenced_block_are_references() {
        let text = "```\ncode\n```\n![[cat.png]]";
        let refs = references_in_document("a.md", text, "img/cat.png", resolve_cats);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].start, Position::new(3, 0));
    }

    #[test]
    fn test_mask_code_keeps_positions() {
        let text = "é `x`\n```\nbody\n```\nok";
        let masked = mask_code(text);
        assert_eq!(masked.chars().count(), text.chars().count());
        let blanks = |n: usize| " ".repeat(n);
        assert_eq!(
            masked,
            format!("é {}\n{}\n{}\n{}\nok", blanks(3), blanks(3), blanks(4), blanks(3))
        );
    }

    #[test]
    fn test_mask_comments_keeps_positions() {
        let masked = mask_comments("a<!--é\nb-->c<!--open");
        assert_eq!(masked.chars().count(), "a<!--é\nb-->c<!--open".chars().count());
        assert_eq!(
            masked,
            format!("a{}\n{}c{}", " ".repeat(5), " ".repeat(4), " ".repeat(8))
        );
    }

    #[test]
    fn test_remote_links_are_not_references() {
        let refs = references_in_document(
            "a.md",
            "![](https://cdn.example/cat.png)",
            "img/cat.png",
            |_, _| Some("img/cat.png".to_owned()),
        );
        assert!(refs.is_empty());
    }

    #[test]
    fn test_group_by_document() {
        let group = ReferenceGroup::from_references([
            reference("b.md", 3, 0),
            reference("a.md", 0, 0),
            reference("b.md", 1, 0),
        ]);

        assert_eq!(group.stats(), RewriteStats { files: 2, links: 3 });
        let b = group.get("b.md").unwrap();
        assert_eq!(b[0].start, Position::new(1, 0));
        assert_eq!(b[1].start, Position::new(3, 0));
    }

    #[test]
    fn test_exclude_removes_emptied_document() {
        let mut group =
            ReferenceGroup::from_references([reference("a.md", 0, 0), reference("b.md", 0, 0)]);
        group.exclude(&OriginatingReference {
            document_path: "a.md".to_owned(),
            start: Position::new(0, 0),
        });

        assert!(group.get("a.md").is_none());
        assert_eq!(group.stats(), RewriteStats { files: 1, links: 1 });
    }

    #[test]
    fn test_exclude_keeps_other_references_in_same_document() {
        let mut group =
            ReferenceGroup::from_references([reference("a.md", 0, 0), reference("a.md", 5, 2)]);
        group.exclude(&OriginatingReference {
            document_path: "a.md".to_owned(),
            start: Position::new(0, 0),
        });

        assert_eq!(group.get("a.md").unwrap().len(), 1);
    }

    #[test]
    fn test_find_references_empty() {
        struct NoRefs;
        impl ReferenceIndex for NoRefs {
            fn references_to(&self, _resource: &str) -> Vec<Reference> {
                Vec::new()
            }
        }
        assert!(find_references(&NoRefs, "x.png").is_empty());
    }
}
