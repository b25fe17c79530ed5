//! Rewrites every other reference to an uploaded resource.
//!
//! [`propose_rewrite`] computes the plan; [`apply_rewrite`] commits it one
//! document at a time. Documents are edited independently: an error stops the
//! run, and the documents already written stay written.

use crate::buffer::offset_of;
use crate::links::parse_link;
use crate::references::{
    OriginatingReference, Reference, ReferenceGroup, ReferenceIndex, RewriteStats,
    find_references,
};
use crate::vault::{Vault, VaultError};

/// References to move over to `new_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    pub resource: String,
    pub new_url: String,
    pub group: ReferenceGroup,
}

impl RewritePlan {
    pub fn stats(&self) -> RewriteStats {
        self.group.stats()
    }
}

/// Plan for the references to `resource` other than `originating`, if any.
pub fn propose_rewrite(
    index: &dyn ReferenceIndex,
    resource: &str,
    new_url: &str,
    originating: &OriginatingReference,
) -> Option<RewritePlan> {
    let mut group = find_references(index, resource);
    group.exclude(originating);

    if group.is_empty() {
        log::debug!(
            target: "imgdrop_business::rewriter",
            "no_other_references resource={resource}"
        );
        return None;
    }

    Some(RewritePlan {
        resource: resource.to_owned(),
        new_url: new_url.to_owned(),
        group,
    })
}

/// Result of a completed rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RewriteReport {
    /// Documents written, in processing order.
    pub documents: Vec<String>,
    pub links: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("Rewrite stopped at {failed}: {source}")]
    PartialRewriteFailure {
        /// Documents written before the failure. These are not reverted.
        applied: Vec<String>,
        failed: String,
        #[source]
        source: VaultError,
    },
}

/// Rewrites `references` inside `text`, returning the new text and the
/// number of links replaced.
///
/// References are applied from the last one backwards so earlier positions
/// stay valid. A reference whose range no longer holds its link text is
/// skipped.
pub fn rewrite_text(text: &str, references: &[Reference], new_url: &str) -> (String, usize) {
    let mut located: Vec<(usize, usize, &Reference)> = references
        .iter()
        .map(|r| (offset_of(text, r.start), offset_of(text, r.end), r))
        .collect();
    located.sort_by(|a, b| b.0.cmp(&a.0));

    let mut output = text.to_owned();
    let mut replaced = 0;
    let mut floor = usize::MAX;

    for (start, end, reference) in located {
        if end > floor {
            continue;
        }
        if text.get(start..end) != Some(reference.link_text.as_str()) {
            log::debug!(
                target: "imgdrop_business::rewriter",
                "reference_moved document={} start={:?}",
                reference.document_path,
                reference.start
            );
            continue;
        }
        let Some(link) = parse_link(&reference.link_text) else {
            continue;
        };

        output.replace_range(start..end, &link.render_replacement(new_url));
        replaced += 1;
        floor = start;
    }

    (output, replaced)
}

/// Rewrites every document of `group` to point at `new_url`.
pub async fn apply_rewrite(
    vault: &dyn Vault,
    group: &ReferenceGroup,
    new_url: &str,
) -> Result<RewriteReport, RewriteError> {
    let mut report = RewriteReport::default();

    for (path, references) in group.documents() {
        let fail = |report: RewriteReport, source: VaultError| {
            log::error!(
                target: "imgdrop_business::rewriter",
                "rewrite_failed document={path} error={source}"
            );
            RewriteError::PartialRewriteFailure {
                applied: report.documents,
                failed: path.to_owned(),
                source,
            }
        };

        let text = match vault.read(path).await {
            Ok(text) => text,
            Err(err) => return Err(fail(report, err)),
        };

        let (rewritten, links) = rewrite_text(&text, references, new_url);
        if links == 0 {
            continue;
        }

        if let Err(err) = vault.modify(path, &rewritten).await {
            return Err(fail(report, err));
        }

        log::debug!(
            target: "imgdrop_business::rewriter",
            "document_rewritten document={path} links={links}"
        );
        report.documents.push(path.to_owned());
        report.links += links;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Position;
    use crate::vault::MemoryVault;

    const URL: &str = "https://cdn.example/abc.png";

    fn vault_with_three_notes() -> MemoryVault {
        let vault = MemoryVault::new();
        vault.insert_file("img/cat.png", vec![1, 2, 3], 0);
        vault.insert_note("a.md", "![[cat.png]]");
        vault.insert_note("b.md", "B ![[cat.png]] end");
        vault.insert_note("c.md", "one ![c](img/cat.png)\ntwo [[cat.png|kitty]]");
        vault
    }

    fn origin(path: &str) -> OriginatingReference {
        OriginatingReference {
            document_path: path.to_owned(),
            start: Position::new(0, 0),
        }
    }

    #[test]
    fn test_propose_rewrite_excludes_originating_reference() {
        let vault = vault_with_three_notes();

        let plan = propose_rewrite(&vault, "img/cat.png", URL, &origin("a.md")).unwrap();

        let docs: Vec<&str> = plan.group.documents().map(|(path, _)| path).collect();
        assert_eq!(docs, vec!["b.md", "c.md"]);
        assert_eq!(plan.stats(), RewriteStats { files: 2, links: 3 });
    }

    #[test]
    fn test_propose_rewrite_none_when_only_originating() {
        let vault = MemoryVault::new();
        vault.insert_file("img/cat.png", vec![1], 0);
        vault.insert_note("a.md", "![[cat.png]]");

        assert!(propose_rewrite(&vault, "img/cat.png", URL, &origin("a.md")).is_none());
    }

    #[test]
    fn test_rewrite_text_keeps_surrounding_text() {
        let text = "one ![c](img/cat.png)\ntwo [[cat.png|kitty]] three ![[cat.png]]";
        let refs = [
            Reference {
                document_path: "c.md".to_owned(),
                start: Position::new(0, 4),
                end: Position::new(0, 21),
                link_text: "![c](img/cat.png)".to_owned(),
            },
            Reference {
                document_path: "c.md".to_owned(),
                start: Position::new(1, 4),
                end: Position::new(1, 21),
                link_text: "[[cat.png|kitty]]".to_owned(),
            },
            Reference {
                document_path: "c.md".to_owned(),
                start: Position::new(1, 28),
                end: Position::new(1, 40),
                link_text: "![[cat.png]]".to_owned(),
            },
        ];

        let (rewritten, links) = rewrite_text(text, &refs, URL);

        assert_eq!(links, 3);
        assert_eq!(
            rewritten,
            format!("one ![c]({URL})\ntwo [kitty]({URL}) three ![]({URL})")
        );
    }

    #[test]
    fn test_rewrite_text_skips_stale_reference() {
        let refs = [Reference {
            document_path: "a.md".to_owned(),
            start: Position::new(0, 0),
            end: Position::new(0, 12),
            link_text: "![[cat.png]]".to_owned(),
        }];

        let (rewritten, links) = rewrite_text("edited since", &refs, URL);
        assert_eq!(links, 0);
        assert_eq!(rewritten, "edited since");
    }

    #[tokio::test]
    async fn test_apply_rewrite_edits_each_document() {
        let vault = vault_with_three_notes();
        let plan = propose_rewrite(&vault, "img/cat.png", URL, &origin("a.md")).unwrap();

        let report = apply_rewrite(&vault, &plan.group, &plan.new_url).await.unwrap();

        assert_eq!(report.documents, vec!["b.md".to_owned(), "c.md".to_owned()]);
        assert_eq!(report.links, 3);
        assert_eq!(vault.note("a.md").unwrap(), "![[cat.png]]");
        assert_eq!(vault.note("b.md").unwrap(), format!("B ![]({URL}) end"));
        assert_eq!(
            vault.note("c.md").unwrap(),
            format!("one ![c]({URL})\ntwo [kitty]({URL})")
        );
    }

    #[tokio::test]
    async fn test_reapplying_plan_changes_nothing() {
        let vault = vault_with_three_notes();
        let plan = propose_rewrite(&vault, "img/cat.png", URL, &origin("a.md")).unwrap();
        apply_rewrite(&vault, &plan.group, &plan.new_url).await.unwrap();
        let after_first = (vault.note("b.md"), vault.note("c.md"));
        let writes = vault.writes().len();

        let report = apply_rewrite(&vault, &plan.group, &plan.new_url).await.unwrap();

        assert_eq!(report, RewriteReport::default());
        assert_eq!((vault.note("b.md"), vault.note("c.md")), after_first);
        assert_eq!(vault.writes().len(), writes);
    }

    #[tokio::test]
    async fn test_failure_keeps_applied_documents() {
        let vault = vault_with_three_notes();
        vault.fail_writes_to("c.md");
        let plan = propose_rewrite(&vault, "img/cat.png", URL, &origin("a.md")).unwrap();

        let err = apply_rewrite(&vault, &plan.group, &plan.new_url)
            .await
            .unwrap_err();

        let RewriteError::PartialRewriteFailure { applied, failed, .. } = err;
        assert_eq!(applied, vec!["b.md".to_owned()]);
        assert_eq!(failed, "c.md");
        assert_eq!(vault.note("b.md").unwrap(), format!("B ![]({URL}) end"));
        assert!(vault.note("c.md").unwrap().contains("img/cat.png"));
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_documents() {
        let vault = vault_with_three_notes();
        vault.fail_writes_to("b.md");
        let plan = propose_rewrite(&vault, "img/cat.png", URL, &origin("a.md")).unwrap();

        assert!(apply_rewrite(&vault, &plan.group, &plan.new_url).await.is_err());
        assert!(vault.writes().is_empty());
        assert!(vault.note("c.md").unwrap().contains("img/cat.png"));
    }
}
