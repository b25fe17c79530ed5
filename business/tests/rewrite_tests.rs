//! End-to-end tests of upload, link parsing and reference rewriting through
//! the public API.

use imgdrop_business::{
    MemoryVault, OriginatingReference, Position, RewriteStats, StringBuffer, UploadCoordinator,
    UploadRequest, apply_rewrite, link_at, propose_rewrite,
};
use imgdrop_input::HostFile;
use imgdrop_storage::MockBlobStore;

const URL: &str = "https://cdn.example/abc.png";

fn vault() -> MemoryVault {
    let vault = MemoryVault::new();
    vault.insert_file("assets/pasted image 1.png", vec![0; 8], 0);
    vault.insert_note("a.md", "![[pasted image 1.png]]");
    vault.insert_note("folder/b.md", "x ![shot](../assets/pasted%20image%201.png) y");
    vault.insert_note(
        "folder/c.md",
        "[[pasted image 1.png|the shot]]\n![[pasted image 1.png|400]]",
    );
    vault.insert_note("d.md", "no links");
    vault
}

/// Tests for the rewrite plan
mod proposal_tests {
    use super::*;

    #[test]
    fn test_proposal_covers_every_other_document() {
        let vault = vault();
        let origin = OriginatingReference {
            document_path: "a.md".to_owned(),
            start: Position::new(0, 0),
        };

        let plan = propose_rewrite(&vault, "assets/pasted image 1.png", URL, &origin).unwrap();

        assert_eq!(plan.stats(), RewriteStats { files: 2, links: 3 });
        assert!(plan.group.get("a.md").is_none());
        assert!(plan.group.get("d.md").is_none());
    }

    #[test]
    fn test_unknown_resource_has_no_proposal() {
        let vault = vault();
        let origin = OriginatingReference {
            document_path: "a.md".to_owned(),
            start: Position::new(0, 0),
        };
        assert!(propose_rewrite(&vault, "assets/other.png", URL, &origin).is_none());
    }
}

/// Tests for applying a plan
mod apply_tests {
    use super::*;

    #[tokio::test]
    async fn test_every_link_form_is_rewritten() {
        let vault = vault();
        let origin = OriginatingReference {
            document_path: "a.md".to_owned(),
            start: Position::new(0, 0),
        };
        let plan = propose_rewrite(&vault, "assets/pasted image 1.png", URL, &origin).unwrap();

        let report = apply_rewrite(&vault, &plan.group, URL).await.unwrap();

        assert_eq!(report.links, 3);
        assert_eq!(vault.note("folder/b.md").unwrap(), format!("x ![shot]({URL}) y"));
        assert_eq!(
            vault.note("folder/c.md").unwrap(),
            format!("[the shot]({URL})\n![]({URL})")
        );
        assert_eq!(vault.note("a.md").unwrap(), "![[pasted image 1.png]]");
    }
}

/// Tests for a full local upload without an orchestrator
mod upload_tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_rewrite() {
        let vault = vault();
        let store = MockBlobStore::new();
        store.respond_with_url(URL);
        let coordinator = UploadCoordinator::new(store.clone());

        let note = StringBuffer::new("![[pasted image 1.png]]");
        let link = link_at("![[pasted image 1.png]]", 3).unwrap();
        assert_eq!(link.target, "pasted image 1.png");

        let file = HostFile::new("pasted image 1.png", vec![0; 8], "image/png", 0);
        let outcome = coordinator
            .upload(UploadRequest::from_file(file), &note, Some(Position::new(1, 0)))
            .await;
        let url = outcome.url().unwrap();
        assert_eq!(store.calls()[0].content_type, "image/png");

        let origin = OriginatingReference {
            document_path: "a.md".to_owned(),
            start: Position::new(0, link.start),
        };
        let plan = propose_rewrite(&vault, "assets/pasted image 1.png", url, &origin).unwrap();
        let report = apply_rewrite(&vault, &plan.group, url).await.unwrap();

        assert_eq!(report.documents, vec!["folder/b.md".to_owned(), "folder/c.md".to_owned()]);
        assert!(coordinator.in_flight().is_empty());
    }
}
