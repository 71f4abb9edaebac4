//! Integration tests for the folder/file tree.

mod helpers;

use std::collections::HashSet;

use bytes::Bytes;

use dataroom_core::error::ErrorKind;
use dataroom_core::traits::BlobStore;
use dataroom_core::types::{NodeId, RoomId};
use dataroom_entity::node::{NewFile, NodeType};

use helpers::{PDF_BODY, TestRoom};

#[tokio::test]
async fn test_create_folder_sets_fields() {
    let app = TestRoom::new().await;

    let folder = app.folder(None, "Due Diligence").await;

    assert_eq!(folder.name, "Due Diligence");
    assert_eq!(folder.name_lower, "due diligence");
    assert_eq!(folder.node_type, NodeType::Folder);
    assert_eq!(folder.room_id, app.room_id());
    assert!(folder.parent_id.is_none());
    assert_eq!(folder.created_at, folder.updated_at);
    assert!(folder.size.is_none() && folder.mime.is_none() && folder.blob_id.is_none());

    let stored = app.nodes.get_node(folder.id).await.unwrap().unwrap();
    assert_eq!(stored, folder);
}

#[tokio::test]
async fn test_names_are_stored_as_given() {
    let app = TestRoom::new().await;

    let folder = app.folder(None, "  Reports ").await;
    let file = app.pdf(None, " Deck.pdf", PDF_BODY).await;
    let renamed = app.folder(None, "Quarter").await;
    app.nodes.rename_node(renamed.id, "Q3 ").await.unwrap();

    assert_eq!(folder.name, "  Reports ");
    assert_eq!(folder.name_lower, "  reports ");
    assert_eq!(file.name, " Deck.pdf");

    let stored = app.nodes.get_node(folder.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "  Reports ");
    let renamed = app.nodes.get_node(renamed.id).await.unwrap().unwrap();
    assert_eq!(renamed.name, "Q3 ");
}

#[tokio::test]
async fn test_create_folder_rejects_blank_name() {
    let app = TestRoom::new().await;

    let err = app
        .nodes
        .create_folder(app.room_id(), None, "   ")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidArgument);
    assert_eq!(app.count("nodes").await, 0);
}

#[tokio::test]
async fn test_case_insensitive_collision_gets_suffix() {
    let app = TestRoom::new().await;

    let first = app.folder(None, "Reports").await;
    let second = app.folder(None, "reports").await;
    let third = app.folder(None, "REPORTS").await;

    assert_eq!(first.name, "Reports");
    assert_eq!(second.name, "reports (1)");
    assert_eq!(third.name, "REPORTS (2)");
}

#[tokio::test]
async fn test_same_name_allowed_in_different_groups() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(None, "B").await;

    let under_a = app.folder(Some(a.id), "Contracts").await;
    let under_b = app.folder(Some(b.id), "Contracts").await;
    let top = app.folder(None, "Contracts").await;

    assert_eq!(under_a.name, "Contracts");
    assert_eq!(under_b.name, "Contracts");
    assert_eq!(top.name, "Contracts");

    let other = app.rooms.create_room("Other").await.unwrap();
    let elsewhere = app
        .nodes
        .create_folder(other.id, None, "Contracts")
        .await
        .unwrap();
    assert_eq!(elsewhere.name, "Contracts");
}

#[tokio::test]
async fn test_create_file_round_trip() {
    let app = TestRoom::new().await;
    let folder = app.folder(None, "Legal").await;

    let file = app.pdf(Some(folder.id), "NDA.pdf", PDF_BODY).await;

    assert_eq!(file.node_type, NodeType::File);
    assert_eq!(file.parent_id, Some(folder.id));
    assert_eq!(file.size, Some(PDF_BODY.len() as i64));
    assert_eq!(file.mime.as_deref(), Some("application/pdf"));

    let blob_id = file.blob_id.expect("file has a blob");
    let data = app.blobs.get_blob(blob_id).await.unwrap().unwrap();
    assert_eq!(&data[..], PDF_BODY);
}

#[tokio::test]
async fn test_create_file_collision_keeps_extension() {
    let app = TestRoom::new().await;

    app.pdf(None, "Report.pdf", PDF_BODY).await;
    let second = app.pdf(None, "report.PDF", PDF_BODY).await;
    let third = app.pdf(None, "REPORT.pdf", PDF_BODY).await;

    assert_eq!(second.name, "report (1).PDF");
    assert_eq!(third.name, "REPORT (2).pdf");
}

#[tokio::test]
async fn test_create_file_rejects_non_pdf_without_writing() {
    let app = TestRoom::new().await;

    let err = app
        .nodes
        .create_file(
            app.room_id(),
            None,
            NewFile::new("notes.txt", "text/plain", Bytes::from_static(b"hello")),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnsupportedType);
    assert_eq!(app.count("nodes").await, 0);
    assert_eq!(app.count("blobs").await, 0);
}

#[tokio::test]
async fn test_create_file_rolls_back_blob_when_node_insert_fails() {
    let app = TestRoom::new().await;
    app.fail_on("block_node_insert", "INSERT ON nodes").await;

    let err = app
        .nodes
        .create_file(
            app.room_id(),
            None,
            NewFile::pdf("Deck.pdf", Bytes::from_static(PDF_BODY)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Storage);
    assert_eq!(app.count("blobs").await, 0);
    assert_eq!(app.count("nodes").await, 0);
}

#[tokio::test]
async fn test_create_rejects_invalid_parent() {
    let app = TestRoom::new().await;
    let file = app.pdf(None, "Deck.pdf", PDF_BODY).await;
    let other = app.rooms.create_room("Other").await.unwrap();
    let foreign = app
        .nodes
        .create_folder(other.id, None, "Foreign")
        .await
        .unwrap();

    for parent in [NodeId::new(), file.id, foreign.id] {
        let err = app
            .nodes
            .create_folder(app.room_id(), Some(parent), "Child")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = app
            .nodes
            .create_file(
                app.room_id(),
                Some(parent),
                NewFile::pdf("Child.pdf", Bytes::from_static(PDF_BODY)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    let err = app
        .nodes
        .create_folder(RoomId::new(), None, "Orphan")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);

    // Only the deck and the foreign folder exist; the deck's blob is the only payload.
    assert_eq!(app.count("nodes").await, 2);
    assert_eq!(app.count("blobs").await, 1);
}

#[tokio::test]
async fn test_rename_updates_name_and_timestamp() {
    let app = TestRoom::new().await;
    let folder = app.folder(None, "Draft").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    app.nodes.rename_node(folder.id, "Final").await.unwrap();

    let renamed = app.nodes.get_node(folder.id).await.unwrap().unwrap();
    assert_eq!(renamed.name, "Final");
    assert_eq!(renamed.name_lower, "final");
    assert_eq!(renamed.created_at, folder.created_at);
    assert!(renamed.updated_at > folder.updated_at);
}

#[tokio::test]
async fn test_rename_collision_gets_suffix() {
    let app = TestRoom::new().await;
    app.folder(None, "Finance").await;
    let other = app.folder(None, "Other").await;

    app.nodes.rename_node(other.id, "FINANCE").await.unwrap();

    let renamed = app.nodes.get_node(other.id).await.unwrap().unwrap();
    assert_eq!(renamed.name, "FINANCE (1)");
}

#[tokio::test]
async fn test_rename_case_only_change_is_noop() {
    let app = TestRoom::new().await;
    let folder = app.folder(None, "Finance").await;

    app.nodes.rename_node(folder.id, "FINANCE").await.unwrap();
    app.nodes.rename_node(folder.id, "Finance").await.unwrap();

    let stored = app.nodes.get_node(folder.id).await.unwrap().unwrap();
    assert_eq!(stored, folder);
}

#[tokio::test]
async fn test_rename_missing_node_is_noop() {
    let app = TestRoom::new().await;

    app.nodes.rename_node(NodeId::new(), "Ghost").await.unwrap();

    assert_eq!(app.count("nodes").await, 0);
}

#[tokio::test]
async fn test_rename_rejects_blank_name() {
    let app = TestRoom::new().await;
    let folder = app.folder(None, "Keep").await;

    let err = app.nodes.rename_node(folder.id, "").await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidArgument);
    let stored = app.nodes.get_node(folder.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Keep");
}

#[tokio::test]
async fn test_get_nodes_by_parent_orders_folders_first() {
    let app = TestRoom::new().await;
    app.pdf(None, "zeta.pdf", PDF_BODY).await;
    app.folder(None, "beta").await;
    app.pdf(None, "Able.pdf", PDF_BODY).await;
    app.folder(None, "Zulu").await;
    app.folder(None, "Alpha").await;

    let names: Vec<String> = app
        .nodes
        .get_nodes_by_parent(Some(app.room_id()), None)
        .await
        .unwrap()
        .into_iter()
        .map(|node| node.name)
        .collect();

    assert_eq!(names, vec!["Alpha", "Zulu", "beta", "Able.pdf", "zeta.pdf"]);
}

#[tokio::test]
async fn test_get_nodes_by_parent_without_room_is_empty() {
    let app = TestRoom::new().await;
    app.folder(None, "Visible").await;

    let nodes = app.nodes.get_nodes_by_parent(None, None).await.unwrap();

    assert!(nodes.is_empty());
}

#[tokio::test]
async fn test_list_children_and_sibling_names() {
    let app = TestRoom::new().await;
    let parent = app.folder(None, "Parent").await;
    let a = app.folder(Some(parent.id), "Alpha").await;
    let b = app.pdf(Some(parent.id), "Beta.pdf", PDF_BODY).await;
    app.folder(None, "Elsewhere").await;

    let children: HashSet<NodeId> = app
        .nodes
        .list_children(app.room_id(), Some(parent.id))
        .await
        .unwrap()
        .into_iter()
        .map(|node| node.id)
        .collect();
    assert_eq!(children, HashSet::from([a.id, b.id]));

    let names = app
        .nodes
        .list_sibling_name_set(app.room_id(), Some(parent.id))
        .await
        .unwrap();
    assert_eq!(
        names,
        HashSet::from(["alpha".to_string(), "beta.pdf".to_string()])
    );

    let top = app
        .nodes
        .list_sibling_name_set(app.room_id(), None)
        .await
        .unwrap();
    assert_eq!(
        top,
        HashSet::from(["parent".to_string(), "elsewhere".to_string()])
    );
}

#[tokio::test]
async fn test_collect_descendants_bfs_order() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(a.id), "B").await;
    let c = app.pdf(Some(a.id), "C.pdf", PDF_BODY).await;
    let d = app.folder(Some(b.id), "D").await;
    app.folder(None, "Unrelated").await;

    let ids = app.nodes.collect_descendants_bfs(a.id).await.unwrap();

    assert_eq!(ids.len(), 4);
    assert_eq!(ids[0], a.id);
    assert_eq!(
        ids[1..3].iter().copied().collect::<HashSet<_>>(),
        HashSet::from([b.id, c.id])
    );
    assert_eq!(ids[3], d.id);
}

#[tokio::test]
async fn test_collect_descendants_of_leaf_or_missing_is_self() {
    let app = TestRoom::new().await;
    let leaf = app.folder(None, "Leaf").await;
    let missing = NodeId::new();

    assert_eq!(
        app.nodes.collect_descendants_bfs(leaf.id).await.unwrap(),
        vec![leaf.id]
    );
    assert_eq!(
        app.nodes.collect_descendants_bfs(missing).await.unwrap(),
        vec![missing]
    );
}

#[tokio::test]
async fn test_delete_cascade_removes_subtree_and_blobs() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(a.id), "B").await;
    let c = app.pdf(Some(b.id), "C.pdf", PDF_BODY).await;
    let keep = app.pdf(None, "Keep.pdf", PDF_BODY).await;

    app.nodes.delete_cascade(a.id).await.unwrap();

    for id in [a.id, b.id, c.id] {
        assert!(app.nodes.get_node(id).await.unwrap().is_none());
    }
    let blob_id = c.blob_id.expect("file has a blob");
    assert!(app.blobs.get_blob(blob_id).await.unwrap().is_none());

    assert!(app.nodes.get_node(keep.id).await.unwrap().is_some());
    assert_eq!(app.count("nodes").await, 1);
    assert_eq!(app.count("blobs").await, 1);
}

#[tokio::test]
async fn test_delete_cascade_of_missing_node_is_noop() {
    let app = TestRoom::new().await;
    app.folder(None, "Stay").await;

    app.nodes.delete_cascade(NodeId::new()).await.unwrap();

    assert_eq!(app.count("nodes").await, 1);
}

#[tokio::test]
async fn test_delete_cascade_is_atomic() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    app.pdf(Some(a.id), "Inside.pdf", PDF_BODY).await;
    app.fail_on("block_node_delete", "DELETE ON nodes").await;

    let err = app.nodes.delete_cascade(a.id).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Storage);
    assert_eq!(app.count("nodes").await, 2);
    assert_eq!(app.count("blobs").await, 1);
}

#[tokio::test]
async fn test_resolve_path_is_case_insensitive() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(a.id), "B").await;

    let found = app
        .nodes
        .resolve_path(app.room_id(), &["a", "B"])
        .await
        .unwrap()
        .expect("path resolves");
    assert_eq!(found.id, b.id);

    let missing = app
        .nodes
        .resolve_path(app.room_id(), &["A", "missing"])
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_resolve_path_only_walks_folders() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    app.pdf(Some(a.id), "Deck.pdf", PDF_BODY).await;

    let file = app
        .nodes
        .resolve_path(app.room_id(), &["A", "Deck.pdf"])
        .await
        .unwrap();
    assert!(file.is_none());

    let empty: [&str; 0] = [];
    let root = app.nodes.resolve_path(app.room_id(), &empty).await.unwrap();
    assert!(root.is_none());
}

#[tokio::test]
async fn test_ancestors_builds_breadcrumbs() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(a.id), "B").await;
    let c = app.pdf(Some(b.id), "C.pdf", PDF_BODY).await;

    let trail: Vec<NodeId> = app
        .nodes
        .ancestors(c.id)
        .await
        .unwrap()
        .into_iter()
        .map(|node| node.id)
        .collect();
    assert_eq!(trail, vec![a.id, b.id, c.id]);

    assert!(app.nodes.ancestors(NodeId::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_file_returns_payload() {
    let app = TestRoom::new().await;
    let folder = app.folder(None, "Docs").await;
    let file = app.pdf(Some(folder.id), "Deck.pdf", PDF_BODY).await;

    let (node, data) = app.nodes.read_file(file.id).await.unwrap().expect("file");
    assert_eq!(node.id, file.id);
    assert_eq!(&data[..], PDF_BODY);

    assert!(app.nodes.read_file(folder.id).await.unwrap().is_none());
    assert!(app.nodes.read_file(NodeId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_count_in_room() {
    let app = TestRoom::new().await;
    let a = app.folder(None, "A").await;
    app.pdf(Some(a.id), "B.pdf", PDF_BODY).await;
    let other = app.rooms.create_room("Other").await.unwrap();
    app.nodes.create_folder(other.id, None, "X").await.unwrap();

    assert_eq!(app.nodes.count_in_room(app.room_id()).await.unwrap(), 2);
    assert_eq!(app.nodes.count_in_room(other.id).await.unwrap(), 1);
}
