use cdn_store::storage::models::{Credential, Identity, Role, RoleSet, RuntimeConfig};
use cdn_store::storage::{Database, RoleChange, StoreError};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn alice() -> Identity {
    Identity::new("alice")
}

fn roles(list: &[Role]) -> RoleSet {
    list.iter().copied().collect()
}

fn credential(seed: u8) -> Credential {
    Credential {
        iterations: 1,
        salt: vec![seed; 16],
        hash: vec![seed; 32],
    }
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_put_and_get_file() {
    let (_dir, db) = test_db();

    let meta = db
        .put_file("file-1", "hello.txt", "text/plain", b"hello world", &alice())
        .unwrap();
    assert_eq!(meta.id, "file-1");
    assert_eq!(meta.byte_size, 11);
    assert_eq!(meta.sequence, 1);
    assert_eq!(
        meta.sha256,
        "b94d27b9934d3e08a52e52d7da7dacfac484efe37a5380ee9088f7ace2efcde9"
    );

    let stored = db.get_file("file-1").unwrap();
    assert_eq!(stored.meta, meta);
    assert_eq!(stored.content.as_ref(), b"hello world");
    assert_eq!(stored.meta.uploader, alice());
    assert_eq!(stored.meta.content_type, "text/plain");
}

#[test]
fn test_put_empty_file() {
    let (_dir, db) = test_db();
    db.put_file("empty", "empty.bin", "application/octet-stream", b"", &alice())
        .unwrap();

    let stored = db.get_file("empty").unwrap();
    assert!(stored.content.is_empty());
    assert_eq!(stored.meta.byte_size, 0);
}

#[test]
fn test_put_duplicate_id_conflicts() {
    let (_dir, db) = test_db();
    db.put_file("dup", "a.txt", "text/plain", b"first", &alice())
        .unwrap();

    let err = db
        .put_file("dup", "b.txt", "text/plain", b"second", &alice())
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(ref id) if id == "dup"));

    // The original record is untouched
    let stored = db.get_file("dup").unwrap();
    assert_eq!(stored.meta.filename, "a.txt");
    assert_eq!(stored.content.as_ref(), b"first");
    assert_eq!(db.list_files().unwrap().len(), 1);
}

#[test]
fn test_get_file_not_found() {
    let (_dir, db) = test_db();
    assert!(matches!(
        db.get_file("nonexistent"),
        Err(StoreError::NotFound(_))
    ));
    assert!(db.get_file_meta("nonexistent").unwrap().is_none());
}

#[test]
fn test_list_files_in_upload_order() {
    let (_dir, db) = test_db();
    for id in ["zeta", "alpha", "mid"] {
        db.put_file(id, &format!("{id}.txt"), "text/plain", id.as_bytes(), &alice())
            .unwrap();
    }

    let files = db.list_files().unwrap();
    let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["zeta", "alpha", "mid"]);

    let sequences: Vec<u64> = files.iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert!(files
        .windows(2)
        .all(|w| w[0].uploaded_at <= w[1].uploaded_at));
}

#[test]
fn test_delete_file() {
    let (_dir, db) = test_db();
    db.put_file("a", "a.txt", "text/plain", b"a", &alice()).unwrap();
    db.put_file("b", "b.txt", "text/plain", b"b", &alice()).unwrap();

    let removed = db.delete_file("a").unwrap();
    assert_eq!(removed.id, "a");

    assert!(matches!(db.get_file("a"), Err(StoreError::NotFound(_))));
    let ids: Vec<String> = db.list_files().unwrap().into_iter().map(|f| f.id).collect();
    assert_eq!(ids, vec!["b".to_string()]);

    assert!(matches!(db.delete_file("a"), Err(StoreError::NotFound(_))));
}

#[test]
fn test_sequence_keeps_growing_after_delete() {
    let (_dir, db) = test_db();
    db.put_file("a", "a.txt", "text/plain", b"a", &alice()).unwrap();
    db.delete_file("a").unwrap();

    let meta = db.put_file("b", "b.txt", "text/plain", b"b", &alice()).unwrap();
    assert_eq!(meta.sequence, 2);
}

#[test]
fn test_clear_files() {
    let (_dir, db) = test_db();
    for i in 0..5 {
        db.put_file(&format!("f{i}"), "x.txt", "text/plain", b"x", &alice())
            .unwrap();
    }

    assert_eq!(db.clear_files().unwrap(), 5);
    assert!(db.list_files().unwrap().is_empty());
    assert!(matches!(db.get_file("f0"), Err(StoreError::NotFound(_))));

    // Clearing an empty store is fine
    assert_eq!(db.clear_files().unwrap(), 0);
}

// ============================================================================
// Roles
// ============================================================================

#[test]
fn test_insert_identity_once() {
    let (_dir, db) = test_db();
    assert!(db
        .insert_identity("alice", &roles(&[Role::Viewer]), &credential(1))
        .unwrap());
    assert!(!db
        .insert_identity("alice", &roles(&[Role::Admin]), &credential(2))
        .unwrap());

    assert_eq!(db.get_roles("alice").unwrap(), Some(roles(&[Role::Viewer])));
    assert_eq!(db.get_credential("alice").unwrap(), Some(credential(1)));
    assert_eq!(db.get_roles("bob").unwrap(), None);
    assert_eq!(db.get_credential("bob").unwrap(), None);
}

#[test]
fn test_add_role_is_idempotent() {
    let (_dir, db) = test_db();
    db.insert_identity("alice", &RoleSet::new(), &credential(1))
        .unwrap();

    let first = db.add_role("alice", Role::Publisher).unwrap();
    let second = db.add_role("alice", Role::Publisher).unwrap();

    assert_eq!(first, RoleChange::Applied(roles(&[Role::Publisher])));
    assert_eq!(first, second);
}

#[test]
fn test_add_role_to_unknown_identity() {
    let (_dir, db) = test_db();
    assert_eq!(
        db.add_role("nobody", Role::Viewer).unwrap(),
        RoleChange::UnknownIdentity
    );
    assert_eq!(db.get_roles("nobody").unwrap(), None);
}

#[test]
fn test_seed_admin_sets_role_and_credential() {
    let (_dir, db) = test_db();
    db.insert_identity("root", &roles(&[Role::Viewer]), &credential(1))
        .unwrap();

    let seeded = db.seed_admin("root", &credential(9)).unwrap();
    assert_eq!(seeded, roles(&[Role::Viewer, Role::Admin]));
    assert_eq!(db.get_credential("root").unwrap(), Some(credential(9)));

    db.seed_admin("fresh", &credential(3)).unwrap();
    assert_eq!(db.get_roles("fresh").unwrap(), Some(roles(&[Role::Admin])));
    assert_eq!(db.admin_count().unwrap(), 2);
}

#[test]
fn test_remove_role() {
    let (_dir, db) = test_db();
    db.insert_identity(
        "alice",
        &roles(&[Role::Viewer, Role::Publisher]),
        &credential(1),
    )
    .unwrap();

    assert_eq!(
        db.remove_role("alice", Role::Publisher).unwrap(),
        RoleChange::Applied(roles(&[Role::Viewer]))
    );
    // Removing a role that is not held changes nothing
    assert_eq!(
        db.remove_role("alice", Role::Admin).unwrap(),
        RoleChange::Applied(roles(&[Role::Viewer]))
    );
    assert_eq!(
        db.remove_role("nobody", Role::Viewer).unwrap(),
        RoleChange::UnknownIdentity
    );
}

#[test]
fn test_remove_last_admin_is_refused() {
    let (_dir, db) = test_db();
    db.seed_admin("root", &credential(1)).unwrap();

    assert_eq!(
        db.remove_role("root", Role::Admin).unwrap(),
        RoleChange::LastAdmin
    );
    assert_eq!(db.admin_count().unwrap(), 1);

    db.seed_admin("second", &credential(2)).unwrap();
    assert_eq!(
        db.remove_role("root", Role::Admin).unwrap(),
        RoleChange::Applied(RoleSet::new())
    );
    assert_eq!(db.admin_count().unwrap(), 1);
    assert_eq!(
        db.remove_role("second", Role::Admin).unwrap(),
        RoleChange::LastAdmin
    );
}

#[test]
fn test_all_roles() {
    let (_dir, db) = test_db();
    db.seed_admin("root", &credential(1)).unwrap();
    db.insert_identity("alice", &roles(&[Role::Viewer]), &credential(2))
        .unwrap();

    let all = db.all_roles().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["root"], roles(&[Role::Admin]));
    assert_eq!(all["alice"], roles(&[Role::Viewer]));
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_runtime_config_defaults_when_unset() {
    let (_dir, db) = test_db();
    assert_eq!(db.load_runtime_config().unwrap(), RuntimeConfig::default());
}

#[test]
fn test_save_and_load_runtime_config() {
    let (_dir, db) = test_db();
    let config = RuntimeConfig {
        max_file_size: 1234,
        uploads_enabled: false,
        custom_domain: Some("cdn.example.com".to_string()),
    };

    db.save_runtime_config(&config).unwrap();
    assert_eq!(db.load_runtime_config().unwrap(), config);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");

    {
        let db = Database::open(&data_dir).unwrap();
        db.put_file("keep", "keep.txt", "text/plain", b"persisted", &alice())
            .unwrap();
        db.seed_admin("root", &credential(1)).unwrap();
        db.save_runtime_config(&RuntimeConfig {
            max_file_size: 10,
            ..Default::default()
        })
        .unwrap();
    }

    let db = Database::open(&data_dir).unwrap();
    assert_eq!(db.get_file("keep").unwrap().content.as_ref(), b"persisted");
    assert_eq!(db.get_roles("root").unwrap(), Some(roles(&[Role::Admin])));
    assert_eq!(db.get_credential("root").unwrap(), Some(credential(1)));
    assert_eq!(db.load_runtime_config().unwrap().max_file_size, 10);

    let meta = db.put_file("next", "next.txt", "text/plain", b"", &alice()).unwrap();
    assert_eq!(meta.sequence, 2);
}
