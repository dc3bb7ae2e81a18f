use notegrove_core::db::open_db_in_memory;
use notegrove_core::{
    NotePatch, NoteService, NoteServiceError, SqliteNoteRepository, SqliteTagRegistry,
    SqliteVersionRepository, TagService, VersionService,
};
use uuid::Uuid;

#[test]
fn create_note_records_initial_version_with_links() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();

    let created = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        service
            .create_note(
                owner,
                "Draft",
                Some("v1".to_string()),
                vec!["work".to_string(), "ideas".to_string()],
                vec!["Work".to_string()],
            )
            .unwrap()
    };
    assert_eq!(created.title, "Draft");
    assert_eq!(created.content.as_deref(), Some("v1"));
    assert_eq!(created.tags, vec!["ideas".to_string(), "work".to_string()]);
    assert_eq!(created.categories, vec!["Work".to_string()]);
    assert!(!created.is_deleted);

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let versions = VersionService::new(repo)
        .history(owner, created.uuid)
        .unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].change_summary.as_deref(), Some("initial version"));
    assert_eq!(versions[0].content.as_deref(), Some("v1"));
    assert_eq!(
        versions[0].tags,
        vec!["ideas".to_string(), "work".to_string()]
    );
    assert_eq!(versions[0].categories, vec!["Work".to_string()]);
}

#[test]
fn create_note_with_blank_title_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let err = service
        .create_note(Uuid::new_v4(), "   ", None, vec![], vec![])
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::EmptyTitle));
}

#[test]
fn successive_edits_snapshot_each_pre_update_state() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();

    let note_uuid = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        let created = service
            .create_note(owner, "Draft", Some("v1".to_string()), vec![], vec![])
            .unwrap();
        service
            .update_note(
                owner,
                created.uuid,
                NotePatch {
                    content: Some("v2".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        let after = service
            .update_note(
                owner,
                created.uuid,
                NotePatch {
                    content: Some("v3".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        assert_eq!(after.content.as_deref(), Some("v3"));
        created.uuid
    };

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let versions = VersionService::new(repo).history(owner, note_uuid).unwrap();
    let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    // Each snapshot holds the state that was live just before the edit.
    assert_eq!(versions[0].content.as_deref(), Some("v2"));
    assert_eq!(versions[0].change_summary.as_deref(), Some("updated content"));
    assert_eq!(versions[1].content.as_deref(), Some("v1"));
    assert_eq!(versions[2].content.as_deref(), Some("v1"));
}

#[test]
fn update_summary_names_every_changed_field() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();

    let note_uuid = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        let created = service
            .create_note(owner, "Draft", Some("v1".to_string()), vec![], vec![])
            .unwrap();
        service
            .update_note(
                owner,
                created.uuid,
                NotePatch {
                    title: Some("Final".to_string()),
                    content: Some("v2".to_string()),
                    tags: Some(vec!["done".to_string()]),
                    categories: Some(vec!["Work".to_string()]),
                },
            )
            .unwrap();
        created.uuid
    };

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let latest = VersionService::new(repo)
        .latest(owner, note_uuid)
        .unwrap()
        .unwrap();
    assert_eq!(
        latest.change_summary.as_deref(),
        Some("updated title, content, tags, categories")
    );
}

#[test]
fn no_op_update_does_not_snapshot() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();

    let note_uuid = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        let created = service
            .create_note(owner, "Stable", Some("same".to_string()), vec![], vec![])
            .unwrap();
        service
            .update_note(
                owner,
                created.uuid,
                NotePatch {
                    title: Some("Stable".to_string()),
                    content: Some("same".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        created.uuid
    };

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let count = VersionService::new(repo).count(owner, note_uuid).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn trash_and_restore_move_notes_between_partitions() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let created = service
        .create_note(owner, "Keep me", None, vec![], vec![])
        .unwrap();
    service.trash_note(owner, created.uuid).unwrap();

    assert!(service.get_note(owner, created.uuid).unwrap().is_none());
    let trashed = service
        .get_note_any_state(owner, created.uuid)
        .unwrap()
        .unwrap();
    assert!(trashed.is_deleted);
    assert!(trashed.deleted_at.is_some());
    assert!(service
        .list_active_notes(owner, Some(10), 0)
        .unwrap()
        .items
        .is_empty());
    assert_eq!(service.list_trash(owner, Some(10), 0).unwrap().items.len(), 1);

    service.restore_note(owner, created.uuid).unwrap();
    let restored = service.get_note(owner, created.uuid).unwrap().unwrap();
    assert!(!restored.is_deleted);
    assert!(restored.deleted_at.is_none());
}

#[test]
fn restore_of_active_note_reports_not_in_trash() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let created = service
        .create_note(owner, "Active", None, vec![], vec![])
        .unwrap();
    let err = service.restore_note(owner, created.uuid).unwrap_err();
    assert!(matches!(err, NoteServiceError::NotInTrash(_)));

    let missing = service.trash_note(owner, Uuid::new_v4()).unwrap_err();
    assert!(matches!(missing, NoteServiceError::NoteNotFound(_)));
}

#[test]
fn permanent_delete_requires_trash_and_cascades_versions() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();

    let note_uuid = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        let created = service
            .create_note(owner, "Doomed", Some("v1".to_string()), vec![], vec![])
            .unwrap();

        let premature = service
            .delete_note_permanently(owner, created.uuid)
            .unwrap_err();
        assert!(matches!(premature, NoteServiceError::NotInTrash(_)));

        service.trash_note(owner, created.uuid).unwrap();
        service.delete_note_permanently(owner, created.uuid).unwrap();
        assert!(service
            .get_note_any_state(owner, created.uuid)
            .unwrap()
            .is_none());
        created.uuid
    };

    let orphaned: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM note_versions WHERE note_uuid = ?1;",
            [note_uuid.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphaned, 0);
}

#[test]
fn empty_trash_purges_only_the_owners_deleted_notes() {
    let mut conn = open_db_in_memory().unwrap();
    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let a_trash_one = service
        .create_note(owner_a, "a1", None, vec![], vec![])
        .unwrap();
    let a_trash_two = service
        .create_note(owner_a, "a2", None, vec![], vec![])
        .unwrap();
    service
        .create_note(owner_a, "a3 stays", None, vec![], vec![])
        .unwrap();
    let b_trashed = service
        .create_note(owner_b, "b1", None, vec![], vec![])
        .unwrap();
    service.trash_note(owner_a, a_trash_one.uuid).unwrap();
    service.trash_note(owner_a, a_trash_two.uuid).unwrap();
    service.trash_note(owner_b, b_trashed.uuid).unwrap();

    let purged = service.empty_trash(owner_a).unwrap();
    assert_eq!(purged, 2);
    assert!(service.list_trash(owner_a, Some(10), 0).unwrap().items.is_empty());
    assert_eq!(
        service.list_active_notes(owner_a, Some(10), 0).unwrap().items.len(),
        1
    );
    assert_eq!(service.list_trash(owner_b, Some(10), 0).unwrap().items.len(), 1);
}

#[test]
fn notes_are_invisible_across_owners() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let created = service
        .create_note(owner, "Private", None, vec![], vec![])
        .unwrap();
    assert!(service
        .get_note_any_state(stranger, created.uuid)
        .unwrap()
        .is_none());
}

#[test]
fn tag_listing_counts_active_notes_only() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();

    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        service
            .create_note(owner, "first", None, vec!["rust".to_string()], vec![])
            .unwrap();
        let second = service
            .create_note(
                owner,
                "second",
                None,
                vec!["rust".to_string(), "cli".to_string()],
                vec![],
            )
            .unwrap();
        service.trash_note(owner, second.uuid).unwrap();
    }

    let tags = TagService::new(SqliteTagRegistry::new(&conn))
        .list_tags(owner)
        .unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "rust");
    assert_eq!(tags[0].note_count, 1);
}

#[test]
fn list_limit_defaults_to_20_and_caps_at_100() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    for idx in 0..25 {
        service
            .create_note(owner, format!("note {idx}"), None, vec![], vec![])
            .unwrap();
    }

    let defaulted = service.list_active_notes(owner, None, 0).unwrap();
    assert_eq!(defaulted.applied_limit, 20);
    assert_eq!(defaulted.items.len(), 20);

    let capped = service.list_active_notes(owner, Some(500), 0).unwrap();
    assert_eq!(capped.applied_limit, 100);
    assert_eq!(capped.items.len(), 25);
}
