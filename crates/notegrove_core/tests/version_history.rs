use notegrove_core::db::open_db_in_memory;
use notegrove_core::{
    CategoryService, NotePatch, NoteRecord, NoteService, SqliteCategoryRepository,
    SqliteNoteRepository, SqliteVersionRepository, VersionService, VersionServiceError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn create_note(
    conn: &mut Connection,
    owner: Uuid,
    title: &str,
    content: &str,
    tags: Vec<String>,
    categories: Vec<String>,
) -> NoteRecord {
    let repo = SqliteNoteRepository::try_new(conn).unwrap();
    let mut service = NoteService::new(repo);
    service
        .create_note(owner, title, Some(content.to_string()), tags, categories)
        .unwrap()
}

fn update_note(conn: &mut Connection, owner: Uuid, note_uuid: Uuid, patch: NotePatch) -> NoteRecord {
    let repo = SqliteNoteRepository::try_new(conn).unwrap();
    let mut service = NoteService::new(repo);
    service.update_note(owner, note_uuid, patch).unwrap()
}

#[test]
fn manual_snapshots_continue_the_contiguous_numbering() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(&mut conn, owner, "Draft", "v1", vec![], vec![]);

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let mut service = VersionService::new(repo);

    let manual = service.snapshot(owner, note.uuid, None).unwrap();
    assert_eq!(manual.version_number, 2);
    assert_eq!(manual.change_summary.as_deref(), Some("manual snapshot"));

    let labeled = service
        .snapshot(owner, note.uuid, Some("before publishing"))
        .unwrap();
    assert_eq!(labeled.version_number, 3);
    assert_eq!(labeled.change_summary.as_deref(), Some("before publishing"));

    let numbers: Vec<i64> = service
        .history(owner, note.uuid)
        .unwrap()
        .iter()
        .map(|version| version.version_number)
        .collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert_eq!(service.count(owner, note.uuid).unwrap(), 3);
}

#[test]
fn by_number_and_latest_resolve_single_snapshots() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(&mut conn, owner, "Draft", "v1", vec![], vec![]);
    update_note(
        &mut conn,
        owner,
        note.uuid,
        NotePatch {
            content: Some("v2".to_string()),
            ..NotePatch::default()
        },
    );

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let service = VersionService::new(repo);

    let first = service.version(owner, note.uuid, 1).unwrap();
    assert_eq!(first.change_summary.as_deref(), Some("initial version"));

    let latest = service.latest(owner, note.uuid).unwrap().unwrap();
    assert_eq!(latest.version_number, 2);

    let missing = service.version(owner, note.uuid, 99).unwrap_err();
    assert!(matches!(
        missing,
        VersionServiceError::VersionNotFound {
            version_number: 99,
            ..
        }
    ));

    let unknown_note = service.latest(owner, Uuid::new_v4()).unwrap_err();
    assert!(matches!(unknown_note, VersionServiceError::NoteNotFound(_)));
}

#[test]
fn restore_backs_up_current_state_then_overwrites() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(
        &mut conn,
        owner,
        "Draft",
        "v1",
        vec!["alpha".to_string()],
        vec![],
    );
    update_note(
        &mut conn,
        owner,
        note.uuid,
        NotePatch {
            content: Some("v2".to_string()),
            tags: Some(vec!["beta".to_string()]),
            ..NotePatch::default()
        },
    );

    let backup = {
        let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
        let mut service = VersionService::new(repo);
        service.restore(owner, note.uuid, 1).unwrap()
    };
    // The backup snapshot preserves the overwritten state and tops the log.
    assert_eq!(backup.version_number, 3);
    assert_eq!(backup.content.as_deref(), Some("v2"));
    assert_eq!(backup.tags, vec!["beta".to_string()]);
    assert_eq!(
        backup.change_summary.as_deref(),
        Some("restored to version 1")
    );

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let restored = NoteService::new(repo)
        .get_note(owner, note.uuid)
        .unwrap()
        .unwrap();
    assert_eq!(restored.content.as_deref(), Some("v1"));
    assert_eq!(restored.tags, vec!["alpha".to_string()]);
}

#[test]
fn restore_is_undoable_through_the_backup_snapshot() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(&mut conn, owner, "Draft", "v1", vec![], vec![]);
    update_note(
        &mut conn,
        owner,
        note.uuid,
        NotePatch {
            content: Some("v2".to_string()),
            ..NotePatch::default()
        },
    );

    {
        let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
        let mut service = VersionService::new(repo);
        let backup = service.restore(owner, note.uuid, 1).unwrap();
        // Undo the restore by restoring the backup itself.
        service
            .restore(owner, note.uuid, backup.version_number)
            .unwrap();
    }

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let current = NoteService::new(repo)
        .get_note(owner, note.uuid)
        .unwrap()
        .unwrap();
    assert_eq!(current.content.as_deref(), Some("v2"));
}

#[test]
fn restoring_the_same_version_twice_converges_on_the_same_state() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(&mut conn, owner, "Draft", "v1", vec![], vec![]);
    update_note(
        &mut conn,
        owner,
        note.uuid,
        NotePatch {
            content: Some("v2".to_string()),
            ..NotePatch::default()
        },
    );

    {
        let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
        let mut service = VersionService::new(repo);
        service.restore(owner, note.uuid, 1).unwrap();
        service.restore(owner, note.uuid, 1).unwrap();
    }

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let current = NoteService::new(repo)
        .get_note(owner, note.uuid)
        .unwrap()
        .unwrap();
    assert_eq!(current.content.as_deref(), Some("v1"));
}

#[test]
fn restore_skips_category_names_that_no_longer_exist() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(
        &mut conn,
        owner,
        "Draft",
        "v1",
        vec![],
        vec!["Temp".to_string()],
    );
    // Unlink the category so it becomes deletable, then remove it.
    update_note(
        &mut conn,
        owner,
        note.uuid,
        NotePatch {
            categories: Some(vec![]),
            ..NotePatch::default()
        },
    );
    {
        let repo = SqliteCategoryRepository::try_new(&mut conn).unwrap();
        let mut categories = CategoryService::new(repo);
        let temp = categories
            .list_categories(owner)
            .unwrap()
            .into_iter()
            .find(|category| category.name == "Temp")
            .unwrap();
        categories.delete_category(owner, temp.uuid).unwrap();
    }

    {
        let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
        VersionService::new(repo)
            .restore(owner, note.uuid, 1)
            .unwrap();
    }

    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let service = NoteService::new(repo);
        let current = service.get_note(owner, note.uuid).unwrap().unwrap();
        assert!(current.categories.is_empty());
    }

    // The snapshot itself still remembers the literal name.
    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let first = VersionService::new(repo).version(owner, note.uuid, 1).unwrap();
    assert_eq!(first.categories, vec!["Temp".to_string()]);
}

#[test]
fn history_is_viewable_for_trashed_notes_but_restore_is_not() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(&mut conn, owner, "Draft", "v1", vec![], vec![]);
    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        NoteService::new(repo).trash_note(owner, note.uuid).unwrap();
    }

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let mut service = VersionService::new(repo);
    assert_eq!(service.history(owner, note.uuid).unwrap().len(), 1);

    let err = service.restore(owner, note.uuid, 1).unwrap_err();
    assert!(matches!(err, VersionServiceError::NoteInTrash(_)));
}

#[test]
fn snapshot_names_are_stored_literally_and_survive_tag_reuse() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let note = create_note(
        &mut conn,
        owner,
        "Draft",
        "v1",
        vec!["Shared".to_string()],
        vec![],
    );
    // A second note reusing the tag must not disturb the first snapshot.
    create_note(
        &mut conn,
        owner,
        "Other",
        "x",
        vec!["Shared".to_string()],
        vec![],
    );

    let repo = SqliteVersionRepository::try_new(&mut conn).unwrap();
    let first = VersionService::new(repo).version(owner, note.uuid, 1).unwrap();
    assert_eq!(first.tags, vec!["Shared".to_string()]);
}
