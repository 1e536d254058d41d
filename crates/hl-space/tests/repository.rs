mod common;

use common::{Fixture, RecordingOpener};
use hl_space::{
    meta, CreateSpace, LayoutPreferences, SpaceError, SpacePreferences, UpdateSpace,
    TEMP_SPACE_ID,
};
use std::sync::Arc;
use std::time::Duration;

fn create(name: &str) -> CreateSpace {
    CreateSpace {
        name: name.to_string(),
        icon: "rocket".to_string(),
        custom_path: None,
    }
}

fn layout(rail: Option<bool>, width: Option<u32>) -> SpacePreferences {
    SpacePreferences {
        layout: Some(LayoutPreferences {
            artifact_rail_expanded: rail,
            chat_width: width,
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[test]
fn create_then_get_roundtrip() {
    let fx = Fixture::new();
    let repo = fx.repository();

    let created = repo.create_space(create("Demo")).unwrap();
    let fetched = repo.get_space(&created.id).unwrap();

    assert_eq!(fetched.name, "Demo");
    assert_eq!(fetched.icon, "rocket");
    assert_eq!(fetched.path, fx.paths.spaces_dir().join("Demo"));
    assert!(!fetched.is_temp);
    assert!(fetched.preferences.is_none());
    assert!(meta::conversations_dir(&fetched.path).is_dir());
    assert!(meta::meta_path(&fetched.path).is_file());
    assert_eq!(fx.indexed_ids(), vec![created.id]);
}

#[test]
fn get_unknown_space_is_not_found() {
    let fx = Fixture::new();
    let repo = fx.repository();
    assert!(matches!(
        repo.get_space("nope"),
        Err(SpaceError::NotFound(id)) if id == "nope"
    ));
}

#[test]
fn list_is_sorted_newest_first_and_uncached() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let older = repo.create_space(create("Older")).unwrap();
    std::thread::sleep(Duration::from_millis(10));
    let newer = repo.create_space(create("Newer")).unwrap();

    let names: Vec<String> = repo.list_spaces().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["Newer", "Older"]);

    std::thread::sleep(Duration::from_millis(10));
    repo.update_space(
        &older.id,
        UpdateSpace {
            name: Some("Older renamed".into()),
            icon: None,
        },
    )
    .unwrap();
    let ids: Vec<String> = repo.list_spaces().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![older.id, newer.id]);

    let before = repo.stats();
    repo.list_spaces();
    assert_eq!(repo.stats().meta_reads, before.meta_reads + 2);
    assert_eq!(repo.stats().cache_hits, before.cache_hits);
}

#[test]
fn out_of_band_deletion_is_pruned_on_next_list() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let kept = repo.create_space(create("Kept")).unwrap();
    let doomed = repo.create_space(create("Doomed")).unwrap();

    std::fs::remove_dir_all(&doomed.path).unwrap();

    let listed: Vec<String> = repo.list_spaces().into_iter().map(|s| s.id).collect();
    assert_eq!(listed, vec![kept.id.clone()]);
    assert_eq!(fx.indexed_ids(), vec![kept.id]);
    assert_eq!(repo.stats().pruned, 1);
}

#[test]
fn corrupt_meta_is_reported_and_pruned() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let space = repo.create_space(create("Broken")).unwrap();
    std::fs::write(meta::meta_path(&space.path), "{ truncated").unwrap();

    assert!(matches!(
        repo.get_space(&space.id),
        Err(SpaceError::Corrupt { .. })
    ));
    assert!(fx.indexed_ids().is_empty());
    assert!(matches!(
        repo.get_space(&space.id),
        Err(SpaceError::NotFound(_))
    ));
}

#[test]
fn deleting_custom_path_space_keeps_user_files() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let folder = fx.outside("my-project");
    std::fs::write(folder.join("notes.txt"), "keep me").unwrap();

    let space = repo
        .create_space(CreateSpace {
            name: "Adopted".into(),
            icon: "folder".into(),
            custom_path: Some(folder.clone()),
        })
        .unwrap();
    assert_eq!(space.path, folder);

    repo.delete_space(&space.id).unwrap();

    assert!(folder.join("notes.txt").is_file());
    assert!(!meta::control_dir(&folder).exists());
    assert!(fx.indexed_ids().is_empty());
}

#[test]
fn deleting_default_space_removes_directory() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let space = repo.create_space(create("Scratch")).unwrap();
    std::fs::write(space.path.join("draft.md"), "x").unwrap();

    repo.delete_space(&space.id).unwrap();

    assert!(!space.path.exists());
    assert!(matches!(
        repo.get_space(&space.id),
        Err(SpaceError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete_space(&space.id),
        Err(SpaceError::NotFound(_))
    ));
}

#[test]
fn pruned_space_is_evicted_from_cache() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let space = repo.create_space(create("Gone")).unwrap();
    repo.get_space(&space.id).unwrap();

    std::fs::remove_dir_all(&space.path).unwrap();

    assert!(repo.list_spaces().is_empty());
    assert!(fx.indexed_ids().is_empty());
    assert!(matches!(
        repo.get_space(&space.id),
        Err(SpaceError::NotFound(_))
    ));
}

#[test]
fn delete_of_vanished_space_evicts_cache() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let space = repo.create_space(create("Vanished")).unwrap();
    repo.get_space(&space.id).unwrap();

    std::fs::remove_dir_all(&space.path).unwrap();

    assert!(matches!(
        repo.delete_space(&space.id),
        Err(SpaceError::NotFound(_))
    ));
    assert!(matches!(
        repo.get_space(&space.id),
        Err(SpaceError::NotFound(_))
    ));
    assert_eq!(repo.stats().pruned, 1);
}

#[cfg(unix)]
#[test]
fn failed_delete_leaves_index_and_cache() {
    use std::os::unix::fs::PermissionsExt;

    if unsafe { libc::geteuid() } == 0 {
        eprintln!("Skipping test: running as root; permission checks bypassed");
        return;
    }
    let fx = Fixture::new();
    let repo = fx.repository();
    let folder = fx.outside("locked");
    let space = repo
        .create_space(CreateSpace {
            name: "Locked".into(),
            icon: "lock".into(),
            custom_path: Some(folder.clone()),
        })
        .unwrap();
    repo.get_space(&space.id).unwrap();

    let control = meta::control_dir(&folder);
    std::fs::set_permissions(&control, std::fs::Permissions::from_mode(0o555)).unwrap();
    let result = repo.delete_space(&space.id);
    std::fs::set_permissions(&control, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(SpaceError::PermissionDenied(_))));
    assert_eq!(fx.indexed_ids(), vec![space.id.clone()]);
    let hits = repo.stats().cache_hits;
    assert_eq!(repo.get_space(&space.id).unwrap().name, "Locked");
    assert_eq!(repo.stats().cache_hits, hits + 1);

    repo.delete_space(&space.id).unwrap();
    assert!(!control.exists());
    assert!(folder.exists());
}

#[test]
fn cache_holds_ten_most_recent_spaces() {
    let fx = Fixture::new();
    let repo = fx.repository_with_capacity(10);
    let ids: Vec<String> = (0..11)
        .map(|i| repo.create_space(create(&format!("S{i}"))).unwrap().id)
        .collect();

    for id in &ids {
        repo.get_space(id).unwrap();
    }
    let after_first_pass = repo.stats();
    assert_eq!(after_first_pass.meta_reads, 11);

    for id in &ids[1..] {
        repo.get_space(id).unwrap();
    }
    let after_recent = repo.stats();
    assert_eq!(after_recent.meta_reads, 11);
    assert_eq!(after_recent.cache_hits, 10);

    repo.get_space(&ids[0]).unwrap();
    assert_eq!(repo.stats().meta_reads, 12);
}

#[test]
fn update_overwrites_cached_copy() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let space = repo.create_space(create("Before")).unwrap();
    repo.get_space(&space.id).unwrap();

    let updated = repo
        .update_space(
            &space.id,
            UpdateSpace {
                name: Some("After".into()),
                icon: Some("star".into()),
            },
        )
        .unwrap();
    assert!(updated.updated_at >= space.updated_at);

    let reads = repo.stats().meta_reads;
    let fetched = repo.get_space(&space.id).unwrap();
    assert_eq!(fetched.name, "After");
    assert_eq!(fetched.icon, "star");
    assert_eq!(repo.stats().meta_reads, reads);
}

#[test]
fn update_rejects_blank_name() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let space = repo.create_space(create("Named")).unwrap();
    assert!(matches!(
        repo.update_space(
            &space.id,
            UpdateSpace {
                name: Some("  ".into()),
                icon: None
            }
        ),
        Err(SpaceError::InvalidName(_))
    ));
}

#[test]
fn preferences_merge_at_layout_key() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let space = repo.create_space(create("Prefs")).unwrap();

    repo.update_space_preferences(&space.id, layout(Some(true), Some(300)))
        .unwrap();
    let updated = repo
        .update_space_preferences(&space.id, layout(None, Some(500)))
        .unwrap();

    assert_eq!(updated.preferences, Some(layout(Some(true), Some(500))));
    assert_eq!(
        repo.get_space_preferences(&space.id).unwrap(),
        layout(Some(true), Some(500))
    );

    // A fresh repository reads the same thing back from meta.json.
    let reopened = fx.repository();
    assert_eq!(
        reopened.get_space_preferences(&space.id).unwrap(),
        layout(Some(true), Some(500))
    );
}

#[test]
fn temp_space_guards() {
    let fx = Fixture::new();
    let repo = fx.repository();

    assert!(matches!(
        repo.delete_space(TEMP_SPACE_ID),
        Err(SpaceError::TempSpace)
    ));
    assert!(matches!(
        repo.update_space(
            TEMP_SPACE_ID,
            UpdateSpace {
                name: Some("x".into()),
                icon: None
            }
        ),
        Err(SpaceError::TempSpace)
    ));

    let temp = repo
        .update_space_preferences(TEMP_SPACE_ID, layout(Some(false), None))
        .unwrap();
    assert!(temp.is_temp);
    assert_eq!(temp.preferences, Some(layout(Some(false), None)));
    assert!(meta::meta_path(&fx.paths.temp_space_dir()).is_file());
}

#[test]
fn temp_space_is_always_available_with_stable_timestamps() {
    let fx = Fixture::new();
    let repo = fx.repository();

    let first = repo.get_space(TEMP_SPACE_ID).unwrap();
    assert!(first.is_temp);
    assert_eq!(first.path, fx.paths.temp_space_dir());
    assert!(first.preferences.is_none());

    repo.update_space_preferences(TEMP_SPACE_ID, layout(None, Some(640)))
        .unwrap();
    let second = repo.get_space(TEMP_SPACE_ID).unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.updated_at, first.updated_at);
    assert_eq!(second.preferences, Some(layout(None, Some(640))));
    assert_eq!(repo.stats().cache_misses, 0);
}

#[test]
fn all_space_paths_track_creation_and_deletion() {
    let fx = Fixture::new();
    let repo = fx.repository();

    let initial = repo.get_all_space_paths();
    assert_eq!(initial, vec![fx.paths.temp_space_dir()]);

    let demo = repo
        .create_space(CreateSpace {
            name: "Demo".into(),
            icon: "rocket".into(),
            custom_path: None,
        })
        .unwrap();
    assert!(repo.get_all_space_paths().contains(&demo.path));

    repo.delete_space(&demo.id).unwrap();
    let after = repo.get_all_space_paths();
    assert!(!after.contains(&demo.path));
    assert_eq!(after[0], fx.paths.temp_space_dir());
}

#[test]
fn same_name_twice_is_not_deduplicated() {
    let fx = Fixture::new();
    let repo = fx.repository();
    let a = repo.create_space(create("Twin")).unwrap();
    let b = repo.create_space(create("Twin")).unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(a.path, b.path);
    assert_eq!(fx.indexed_ids().len(), 2);
}

#[test]
fn create_validates_name_and_custom_path() {
    let fx = Fixture::new();
    let repo = fx.repository();
    repo.initialize();

    assert!(matches!(
        repo.create_space(create("")),
        Err(SpaceError::InvalidName(_))
    ));
    assert!(matches!(
        repo.create_space(create("../escape")),
        Err(SpaceError::InvalidName(_))
    ));
    assert!(matches!(
        repo.create_space(CreateSpace {
            name: "Rel".into(),
            icon: "folder".into(),
            custom_path: Some("relative/dir".into()),
        }),
        Err(SpaceError::InvalidPath(_))
    ));
    assert!(fx.indexed_ids().is_empty());
}

#[test]
fn open_space_folder_uses_opener() {
    let fx = Fixture::new();
    let opener = RecordingOpener::default();
    let repo = fx.repository().with_opener(opener.clone());
    let space = repo.create_space(create("Openable")).unwrap();

    repo.open_space_folder(&space.id).unwrap();

    assert!(matches!(
        repo.open_space_folder(TEMP_SPACE_ID),
        Err(SpaceError::Missing(_))
    ));
    let artifacts = fx.paths.temp_space_dir().join("artifacts");
    std::fs::create_dir_all(&artifacts).unwrap();
    repo.open_space_folder(TEMP_SPACE_ID).unwrap();

    let opened = opener.opened.lock().unwrap().clone();
    assert_eq!(opened, vec![space.path, artifacts]);
    assert!(matches!(
        repo.open_space_folder("missing"),
        Err(SpaceError::NotFound(_))
    ));
}

#[test]
fn close_flushes_and_reloads() {
    let fx = Fixture::new();
    let repo = fx.repository();
    repo.initialize();
    let space = repo.create_space(create("Durable")).unwrap();

    repo.close();
    assert_eq!(repo.get_space(&space.id).unwrap().name, "Durable");
}

#[test]
fn unwritable_index_keeps_spaces_in_memory_until_close() {
    let fx = Fixture::new();
    let index_path = fx.paths.index_path();
    std::fs::create_dir_all(&index_path).unwrap();
    let repo = fx.repository();

    let space = repo.create_space(create("Pending")).unwrap();
    assert_eq!(repo.get_space(&space.id).unwrap().name, "Pending");
    assert_eq!(repo.list_spaces().len(), 1);

    std::fs::remove_dir(&index_path).unwrap();
    repo.close();
    assert_eq!(fx.indexed_ids(), vec![space.id]);
}

#[test]
fn repository_is_shareable_across_threads() {
    let fx = Fixture::new();
    let repo = Arc::new(fx.repository());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let repo = Arc::clone(&repo);
            std::thread::spawn(move || repo.create_space(create(&format!("T{i}"))).unwrap().id)
        })
        .collect();
    let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();

    let mut indexed = fx.indexed_ids();
    indexed.sort();
    assert_eq!(indexed, ids);
    assert_eq!(repo.list_spaces().len(), 4);
}
