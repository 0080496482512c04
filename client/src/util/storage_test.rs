use super::*;
use serde_json::json;

fn temp_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("storefront-storage-{}", uuid::Uuid::new_v4()))
        .join("session.json")
}

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_get_missing_is_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get(AUTH_TOKEN_KEY), None);
    assert!(!storage.contains(AUTH_TOKEN_KEY));
}

#[test]
fn memory_set_then_get() {
    let storage = MemoryStorage::new();
    storage.set(AUTH_TOKEN_KEY, "T").unwrap();
    assert_eq!(storage.get(AUTH_TOKEN_KEY).as_deref(), Some("T"));
    assert!(storage.contains(AUTH_TOKEN_KEY));
}

#[test]
fn memory_set_overwrites() {
    let storage = MemoryStorage::new();
    storage.set(USER_NAME_KEY, "A").unwrap();
    storage.set(USER_NAME_KEY, "B").unwrap();
    assert_eq!(storage.get(USER_NAME_KEY).as_deref(), Some("B"));
}

#[test]
fn memory_remove_missing_is_ok() {
    let storage = MemoryStorage::new();
    storage.remove(USER_ROLE_KEY).unwrap();
    assert!(storage.snapshot().is_empty());
}

#[test]
fn memory_with_entries_seeds_contents() {
    let storage = MemoryStorage::with_entries([(AUTH_TOKEN_KEY, "T"), (USER_ROLE_KEY, "2")]);
    assert_eq!(storage.snapshot().len(), 2);
    assert_eq!(storage.get(USER_ROLE_KEY).as_deref(), Some("2"));
}

#[test]
fn session_keys_cover_identity_but_not_selection() {
    assert!(SESSION_KEYS.contains(&AUTH_TOKEN_KEY));
    assert!(SESSION_KEYS.contains(&USER_NAME_KEY));
    assert!(SESSION_KEYS.contains(&USER_EMAIL_KEY));
    assert!(SESSION_KEYS.contains(&USER_ROLE_KEY));
    assert!(!SESSION_KEYS.contains(&SELECTED_POINT_KEY));
}

// =============================================================================
// load_json / save_json
// =============================================================================

#[test]
fn save_json_then_load_json() {
    let storage = MemoryStorage::new();
    let point = json!({ "id": 4, "address": "Main St 1", "coords": [55.7, 37.6] });
    save_json(&storage, SELECTED_POINT_KEY, &point).unwrap();

    let raw = storage.get(SELECTED_POINT_KEY).unwrap();
    assert_eq!(serde_json::from_str::<serde_json::Value>(&raw).unwrap(), point);
    assert_eq!(load_json::<serde_json::Value>(&storage, SELECTED_POINT_KEY), Some(point));
}

#[test]
fn load_json_invalid_is_none() {
    let storage = MemoryStorage::with_entries([(SELECTED_POINT_KEY, "{not json")]);
    assert_eq!(load_json::<serde_json::Value>(&storage, SELECTED_POINT_KEY), None);
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_missing_reads_empty() {
    let storage = FileStorage::new(temp_path());
    assert_eq!(storage.get(AUTH_TOKEN_KEY), None);
}

#[test]
fn file_persists_across_instances() {
    let path = temp_path();
    {
        let storage = FileStorage::new(&path);
        storage.set(AUTH_TOKEN_KEY, "T").unwrap();
        storage.set(USER_NAME_KEY, "A").unwrap();
    }

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get(AUTH_TOKEN_KEY).as_deref(), Some("T"));
    assert_eq!(reopened.get(USER_NAME_KEY).as_deref(), Some("A"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_remove_drops_only_that_key() {
    let path = temp_path();
    let storage = FileStorage::new(&path);
    storage.set(AUTH_TOKEN_KEY, "T").unwrap();
    storage.set(SELECTED_POINT_KEY, "1").unwrap();
    storage.remove(AUTH_TOKEN_KEY).unwrap();

    assert_eq!(storage.get(AUTH_TOKEN_KEY), None);
    assert_eq!(storage.get(SELECTED_POINT_KEY).as_deref(), Some("1"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_sees_writes_from_other_handle() {
    let path = temp_path();
    let a = FileStorage::new(&path);
    let b = FileStorage::new(&path);
    a.set(AUTH_TOKEN_KEY, "from-a").unwrap();
    assert_eq!(b.get(AUTH_TOKEN_KEY).as_deref(), Some("from-a"));
    b.set(AUTH_TOKEN_KEY, "from-b").unwrap();
    assert_eq!(a.get(AUTH_TOKEN_KEY).as_deref(), Some("from-b"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_corrupt_contents_read_as_missing_and_fail_writes() {
    let path = temp_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[1, 2").unwrap();

    let storage = FileStorage::new(&path);
    assert_eq!(storage.get(AUTH_TOKEN_KEY), None);
    assert!(matches!(storage.set(AUTH_TOKEN_KEY, "T"), Err(StorageError::Json(_))));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
