use thunderfile::lock::{LockKind, LockRegistry};

use crate::helpers::temp_file;

#[test]
fn test_same_file_shares_one_record() {
    let (dir, path) = temp_file("shared.tf");
    let registry = LockRegistry::new();

    let first = registry.acquire(&path).unwrap();
    let second = registry
        .acquire(dir.path().join("sub").join("..").join("shared.tf"))
        .unwrap();

    assert!(first.shares_handle_with(&second));
    assert_eq!(first.path(), second.path());
    assert_ne!(first.holder(), second.holder());
    assert_eq!(registry.open_files(), 1);
    assert_eq!(registry.holder_count(&path), 2);
}

#[test]
fn test_different_files_are_independent() {
    let (dir, path) = temp_file("one.tf");
    let registry = LockRegistry::new();

    let one = registry.acquire(&path).unwrap();
    let two = registry.acquire(dir.path().join("two.tf")).unwrap();
    assert!(!one.shares_handle_with(&two));

    let _write_one = one.try_write().unwrap();
    let _write_two = two.try_write().unwrap();
    assert_eq!(registry.open_files(), 2);
}

#[test]
fn test_registries_do_not_coordinate() {
    let (_dir, path) = temp_file("isolated.tf");
    let a = LockRegistry::new().acquire(&path).unwrap();
    let b = LockRegistry::new().acquire(&path).unwrap();
    assert!(!a.shares_handle_with(&b));
}

#[test]
fn test_acquire_creates_missing_parents() {
    let (dir, _) = temp_file("unused");
    let path = dir.path().join("deep").join("er").join("conf.tf");
    let registry = LockRegistry::new();

    let access = registry.acquire(&path).unwrap();
    assert!(path.exists());
    assert!(access.is_empty().unwrap());
}

#[test]
fn test_locks_are_reentrant_per_holder() {
    let (_dir, path) = temp_file("reentrant.tf");
    let registry = LockRegistry::new();
    let access = registry.acquire(&path).unwrap();

    let write = access.write_lock();
    assert!(write.try_lock().unwrap());
    assert!(write.try_lock().unwrap());
    assert_eq!(write.hold_count(), 2);

    // A writer may also read.
    let read = access.read_lock();
    assert!(read.try_lock().unwrap());

    write.unlock().unwrap();
    assert!(write.is_held());
    write.unlock().unwrap();
    assert!(!write.is_held());
    read.unlock().unwrap();

    let err = write.unlock().unwrap_err();
    assert!(matches!(
        err,
        thunderfile::Error::Lock(ref lock) if lock.is_not_held()
    ));
}

#[test]
fn test_writer_excludes_other_holders() {
    let (_dir, path) = temp_file("exclusive.tf");
    let registry = LockRegistry::new();
    let first = registry.acquire(&path).unwrap();
    let second = registry.acquire(&path).unwrap();

    {
        let guard = first.try_write().unwrap();
        assert_eq!(guard.kind(), LockKind::Write);
        assert!(second.try_read().unwrap_err().is_contended());
        assert!(second.try_write().unwrap_err().is_contended());
    }

    // Readers share, but block a writer.
    let _read_one = first.try_read().unwrap();
    let _read_two = second.try_read().unwrap();
    assert!(!second.write_lock().try_lock().unwrap());
}

#[test]
fn test_drop_releases_holds_and_record() {
    let (_dir, path) = temp_file("release.tf");
    let registry = LockRegistry::new();
    let keeper = registry.acquire(&path).unwrap();

    {
        let leaver = registry.acquire(&path).unwrap();
        assert!(leaver.write_lock().try_lock().unwrap());
        assert!(!keeper.write_lock().try_lock().unwrap());
        assert_eq!(registry.holder_count(&path), 2);
    }

    assert_eq!(registry.holder_count(&path), 1);
    assert!(keeper.write_lock().try_lock().unwrap());
    keeper.unlock_all();

    drop(keeper);
    assert_eq!(registry.holder_count(&path), 0);
    assert_eq!(registry.open_files(), 0);
}

#[test]
fn test_closed_access_rejects_io() {
    let (_dir, path) = temp_file("closed.tf");
    let registry = LockRegistry::new();
    let mut access = registry.acquire(&path).unwrap();

    access.close();
    access.close();
    assert!(access.is_closed());
    assert!(access.read_all().is_err());
    assert!(access.read_lock().try_lock().is_err());
    assert_eq!(access.read_lock().hold_count(), 0);
}

#[test]
fn test_shared_handle_sees_writes() {
    let (_dir, path) = temp_file("io.tf");
    let registry = LockRegistry::new();
    let writer = registry.acquire(&path).unwrap();
    let reader = registry.acquire(&path).unwrap();

    {
        let _guard = writer.try_write().unwrap();
        writer.replace_all(b"a: 1\n").unwrap();
    }
    let _guard = reader.try_read().unwrap();
    assert_eq!(reader.read_all().unwrap(), b"a: 1\n");
    assert_eq!(reader.len().unwrap(), 5);
}
