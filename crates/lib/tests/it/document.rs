use std::time::{Duration, SystemTime};

use thunderfile::provider::CapacityProvider;
use thunderfile::{
    CommentAware, CommentMode, ConfigDocument, Format, Gettable, LockRegistry, ReloadPolicy, Seed,
    Settable, Value,
};

use crate::helpers::{SCENARIO, open_doc, temp_file, touch_future, write_externally};

#[test]
fn test_open_creates_empty_file() {
    let (dir, _) = temp_file("unused");
    let path = dir.path().join("nested").join("app.tf");
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    assert!(path.exists());
    assert!(doc.keys().is_empty());
    assert!(doc.last_loaded().is_some());
    assert_eq!(doc.format(), Format::Thunder);
    assert_eq!(doc.canonical_path(), path.canonicalize().unwrap());
}

#[test]
fn test_edit_keeps_comments_and_layout() {
    let (_dir, path) = temp_file("app.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    assert_eq!(doc.get_as::<String>("name").unwrap(), "alice");
    assert!(doc.set("server.port", 9090).unwrap());

    let expected = SCENARIO.replace("8080", "9090");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);
    assert_eq!(
        doc.comments(),
        vec!["# top header", "# nested config", "# tls block"]
    );
}

#[test]
fn test_always_sees_external_writes() {
    let (_dir, path) = temp_file("always.tf");
    let mut doc = open_doc(&path, ReloadPolicy::Always);

    std::fs::write(&path, "a: 1\n").unwrap();
    assert_eq!(doc.get("a"), Some(&Value::Int(1)));

    std::fs::write(&path, "a: 2\n").unwrap();
    assert_eq!(doc.get("a"), Some(&Value::Int(2)));
}

#[test]
fn test_on_change_follows_modification_time() {
    let (_dir, path) = temp_file("on_change.tf");
    std::fs::write(&path, "a: 1\n").unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);
    assert!(!doc.has_changed());

    // An older timestamp than the last load is not a change.
    std::fs::write(&path, "a: 2\n").unwrap();
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(3600))
        .unwrap();
    assert_eq!(doc.get("a"), Some(&Value::Int(1)));

    touch_future(&path);
    assert!(doc.has_changed());
    assert_eq!(doc.get("a"), Some(&Value::Int(2)));
}

#[test]
fn test_manual_reloads_on_request() {
    let (_dir, path) = temp_file("manual.tf");
    std::fs::write(&path, "a: 1\n").unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::Manual);

    write_externally(&path, "a: 2\n");
    assert!(doc.has_changed());
    assert_eq!(doc.get("a"), Some(&Value::Int(1)));

    doc.reload().unwrap();
    assert_eq!(doc.get("a"), Some(&Value::Int(2)));
}

#[test]
fn test_failed_reload_keeps_previous_content() {
    let (_dir, path) = temp_file("broken.tf");
    std::fs::write(&path, "a: 1\n").unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::Always);

    std::fs::write(&path, "a: 2\nb {\n").unwrap();
    assert_eq!(doc.get("a"), Some(&Value::Int(1)));
    assert!(!doc.contains("b"));

    let err = doc.reload().unwrap_err();
    assert!(err.is_parse_error());
    match err {
        thunderfile::Error::Parse(parse) => assert_eq!(parse.line(), 2),
        other => panic!("expected a parse error, got {other:?}"),
    }

    std::fs::write(&path, "a: 3\n").unwrap();
    assert_eq!(doc.get("a"), Some(&Value::Int(3)));
}

#[test]
fn test_open_fails_on_unparsable_file() {
    let (_dir, path) = temp_file("bad.tf");
    std::fs::write(&path, "}\n").unwrap();
    let err = ConfigDocument::builder(&path)
        .registry(LockRegistry::new())
        .open()
        .unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(err.module(), "codec");
}

#[test]
fn test_seed_fills_empty_file_only() {
    let (dir, path) = temp_file("seeded.tf");
    let mut doc = ConfigDocument::builder(&path)
        .registry(LockRegistry::new())
        .seed("name: \"demo\"\n")
        .open()
        .unwrap();
    assert_eq!(doc.get_as::<String>("name").unwrap(), "demo");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "name: \"demo\"\n");
    drop(doc);

    let other = dir.path().join("kept.tf");
    std::fs::write(&other, "name: \"kept\"\n").unwrap();
    let mut doc = ConfigDocument::builder(&other)
        .registry(LockRegistry::new())
        .seed("name: \"demo\"\n")
        .open()
        .unwrap();
    assert_eq!(doc.get_as::<String>("name").unwrap(), "kept");
}

#[test]
fn test_seed_sources() {
    let (dir, path) = temp_file("from_file.tf");
    let template = dir.path().join("template.tf");
    std::fs::write(&template, SCENARIO).unwrap();

    let mut doc = ConfigDocument::builder(&path)
        .registry(LockRegistry::new())
        .seed(Seed::file(&template))
        .open()
        .unwrap();
    assert_eq!(doc.get_as::<i64>("server.port").unwrap(), 8080);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SCENARIO);

    let mut doc = ConfigDocument::builder(dir.path().join("from_reader.tf"))
        .registry(LockRegistry::new())
        .seed(Seed::reader(std::io::Cursor::new(b"x: true\n".to_vec())))
        .open()
        .unwrap();
    assert!(doc.get_as::<bool>("x").unwrap());
}

#[test]
fn test_invalid_seed_is_not_written() {
    let (_dir, path) = temp_file("invalid_seed.tf");
    let err = ConfigDocument::builder(&path)
        .registry(LockRegistry::new())
        .seed("a {\n")
        .open()
        .unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_autosave_can_be_disabled() {
    let (_dir, path) = temp_file("deferred.tf");
    let mut doc = ConfigDocument::builder(&path)
        .registry(LockRegistry::new())
        .reload_policy(ReloadPolicy::Manual)
        .autosave(false)
        .open()
        .unwrap();
    assert!(!doc.autosave());

    doc.set("a", 1).unwrap();
    doc.set("b.c", "text").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

    doc.save().unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "a: 1\nb {\n  c: \"text\"\n}\n"
    );

    doc.set_autosave(true);
    doc.remove("a").unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "b {\n  c: \"text\"\n}\n"
    );
}

#[test]
fn test_bulk_changes() {
    let (_dir, path) = temp_file("bulk.tf");
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    assert!(
        doc.set_all([("a", Value::Int(1)), ("b.c", Value::Bool(false))])
            .unwrap()
    );
    assert!(!doc.set_all([("a", Value::Int(1))]).unwrap());
    assert_eq!(
        doc.get_all(["a", "b.c", "missing"]),
        vec![Some(Value::Int(1)), Some(Value::Bool(false)), None]
    );

    assert!(doc.remove_all(["a", "missing"]).unwrap());
    assert!(!doc.remove_all(["missing"]).unwrap());
    assert_eq!(doc.keys(), vec!["b"]);
    assert_eq!(doc.block_keys(), vec!["b"]);
}

#[test]
fn test_typed_reads() {
    let (_dir, path) = temp_file("typed.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    assert!(doc.get_as::<bool>("server.tls.enabled").unwrap());
    assert_eq!(doc.get_or("server.host", "localhost".to_string()), "localhost");
    assert_eq!(doc.get_or("server.port", 0_i64), 8080);

    let err = doc.get_as::<i64>("server.missing").unwrap_err();
    assert!(err.is_not_found());
    let err = doc.get_as::<bool>("server.port").unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_invalid_writes_change_nothing() {
    let (_dir, path) = temp_file("invalid.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    assert!(doc.set("name.first", "a").unwrap_err().is_precondition_error());
    assert!(doc.set("bad:key", 1).unwrap_err().is_precondition_error());
    assert!(doc.set("", 1).unwrap_err().is_precondition_error());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SCENARIO);
}

#[test]
fn test_set_data_from_replaces_content() {
    let (_dir, path) = temp_file("replace.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    doc.set_data_from("# fresh\nonly: 1\n").unwrap();
    assert_eq!(doc.keys(), vec!["only"]);
    assert_eq!(doc.header(), vec!["# fresh"]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# fresh\nonly: 1\n");

    let err = doc.set_data_from("only: {\n").unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(doc.keys(), vec!["only"]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# fresh\nonly: 1\n");
}

#[test]
fn test_clear_empties_file_and_cache() {
    let (_dir, path) = temp_file("clear.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    doc.clear().unwrap();
    assert!(doc.keys().is_empty());
    assert!(doc.comments().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_delete_file() {
    let (_dir, path) = temp_file("delete.tf");
    let registry = LockRegistry::new();
    let mut doc = ConfigDocument::builder(&path)
        .registry(registry.clone())
        .open()
        .unwrap();
    doc.set("a", 1).unwrap();
    assert_eq!(registry.holder_count(&path), 1);

    doc.delete_file().unwrap();
    assert!(!path.exists());
    assert_eq!(registry.open_files(), 0);
}

#[test]
fn test_documents_on_one_file_share_writes() {
    let (_dir, path) = temp_file("shared.tf");
    let registry = LockRegistry::new();
    let open = |policy| {
        ConfigDocument::builder(&path)
            .registry(registry.clone())
            .reload_policy(policy)
            .open()
            .unwrap()
    };
    let mut writer = open(ReloadPolicy::Manual);
    let mut reader = open(ReloadPolicy::Always);
    assert_eq!(registry.holder_count(&path), 2);

    writer.set("greeting", "hello").unwrap();
    assert_eq!(reader.get_as::<String>("greeting").unwrap(), "hello");

    reader.set("greeting", "bye").unwrap();
    assert_eq!(writer.get_as::<String>("greeting").unwrap(), "hello");
    writer.reload().unwrap();
    assert_eq!(writer.get_as::<String>("greeting").unwrap(), "bye");
}

#[test]
fn test_skip_mode_document_drops_comments_on_save() {
    let (_dir, path) = temp_file("skip.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = ConfigDocument::builder(&path)
        .registry(LockRegistry::new())
        .comment_mode(CommentMode::Skip)
        .open()
        .unwrap();

    assert!(doc.comments().is_empty());
    doc.save().unwrap();
    assert!(!std::fs::read_to_string(&path).unwrap().contains('#'));
    assert_eq!(doc.get_as::<i64>("server.port").unwrap(), 8080);
}

#[test]
fn test_json_document() {
    let (_dir, path) = temp_file("app.json");
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);
    assert_eq!(doc.format(), Format::Json);

    doc.set("name", "demo").unwrap();
    doc.set("limits.max", 10).unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{\n  \"name\": \"demo\",\n  \"limits\": {\n    \"max\": 10\n  }\n}\n"
    );

    write_externally(&path, r#"{"name": "other"}"#);
    assert_eq!(doc.get_as::<String>("name").unwrap(), "other");
}

#[test]
fn test_custom_provider() {
    let (_dir, path) = temp_file("provider.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = ConfigDocument::builder(&path)
        .registry(LockRegistry::new())
        .provider(CapacityProvider::new(8, 4))
        .open()
        .unwrap();
    assert_eq!(doc.keys(), vec!["name", "server"]);
}

#[test]
fn test_write_after_broken_external_edit_fails() {
    let (_dir, path) = temp_file("broken_write.tf");
    std::fs::write(&path, "a: 1\n").unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    let external = "a: 1\nb: 2\nserver {\n  port: 9\n";
    write_externally(&path, external);

    let err = doc.set("c", 3).unwrap_err();
    assert!(err.is_parse_error());
    assert!(doc.remove("a").unwrap_err().is_parse_error());
    assert!(
        doc.set_comment("a", vec!["# note".to_string()])
            .unwrap_err()
            .is_parse_error()
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), external);

    // Reads still serve the last good content.
    assert_eq!(doc.get("a"), Some(&Value::Int(1)));
    assert!(!doc.contains("c"));
}

#[test]
fn test_write_after_external_edit_keeps_it() {
    let (_dir, path) = temp_file("external_write.tf");
    std::fs::write(&path, "a: 1\n").unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    write_externally(&path, "a: 1\nb: 2\n");
    doc.set("c", 3).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 1\nb: 2\nc: 3\n");
}

#[test]
fn test_contended_save_leaves_file_alone() {
    let (_dir, path) = temp_file("contended.tf");
    std::fs::write(&path, "a: 1\n").unwrap();
    let registry = LockRegistry::new();
    let mut doc = ConfigDocument::builder(&path)
        .registry(registry.clone())
        .reload_policy(ReloadPolicy::Manual)
        .open()
        .unwrap();

    let other = registry.acquire(&path).unwrap();
    let guard = other.try_write().unwrap();
    let err = doc.set("b", 2).unwrap_err();
    assert!(err.is_contended());
    assert!(err.is_io_error());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 1\n");

    // The change stays in memory and goes out with the next save.
    drop(guard);
    doc.save().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 1\nb: 2\n");
}

#[test]
fn test_multi_line_comments_survive_reopen() {
    let (_dir, path) = temp_file("multi_line.tf");
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);
    doc.set("a", 1).unwrap();
    doc.set_comment("a", vec!["first\nsecond".to_string()])
        .unwrap();
    doc.set_header(vec!["top\r\n# below".to_string()]).unwrap();
    drop(doc);

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# top\n# below\n# first\n# second\na: 1\n"
    );

    let mut reopened = open_doc(&path, ReloadPolicy::OnChange);
    assert_eq!(reopened.get("a"), Some(&Value::Int(1)));
    assert_eq!(
        reopened.comments(),
        vec!["# top", "# below", "# first", "# second"]
    );
}
