use thunderfile::{CommentAware, Gettable, ReloadPolicy, SectionNavigable, Settable, Value};

use crate::helpers::{SCENARIO, open_doc, temp_file};

#[test]
fn test_section_reads_relative_keys() {
    let (_dir, path) = temp_file("section.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    let mut server = doc.section("server");
    assert!(server.exists());
    assert_eq!(server.path().as_str(), "server");
    assert_eq!(server.keys(), vec!["port", "tls"]);
    assert_eq!(server.get_as::<i64>("port").unwrap(), 8080);
    assert_eq!(server.get("tls.enabled"), Some(&Value::Bool(true)));

    let mut tls = server.section("tls");
    assert_eq!(tls.path().as_str(), "server.tls");
    assert!(tls.get_as::<bool>("enabled").unwrap());
}

#[test]
fn test_section_writes_go_to_document() {
    let (_dir, path) = temp_file("section_write.tf");
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    {
        let mut db = doc.section("database");
        assert!(!db.exists());
        assert!(db.keys().is_empty());
        assert!(db.set("host", "localhost").unwrap());
        assert!(db.set_all([("port", 5432), ("pool", 4)]).unwrap());
        assert!(db.exists());
        assert!(db.remove("pool").unwrap());
    }

    assert_eq!(doc.get_as::<i64>("database.port").unwrap(), 5432);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "database {\n  host: \"localhost\"\n  port: 5432\n}\n"
    );
}

#[test]
fn test_into_section_narrows() {
    let (_dir, path) = temp_file("narrow.tf");
    let mut doc = open_doc(&path, ReloadPolicy::Manual);

    let mut deep = doc.section("a").into_section("b.c");
    assert_eq!(deep.path().as_str(), "a.b.c");
    deep.set("leaf", 1).unwrap();
    assert_eq!(doc.get("a.b.c.leaf"), Some(&Value::Int(1)));
}

#[test]
fn test_section_over_scalar_does_not_exist() {
    let (_dir, path) = temp_file("scalar.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    let mut name = doc.section("name");
    assert!(!name.exists());
    assert!(name.get("anything").is_none());
    assert!(name.set("child", 1).unwrap_err().is_precondition_error());
    assert!(name.header().is_empty());
}

#[test]
fn test_section_comments() {
    let (_dir, path) = temp_file("comments.tf");
    std::fs::write(&path, SCENARIO).unwrap();
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);

    {
        let mut server = doc.section("server");
        assert_eq!(server.comment("tls"), Some(vec!["# tls block".to_string()]));
        assert!(server.header().is_empty());

        server
            .set_comment("port", vec!["listening port".to_string()])
            .unwrap();
        server
            .set_footer(vec!["# end of server".to_string()])
            .unwrap();
    }

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# top header
name: \"alice\"
# nested config
server {
  # listening port
  port: 8080
  # tls block
  tls {
    enabled: true
  }
  # end of server
}
"
    );
    assert_eq!(doc.comment("server.port"), Some(vec!["# listening port".to_string()]));
}

#[test]
fn test_section_header_lands_before_first_entry() {
    let (_dir, path) = temp_file("header.tf");
    let mut doc = open_doc(&path, ReloadPolicy::OnChange);
    doc.set("block.key", "v").unwrap();

    let mut block = doc.section("block");
    block.set_header(vec!["# about block".to_string()]).unwrap();
    assert_eq!(block.header(), vec!["# about block"]);
    assert!(block.comment("missing").is_none());
    assert!(block.set_comment("missing", vec!["# x".to_string()]).is_err());

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "block {\n  # about block\n  key: \"v\"\n}\n"
    );
}
