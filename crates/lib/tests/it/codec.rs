use thunderfile::codec::json::Json;
use thunderfile::codec::thunder::Thunder;
use thunderfile::codec::{Codec, CommentMode, Format, ParseErrorKind};
use thunderfile::map::{AttributeMap, Value};

use crate::helpers::SCENARIO;

fn parse_error(format: Format, text: &str) -> thunderfile::codec::ParseError {
    match format.decode(text, CommentMode::Preserve) {
        Err(thunderfile::Error::Parse(err)) => err,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_scenario_decodes_with_comments() {
    let map = Thunder.decode(SCENARIO, CommentMode::Preserve).unwrap();

    assert_eq!(
        map.to_string(),
        "{name: \"alice\", server: {port: 8080, tls: {enabled: true}}}"
    );
    assert_eq!(map.header(), &["# top header".to_string()]);
    assert_eq!(map.comment("server").unwrap(), &["# nested config".to_string()]);

    let server = map.get("server").and_then(Value::as_map).unwrap();
    assert_eq!(server.comment("tls").unwrap(), &["# tls block".to_string()]);
    assert_eq!(
        map.all_comments(),
        vec!["# top header", "# nested config", "# tls block"]
    );
}

#[test]
fn test_scenario_round_trips_byte_exact() {
    let map = Thunder.decode(SCENARIO, CommentMode::Preserve).unwrap();
    assert_eq!(Thunder.encode(&map).unwrap(), SCENARIO);
}

#[test]
fn test_skip_mode_keeps_data() {
    let preserved = Thunder.decode(SCENARIO, CommentMode::Preserve).unwrap();
    let skipped = Thunder.decode(SCENARIO, CommentMode::Skip).unwrap();

    assert_eq!(preserved, skipped);
    assert!(skipped.all_comments().is_empty());

    let encoded = Thunder.encode(&skipped).unwrap();
    assert!(!encoded.contains('#'));
    assert_eq!(Thunder.decode(&encoded, CommentMode::Skip).unwrap(), skipped);
}

#[test]
fn test_order_survives_round_trip() {
    let text = "zeta: 1\nalpha: 2\nmid {\n  y: 1\n  b: 2\n}\nbeta: 3\n";
    let map = Thunder.decode(text, CommentMode::Preserve).unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid", "beta"]);
    assert_eq!(Thunder.encode(&map).unwrap(), text);
}

#[test]
fn test_scalar_types() {
    let text = "text: \"a \\\"quoted\\\" word\"\nyes: true\nno: false\nint: -42\nfloat: 2.5\n";
    let map = Thunder.decode(text, CommentMode::Preserve).unwrap();
    assert_eq!(map.get("text").unwrap(), &Value::from("a \"quoted\" word"));
    assert_eq!(map.get("yes").unwrap(), &Value::Bool(true));
    assert_eq!(map.get("no").unwrap(), &Value::Bool(false));
    assert_eq!(map.get("int").unwrap(), &Value::Int(-42));
    assert_eq!(map.get("float").unwrap(), &Value::Float(2.5));
    assert_eq!(Thunder.encode(&map).unwrap(), text);
}

#[test]
fn test_empty_input() {
    let map = Thunder.decode("", CommentMode::Preserve).unwrap();
    assert!(map.is_empty());
    assert_eq!(Thunder.encode(&AttributeMap::new()).unwrap(), "");
}

#[test]
fn test_comment_only_input_is_footer() {
    let map = Thunder
        .decode("# nothing here\n", CommentMode::Preserve)
        .unwrap();
    assert!(map.is_empty());
    assert_eq!(map.all_comments(), vec!["# nothing here"]);
}

#[test]
fn test_unbalanced_braces_report_lines() {
    let err = parse_error(Format::Thunder, "a: 1\nb {\n  c: 2\n");
    assert_eq!(err.line(), 2);
    assert!(matches!(err.kind(), ParseErrorKind::UnterminatedBlock { key } if key == "b"));

    let err = parse_error(Format::Thunder, "a: 1\n}\n");
    assert_eq!(err.line(), 2);
    assert_eq!(err.kind(), &ParseErrorKind::UnexpectedClose);
}

#[test]
fn test_bad_entry_reports_position() {
    let err = parse_error(Format::Thunder, "a: 1\n  just words\n");
    assert_eq!((err.line(), err.column()), (2, 3));
    assert!(matches!(err.kind(), ParseErrorKind::MissingSeparator { .. }));
    assert!(err.to_string().contains('2'));
}

#[test]
fn test_bad_literal() {
    let err = parse_error(Format::Thunder, "a: 1\nb: maybe\n");
    assert_eq!(err.line(), 2);
    assert!(matches!(err.kind(), ParseErrorKind::InvalidLiteral { .. }));
}

#[test]
fn test_encode_rejects_invalid_keys() {
    let mut map = AttributeMap::new();
    map.add("bad key: yes", 1);
    let err = Thunder.encode(&map).unwrap_err();
    assert!(err.is_precondition_error());
}

#[test]
fn test_json_decode() {
    let text = r#"{"name": "alice", "server": {"port": 8080, "hosts": ["a", "b"], "ratio": 0.5}}"#;
    let map = Json.decode(text, CommentMode::Preserve).unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["name", "server"]);
    assert_eq!(
        map.get_path(&"server.port".into()).unwrap(),
        &Value::Int(8080)
    );
    assert_eq!(
        map.get_path(&"server.hosts".into()).unwrap(),
        &Value::from(vec!["a", "b"])
    );
    assert_eq!(
        map.get_path(&"server.ratio".into()).unwrap(),
        &Value::Float(0.5)
    );
}

#[test]
fn test_json_matches_thunder_data() {
    let thunder = Thunder.decode(SCENARIO, CommentMode::Preserve).unwrap();
    let json = Json.encode(&thunder).unwrap();
    let back = Json.decode(&json, CommentMode::Preserve).unwrap();
    assert_eq!(back, thunder);
    assert!(back.all_comments().is_empty());
}

#[test]
fn test_json_rejects_unsupported_values() {
    let err = parse_error(Format::Json, r#"{"a": null}"#);
    assert!(matches!(err.kind(), ParseErrorKind::UnsupportedValue { .. }));

    let err = parse_error(Format::Json, "[1, 2]");
    assert!(matches!(err.kind(), ParseErrorKind::UnsupportedValue { .. }));

    let err = parse_error(Format::Json, "{\n  \"a\": \n}");
    assert!(matches!(err.kind(), ParseErrorKind::Json { .. }));
    assert!(err.line() > 0);
}

#[test]
fn test_format_from_path() {
    assert_eq!(Format::from_path("conf/app.json"), Format::Json);
    assert_eq!(Format::from_path("conf/app.JSON"), Format::Json);
    assert_eq!(Format::from_path("conf/app.tf"), Format::Thunder);
    assert_eq!(Format::from_path("conf/app"), Format::Thunder);
    assert!(Format::Thunder.supports_comments());
    assert!(!Format::Json.supports_comments());
}
