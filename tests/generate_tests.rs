mod common;

use std::fs;

use common::{CrateFixture, FOO_TAGS, USERS_DIRECTIVE};
use routegen::config::{GenerateConfig, Overrides};
use routegen::generator::{generate, GENERATED_HEADER};
use routegen::scanner::{GrammarKind, ReceiverKind};
use routegen::GenerateError;

fn directive() -> Overrides {
    Overrides {
        grammar: Some(GrammarKind::Directive),
        ..Overrides::default()
    }
}

#[test]
fn test_generate_writes_module_next_to_entry() {
    let fixture = CrateFixture::new("user-service");
    fixture
        .write("src/handlers/mod.rs", "pub mod users;\n")
        .write("src/handlers/users.rs", USERS_DIRECTIVE);

    let config = GenerateConfig::resolve(fixture.root(), directive()).unwrap();
    assert_eq!(config.crate_prefix, "crate");
    let outcome = generate(&config, false).unwrap();

    assert!(outcome.written);
    assert_eq!(outcome.output, config.output_path());
    let written = fs::read_to_string(fixture.output()).unwrap();
    assert_eq!(written, outcome.source);
    assert!(written.starts_with(GENERATED_HEADER));
    assert!(written.contains("pub fn register_user_controller("));
    assert!(written.contains("\"crate::handlers\""));

    let controller = outcome.table.controller("&UserController").unwrap();
    assert_eq!(controller.type_path, "crate::handlers::users::UserController");
    assert_eq!(controller.receiver_kind, ReceiverKind::Shared);
    let get = &controller.routes["/users/:id"][0];
    assert_eq!(get.methods, vec!["GET".to_string()]);
    assert_eq!(get.parameters[0].key, "id");
    assert_eq!(get.parameters[0].value_type, "routegen::Path<i64>");
    let create = &controller.routes["/users"][0];
    assert_eq!(create.parameters.len(), 2);
    assert_eq!(outcome.table.route_count(), 2);
}

#[test]
fn test_generate_twice_is_byte_identical() {
    let fixture = CrateFixture::new("user-service");
    fixture
        .write("src/handlers/mod.rs", "pub mod users;\n")
        .write("src/handlers/users.rs", USERS_DIRECTIVE)
        .write("src/handlers/admin/mod.rs", "")
        .write(
            "src/handlers/admin/audit.rs",
            "pub struct Audit;\nimpl Audit {\n    //routegen:api GET /audit\n    fn list(&self, page: routegen::Query<i32>) -> routegen::JsonResponse<Vec<String>> { todo!() }\n}\n",
        );
    let config = GenerateConfig::resolve(fixture.root(), directive()).unwrap();

    generate(&config, false).unwrap();
    let first = fs::read(fixture.output()).unwrap();
    generate(&config, false).unwrap();
    let second = fs::read(fixture.output()).unwrap();
    assert_eq!(first, second);
    assert!(String::from_utf8(first).unwrap().contains("\"crate::handlers::admin\""));
}

#[test]
fn test_dry_run_writes_nothing() {
    let fixture = CrateFixture::new("user-service");
    fixture.write("src/handlers/users.rs", USERS_DIRECTIVE);
    let config = GenerateConfig::resolve(fixture.root(), directive()).unwrap();

    let outcome = generate(&config, true).unwrap();
    assert!(!outcome.written);
    assert!(outcome.source.contains("register_user_controller"));
    assert!(!fixture.output().exists());
}

#[test]
fn test_malformed_directive_leaves_no_output() {
    let fixture = CrateFixture::new("user-service");
    fixture.write(
        "src/handlers/users.rs",
        "pub struct U;\nimpl U {\n    //routegen:api GET\n    fn get(&self, id: String) -> String { id }\n}\n",
    );
    let config = GenerateConfig::resolve(fixture.root(), directive()).unwrap();

    let err = generate(&config, false).unwrap_err();
    match err {
        GenerateError::MalformedDirective { line, .. } => assert_eq!(line, 3),
        other => panic!("expected MalformedDirective, got {other}"),
    }
    assert!(!fixture.output().exists());
}

#[test]
fn test_failed_run_keeps_previous_output() {
    let fixture = CrateFixture::new("user-service");
    fixture.write("src/handlers/users.rs", USERS_DIRECTIVE);
    let config = GenerateConfig::resolve(fixture.root(), directive()).unwrap();
    generate(&config, false).unwrap();
    let before = fs::read_to_string(fixture.output()).unwrap();

    fixture.write("src/handlers/broken.rs", "impl X { fn oops(&self, a: i32 -> }\n//routegen:api GET /x\n");
    let err = generate(&config, false).unwrap_err();
    assert_eq!(err.stage(), "scan");
    assert_eq!(fs::read_to_string(fixture.output()).unwrap(), before);
}

#[test]
fn test_tag_grammar_methods_and_url() {
    let fixture = CrateFixture::new("foo-service");
    fixture.write("src/handlers/foo.rs", FOO_TAGS);
    let config = GenerateConfig::resolve(fixture.root(), Overrides::default()).unwrap();
    assert_eq!(config.grammar, GrammarKind::Tag);

    let outcome = generate(&config, false).unwrap();
    let controller = outcome.table.controller("&FooController").unwrap();
    let handler = &controller.routes["/foo"][0];
    assert_eq!(handler.function_name, "get_foo");
    assert_eq!(handler.methods, vec!["GET".to_string(), "POST".to_string()]);
    assert_eq!(handler.doc.as_ref().unwrap().summary, "summary");
    assert!(outcome.source.contains("&[\"GET\", \"POST\"]"));
}

#[test]
fn test_manifest_metadata_selects_grammar_and_handler_dir() {
    let fixture = CrateFixture::new("api");
    fixture
        .write(
            "Cargo.toml",
            "[package]\nname = \"api\"\nversion = \"0.1.0\"\n\n[package.metadata.routegen]\nhandler = \"src/endpoints\"\ngrammar = \"directive\"\nmarker = \"//api\"\n",
        )
        .write(
            "src/endpoints/ping.rs",
            "pub struct Ping;\nimpl Ping {\n    //api GET /ping\n    fn ping(&self, raw: routegen::RawRequest) -> routegen::JsonResponse<String> { todo!() }\n}\n",
        );
    let config = GenerateConfig::resolve(fixture.root(), Overrides::default()).unwrap();
    assert_eq!(config.grammar, GrammarKind::Directive);
    assert_eq!(config.marker, "//api");

    let outcome = generate(&config, true).unwrap();
    assert_eq!(outcome.table.route_count(), 1);
    assert!(outcome.table.controller("&Ping").is_some());
}

#[test]
fn test_handler_dir_outside_src_is_rejected() {
    let fixture = CrateFixture::new("api");
    fixture.write("handlers/x.rs", "");
    let err = GenerateConfig::resolve(
        fixture.root(),
        Overrides {
            handler: Some("handlers".into()),
            ..Overrides::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.stage(), "configuration");
}
