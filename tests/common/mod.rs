#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway crate on disk: `Cargo.toml`, an entry file and handler sources
pub struct CrateFixture {
    dir: TempDir,
}

impl CrateFixture {
    /// Library crate named `package` with `src/lib.rs` declaring `mod handlers;`
    pub fn new(package: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            format!("[package]\nname = \"{package}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n"),
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("src/handlers")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "mod handlers;\n").unwrap();
        Self { dir }
    }

    /// Write `contents` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) -> &Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("src").join("routegen_gen.rs")
    }
}

pub const USERS_DIRECTIVE: &str = r#"
use std::sync::Mutex;

use routegen::{Form, JsonResponse, Path, Query};

pub struct UserController {
    names: Mutex<Vec<String>>,
}

impl UserController {
    //routegen:api GET /users/:id
    pub fn get(&self, id: Path<i64>) -> JsonResponse<String> {
        JsonResponse::ok(format!("user {}", id.value))
    }

    //routegen:api POST /users
    pub fn create(&self, name: Form<String>, notify: Query<String>) -> JsonResponse<Vec<String>> {
        let mut names = self.names.lock().unwrap();
        names.push(name.value);
        JsonResponse::ok(names.clone())
    }

    fn helper(&self) -> usize {
        0
    }
}
"#;

pub const FOO_TAGS: &str = r#"
use routegen::{JsonResponse, Query};

pub struct FooController;

impl FooController {
    // get_foo summary
    // @URL /foo
    // @Method get,post
    pub fn get_foo(&self, q: Query<String>) -> JsonResponse<String> {
        JsonResponse::ok(q.value)
    }
}
"#;
