//! Directory walk and per-file handler extraction.

use std::fs;
use std::path::{Path, PathBuf};

use syn::spanned::Spanned;
use syn::{FnArg, ImplItem, Item, Pat, Type};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::annotation::{AnnotationGrammar, AnnotationIndex};
use super::comments::comment_groups;
use super::resolve::{result_types, ImportMap, TypeResolver};
use super::table::{ControllerSource, HandlerSpec, ParameterSpec, ReceiverKind, RouteTable};
use crate::error::GenerateError;
use crate::generator::GENERATED_FILE_NAME;

/// Inputs of one scan
pub struct ScanConfig<'a> {
    /// The crate's `src` directory; module paths are computed relative to it
    pub src_dir: &'a Path,
    /// Root of the handler tree, must sit under `src_dir`
    pub handler_dir: &'a Path,
    /// How the generated module names the handler crate: `crate` or the package name
    pub crate_prefix: &'a str,
    pub grammar: &'a dyn AnnotationGrammar,
}

/// Walk the handler tree and build the route table.
///
/// Directories are visited in file-name order and each directory's `.rs` files
/// in lexicographic order, so the table does not depend on filesystem order.
///
/// # Errors
///
/// Fails on unreadable directories or files, files `syn` cannot parse,
/// malformed directives, and a handler tree outside `src_dir`.
pub fn scan(config: &ScanConfig<'_>) -> Result<RouteTable, GenerateError> {
    let mut table = RouteTable::new();

    let walker = WalkDir::new(config.handler_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir());

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map_or_else(|| config.handler_dir.to_path_buf(), Path::to_path_buf);
            GenerateError::io(path, err.into())
        })?;
        let dir = entry.path();
        let module = module_path(config.crate_prefix, config.src_dir, dir)?;

        let mut created = false;
        for file in source_files(dir)? {
            let source =
                fs::read_to_string(&file).map_err(|err| GenerateError::io(&file, err))?;
            let alias = file_module(&module, config.src_dir == dir, &file);
            debug!(path = %file.display(), module = %alias, "scanning source file");
            created |= scan_source(
                &file,
                &source,
                &alias,
                config.crate_prefix,
                config.grammar,
                &mut table,
            )?;
        }
        if created {
            table.record_import(&module);
        }
    }

    info!(
        controllers = table.controllers().count(),
        routes = table.route_count(),
        "scan complete"
    );
    Ok(table)
}

/// Scan one parsed source file into `table`.
///
/// Returns `true` if the file introduced at least one new controller.
///
/// # Errors
///
/// [`GenerateError::Parse`] for invalid Rust and whatever the grammar
/// reports for malformed annotations.
pub fn scan_source(
    path: &Path,
    source: &str,
    alias: &str,
    crate_root: &str,
    grammar: &dyn AnnotationGrammar,
    table: &mut RouteTable,
) -> Result<bool, GenerateError> {
    let file = syn::parse_file(source).map_err(|err| {
        let at = err.span().start();
        GenerateError::Parse {
            path: path.to_path_buf(),
            message: format!("{}:{}: {err}", at.line, at.column + 1),
        }
    })?;
    let index = grammar.index(path, &comment_groups(source))?;
    if index.is_empty() {
        return Ok(false);
    }

    let scope = FileScope {
        index: &index,
        crate_root,
    };
    scope.visit_items(&file.items, alias, table)
}

struct FileScope<'a> {
    index: &'a AnnotationIndex,
    crate_root: &'a str,
}

impl FileScope<'_> {
    fn visit_items(
        &self,
        items: &[Item],
        alias: &str,
        table: &mut RouteTable,
    ) -> Result<bool, GenerateError> {
        let imports = ImportMap::from_items(items);
        let mut created = false;
        for item in items {
            match item {
                Item::Impl(item_impl) if item_impl.trait_.is_none() => {
                    created |= self.visit_impl(item_impl, alias, &imports, table);
                }
                Item::Mod(module) => {
                    if let Some((_, nested)) = &module.content {
                        let nested_alias = format!("{alias}::{}", module.ident);
                        created |= self.visit_items(nested, &nested_alias, table)?;
                    }
                }
                _ => {}
            }
        }
        Ok(created)
    }

    fn visit_impl(
        &self,
        item_impl: &syn::ItemImpl,
        alias: &str,
        imports: &ImportMap,
        table: &mut RouteTable,
    ) -> bool {
        let self_text = TypeResolver::new(None).value(&item_impl.self_ty);
        let resolver = TypeResolver::new(Some(alias))
            .with_crate_root(Some(self.crate_root))
            .with_imports(imports);
        let type_path = resolver.value(&item_impl.self_ty);
        let resolver = resolver.with_self_type(Some(&type_path));

        let mut created = false;
        for impl_item in &item_impl.items {
            let ImplItem::Fn(method) = impl_item else {
                continue;
            };
            let Some(FnArg::Receiver(receiver)) = method.sig.inputs.first() else {
                continue;
            };
            let typed: Vec<&syn::PatType> = method
                .sig
                .inputs
                .iter()
                .filter_map(|arg| match arg {
                    FnArg::Typed(pt) => Some(pt),
                    FnArg::Receiver(_) => None,
                })
                .collect();
            if typed.is_empty() {
                continue;
            }

            let name = method.sig.ident.to_string();
            let start_line = method.span().start().line;
            let Some(annotation) = self.index.lookup(&name, start_line) else {
                continue;
            };

            let results = result_types(&method.sig.output);
            if results.len() != 1 {
                debug!(function = %name, results = results.len(), "handler must return exactly one value, skipping");
                continue;
            }

            let Some(kind) = receiver_kind(receiver) else {
                warn!(
                    function = %name,
                    receiver = %quote::ToTokens::to_token_stream(&receiver.ty),
                    "unsupported receiver form, skipping handler"
                );
                continue;
            };
            let receiver_key = TypeResolver::new(None)
                .with_self_type(Some(&self_text))
                .declaration(&receiver.ty);

            let mut parameters = Vec::with_capacity(typed.len());
            for pt in &typed {
                let Some(key) = pattern_key(&pt.pat) else {
                    warn!(
                        function = %name,
                        pattern = %quote::ToTokens::to_token_stream(&pt.pat),
                        "parameter pattern must bind exactly one name, skipping handler"
                    );
                    parameters.clear();
                    break;
                };
                parameters.push(ParameterSpec {
                    key,
                    ty: resolver.declaration(&pt.ty),
                    value_type: resolver.value(&pt.ty),
                });
            }
            if parameters.is_empty() {
                continue;
            }

            let spec = HandlerSpec {
                path: annotation.path().to_string(),
                methods: annotation.methods(),
                function_name: name,
                parameters,
                result_type: results.first().map(|ty| resolver.declaration(ty)),
                doc: annotation.doc(),
            };
            info!(
                controller = %receiver_key,
                method = spec.http_method().unwrap_or("*"),
                path = %spec.path,
                function = %spec.function_name,
                "route found"
            );
            let source = ControllerSource {
                type_path: type_path.clone(),
                source_alias: alias.to_string(),
                receiver_kind: kind,
            };
            created |= table.insert(&receiver_key, &source, spec);
        }
        created
    }
}

fn receiver_kind(receiver: &syn::Receiver) -> Option<ReceiverKind> {
    if receiver.colon_token.is_none() {
        return Some(match receiver.reference {
            Some(_) if receiver.mutability.is_some() => ReceiverKind::Exclusive,
            Some(_) => ReceiverKind::Shared,
            None => ReceiverKind::Owned,
        });
    }
    match receiver.ty.as_ref() {
        Type::Reference(r) if is_self(&r.elem) => Some(if r.mutability.is_some() {
            ReceiverKind::Exclusive
        } else {
            ReceiverKind::Shared
        }),
        ty if is_self(ty) => Some(ReceiverKind::Owned),
        Type::Path(tp) => {
            let last = tp.path.segments.last()?;
            let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
                return None;
            };
            let only_self = args.args.len() == 1
                && matches!(args.args.first(), Some(syn::GenericArgument::Type(t)) if is_self(t));
            (last.ident == "Arc" && only_self).then_some(ReceiverKind::SharedArc)
        }
        _ => None,
    }
}

fn is_self(ty: &Type) -> bool {
    matches!(ty, Type::Path(tp) if tp.qself.is_none() && tp.path.is_ident("Self"))
}

/// The single identifier a parameter pattern binds: `id`, `mut id` and `Path(id)` all give `id`
fn pattern_key(pat: &Pat) -> Option<String> {
    let mut names = Vec::new();
    bound_names(pat, &mut names);
    if names.len() == 1 {
        names.pop()
    } else {
        None
    }
}

fn bound_names(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(pi) => {
            out.push(pi.ident.to_string());
            if let Some((_, sub)) = &pi.subpat {
                bound_names(sub, out);
            }
        }
        Pat::TupleStruct(ts) => ts.elems.iter().for_each(|p| bound_names(p, out)),
        Pat::Tuple(t) => t.elems.iter().for_each(|p| bound_names(p, out)),
        Pat::Struct(s) => s.fields.iter().for_each(|f| bound_names(&f.pat, out)),
        Pat::Reference(r) => bound_names(&r.pat, out),
        Pat::Paren(p) => bound_names(&p.pat, out),
        Pat::Type(t) => bound_names(&t.pat, out),
        _ => {}
    }
}

/// Module path for a directory under `src_dir`, e.g. `crate::handlers::users`
fn module_path(prefix: &str, src_dir: &Path, dir: &Path) -> Result<String, GenerateError> {
    let relative = dir.strip_prefix(src_dir).map_err(|_| {
        GenerateError::Configuration(format!(
            "handler directory {} is not under {}",
            dir.display(),
            src_dir.display()
        ))
    })?;
    let mut module = prefix.to_string();
    for component in relative.components() {
        module.push_str("::");
        module.push_str(&component.as_os_str().to_string_lossy());
    }
    Ok(module)
}

/// Module path of one file inside a directory module
fn file_module(dir_module: &str, is_src_root: bool, file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem == "mod" || (is_src_root && (stem == "lib" || stem == "main")) {
        dir_module.to_string()
    } else {
        format!("{dir_module}::{stem}")
    }
}

/// `.rs` files directly inside `dir`, sorted, excluding generated output
fn source_files(dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| GenerateError::io(dir, err))? {
        let entry = entry.map_err(|err| GenerateError::io(dir, err))?;
        let path = entry.path();
        let is_rust = path.extension().is_some_and(|ext| ext == "rs");
        let generated = path.file_name().is_some_and(|n| n == GENERATED_FILE_NAME);
        if is_rust && !generated && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::annotation::{GrammarKind, DEFAULT_DIRECTIVE_MARKER};

    fn scan_str(src: &str, kind: GrammarKind) -> RouteTable {
        let grammar = kind.grammar(DEFAULT_DIRECTIVE_MARKER);
        let mut table = RouteTable::new();
        scan_source(
            Path::new("src/handlers/users.rs"),
            src,
            "app::handlers::users",
            "app",
            grammar.as_ref(),
            &mut table,
        )
        .unwrap();
        table
    }

    #[test]
    fn test_directive_handler_under_shared_receiver_key() {
        let src = r"
pub struct UserController;

impl UserController {
    //routegen:api GET /users/:id
    fn get(&self, id: String) -> Json<User> {
        todo!()
    }
}
";
        let table = scan_str(src, GrammarKind::Directive);
        let entry = table.controller("&UserController").unwrap();
        assert_eq!(entry.type_path, "app::handlers::users::UserController");
        assert_eq!(entry.receiver_kind, ReceiverKind::Shared);
        let handlers = &entry.routes["/users/:id"];
        assert_eq!(handlers.len(), 1);
        let h = &handlers[0];
        assert_eq!(h.http_method(), Some("GET"));
        assert_eq!(h.function_name, "get");
        assert_eq!(h.parameters.len(), 1);
        assert_eq!(h.parameters[0].key, "id");
        assert_eq!(h.parameters[0].ty, "String");
        assert_eq!(h.result_type.as_deref(), Some("app::handlers::users::Json<app::handlers::users::User>"));
    }

    #[test]
    fn test_directive_binds_through_attributes() {
        let src = r"
impl C {
    //routegen:api POST /things
    /// Creates a thing.
    #[allow(unused)]
    pub fn create(&mut self, body: Json<Thing>) -> JsonResponse<Thing> {
        todo!()
    }

    //routegen:api GET /gap

    fn detached(&self, id: Path<i64>) -> JsonResponse<i64> {
        todo!()
    }
}
";
        let table = scan_str(src, GrammarKind::Directive);
        let entry = table.controller("&mut C").unwrap();
        assert_eq!(entry.receiver_kind, ReceiverKind::Exclusive);
        assert!(entry.routes.contains_key("/things"));
        assert_eq!(table.route_count(), 1);
    }

    #[test]
    fn test_non_candidates_are_ignored() {
        let src = r"
impl C {
    // no_args Summary
    // @GET /a
    fn no_args(&self) -> u8 { 0 }

    // two_results Summary
    // @GET /b
    fn two_results(&self, x: Path<i32>) -> (u8, u8) { (0, 0) }

    // unit Summary
    // @GET /c
    fn unit(&self, x: Path<i32>) {}

    // assoc Summary
    // @GET /d
    fn assoc(x: Path<i32>) -> u8 { 0 }

    // ok Summary
    // @GET /e
    fn ok(&self, x: Path<i32>) -> u8 { 0 }
}
";
        let table = scan_str(src, GrammarKind::Tag);
        assert_eq!(table.route_count(), 1);
        let entry = table.controller("&C").unwrap();
        assert!(entry.routes.contains_key("/e"));
    }

    #[test]
    fn test_tag_handler_keeps_doc_and_reference_params() {
        let src = r"
use routegen::{Form, JsonResponse, Path};

impl Pets {
    /// update_pet Updates
    /// @Description one-pet
    /// @Tags pets
    /// @Method put,post
    /// @URL /pets/:id
    pub fn update_pet(self: Arc<Self>, Path(id): Path<i64>, form: &mut Form<String>) -> JsonResponse<Pet> {
        todo!()
    }
}
";
        let table = scan_str(src, GrammarKind::Tag);
        let entry = table.controller("Arc<Pets>").unwrap();
        assert_eq!(entry.receiver_kind, ReceiverKind::SharedArc);
        let h = &entry.routes["/pets/:id"][0];
        assert_eq!(h.methods, vec!["PUT", "POST"]);
        assert_eq!(h.parameters[0].key, "id");
        assert_eq!(h.parameters[0].value_type, "routegen::Path<i64>");
        assert_eq!(h.parameters[1].ty, "&mut routegen::Form<String>");
        assert_eq!(h.parameters[1].value_type, "routegen::Form<String>");
        let doc = h.doc.as_ref().unwrap();
        assert_eq!(doc.summary, "Updates");
        assert_eq!(doc.description, "one-pet");
        assert_eq!(doc.tags, vec!["pets"]);
    }

    #[test]
    fn test_inline_modules_extend_alias() {
        let src = r"
mod admin {
    impl Panel {
        //routegen:api DELETE /admin/:id
        fn remove(&self, id: Path<i64>) -> Done { todo!() }
    }
}
";
        let table = scan_str(src, GrammarKind::Directive);
        let entry = table.controller("&Panel").unwrap();
        assert_eq!(entry.source_alias, "app::handlers::users::admin");
        assert_eq!(entry.type_path, "app::handlers::users::admin::Panel");
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let grammar = GrammarKind::Tag.grammar(DEFAULT_DIRECTIVE_MARKER);
        let err = scan_source(
            Path::new("broken.rs"),
            "impl C { fn ",
            "app",
            "app",
            grammar.as_ref(),
            &mut RouteTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::Parse { .. }));
    }

    #[test]
    fn test_module_paths() {
        let src = Path::new("/w/src");
        assert_eq!(module_path("crate", src, Path::new("/w/src/handlers/v1")).unwrap(), "crate::handlers::v1");
        assert_eq!(module_path("app", src, src).unwrap(), "app");
        assert!(module_path("app", src, Path::new("/elsewhere")).is_err());
        assert_eq!(file_module("crate::h", false, Path::new("/w/src/h/mod.rs")), "crate::h");
        assert_eq!(file_module("crate::h", false, Path::new("/w/src/h/users.rs")), "crate::h::users");
        assert_eq!(file_module("crate", true, Path::new("/w/src/lib.rs")), "crate");
    }

    #[test]
    fn test_scan_walks_directories_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let src_dir = dir.path().join("src");
        let handlers = src_dir.join("handlers");
        fs::create_dir_all(handlers.join("admin")).unwrap();
        fs::create_dir_all(handlers.join("empty")).unwrap();
        fs::write(
            handlers.join("users.rs"),
            "impl Users {\n    //routegen:api GET /users\n    fn list(&self, q: Query<String>) -> R { todo!() }\n}\n",
        )
        .unwrap();
        fs::write(
            handlers.join("admin").join("mod.rs"),
            "impl Admin {\n    //routegen:api GET /admin\n    fn show(&self, q: Query<String>) -> R { todo!() }\n}\n",
        )
        .unwrap();
        fs::write(handlers.join("empty").join("notes.rs"), "// nothing here\n").unwrap();

        let grammar = GrammarKind::Directive.grammar(DEFAULT_DIRECTIVE_MARKER);
        let table = scan(&ScanConfig {
            src_dir: &src_dir,
            handler_dir: &handlers,
            crate_prefix: "crate",
            grammar: grammar.as_ref(),
        })
        .unwrap();

        assert_eq!(table.route_count(), 2);
        assert_eq!(table.imports(), ["crate::handlers", "crate::handlers::admin"]);
        assert_eq!(
            table.controller("&Admin").unwrap().type_path,
            "crate::handlers::admin::Admin"
        );
    }
}
