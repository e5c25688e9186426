//! Canonical text for type expressions.
//!
//! The resolver turns a `syn::Type` into the text the generated module can use
//! to name that type from outside the handler's own module. It does no semantic
//! analysis: identifiers are qualified with the module path of the file they
//! were found in unless they are primitives, prelude types, `use` imports, or
//! already qualified.
//!
//! Two contexts exist because binder extraction needs the owned value type
//! while signatures and docs need to know whether the handler takes a
//! reference:
//!
//! | expression      | [`TypeContext::Value`] | [`TypeContext::Declaration`] |
//! |-----------------|------------------------|------------------------------|
//! | `&i32`          | `i32`                  | `&i32`                       |
//! | `&mut Form<u8>` | `Form<u8>`             | `&mut Form<u8>`              |
//! | `[User]`        | `[app::User]`          | `[app::User]`                |
//!
//! Shapes with no canonical text resolve to [`UNKNOWN_TYPE`].

use std::collections::HashMap;

use quote::ToTokens;
use syn::{GenericArgument, PathArguments, Type, UseTree};
use tracing::warn;

/// Sentinel emitted for unresolvable type expressions
pub const UNKNOWN_TYPE: &str = "unknown";

/// Resolution context, see the module docs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeContext {
    Value,
    Declaration,
}

/// Builtin scalars and prelude types that never take a module qualifier
const VERBATIM: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
    "f32", "f64", "bool", "char", "str", "String", "Vec", "Option", "Box", "Result",
];

/// Whether `name` is a primitive scalar or prelude type name
#[must_use]
pub fn is_verbatim(name: &str) -> bool {
    VERBATIM.contains(&name)
}

/// Names brought into a file by `use` items, mapped to the path they import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    entries: HashMap<String, String>,
}

impl ImportMap {
    /// Collect the top-level `use` items of a file. Glob imports are ignored.
    #[must_use]
    pub fn from_file(file: &syn::File) -> Self {
        Self::from_items(&file.items)
    }

    /// Collect the `use` items among `items`, e.g. the body of an inline module
    #[must_use]
    pub fn from_items(items: &[syn::Item]) -> Self {
        let mut map = Self::default();
        for item in items {
            if let syn::Item::Use(item_use) = item {
                let prefix = if item_use.leading_colon.is_some() {
                    vec![String::new()]
                } else {
                    Vec::new()
                };
                map.collect(&item_use.tree, prefix);
            }
        }
        map
    }

    fn collect(&mut self, tree: &UseTree, mut prefix: Vec<String>) {
        match tree {
            UseTree::Path(p) => {
                prefix.push(p.ident.to_string());
                self.collect(&p.tree, prefix);
            }
            UseTree::Name(n) => {
                let name = n.ident.to_string();
                if name == "self" {
                    if let Some(last) = prefix.last().cloned() {
                        self.entries.insert(last, prefix.join("::"));
                    }
                } else {
                    prefix.push(name.clone());
                    self.entries.insert(name, prefix.join("::"));
                }
            }
            UseTree::Rename(r) => {
                let ident = r.ident.to_string();
                if ident != "self" {
                    prefix.push(ident);
                }
                if r.rename != "_" {
                    self.entries.insert(r.rename.to_string(), prefix.join("::"));
                }
            }
            UseTree::Group(g) => {
                for item in &g.items {
                    self.collect(item, prefix.clone());
                }
            }
            UseTree::Glob(_) => {}
        }
    }

    /// Imported path for `name`, if any
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }
}

/// Resolver configured for one file (and optionally one `impl` block)
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeResolver<'a> {
    alias: Option<&'a str>,
    crate_root: Option<&'a str>,
    self_type: Option<&'a str>,
    imports: Option<&'a ImportMap>,
}

impl<'a> TypeResolver<'a> {
    /// Resolver that qualifies bare identifiers with `alias`
    #[must_use]
    pub fn new(alias: Option<&'a str>) -> Self {
        Self {
            alias,
            ..Self::default()
        }
    }

    /// Path that replaces a leading `crate` segment
    #[must_use]
    pub fn with_crate_root(mut self, crate_root: Option<&'a str>) -> Self {
        self.crate_root = crate_root;
        self
    }

    /// Text substituted for `Self`
    #[must_use]
    pub fn with_self_type(mut self, self_type: Option<&'a str>) -> Self {
        self.self_type = self_type;
        self
    }

    #[must_use]
    pub fn with_imports(mut self, imports: &'a ImportMap) -> Self {
        self.imports = Some(imports);
        self
    }

    fn without_alias(self) -> Self {
        Self {
            alias: None,
            ..self
        }
    }

    /// Value-context resolution: references and pointers are stripped
    #[must_use]
    pub fn value(&self, ty: &Type) -> String {
        self.resolve(ty, TypeContext::Value)
    }

    /// Declaration-context resolution: references keep their `&` / `&mut ` marker
    #[must_use]
    pub fn declaration(&self, ty: &Type) -> String {
        self.resolve(ty, TypeContext::Declaration)
    }

    /// Resolve `ty` in the given context
    #[must_use]
    pub fn resolve(&self, ty: &Type, ctx: TypeContext) -> String {
        match ty {
            Type::Path(tp) if tp.qself.is_none() => self.resolve_path(&tp.path, ctx),
            Type::Reference(r) => {
                let inner = self.resolve(&r.elem, ctx);
                match ctx {
                    TypeContext::Value => inner,
                    TypeContext::Declaration if r.mutability.is_some() => format!("&mut {inner}"),
                    TypeContext::Declaration => format!("&{inner}"),
                }
            }
            Type::Ptr(p) => {
                let inner = self.resolve(&p.elem, ctx);
                match ctx {
                    TypeContext::Value => inner,
                    TypeContext::Declaration if p.mutability.is_some() => format!("*mut {inner}"),
                    TypeContext::Declaration => format!("*const {inner}"),
                }
            }
            Type::Slice(s) => format!("[{}]", self.resolve(&s.elem, ctx)),
            Type::Array(a) => format!(
                "[{}; {}]",
                self.resolve(&a.elem, ctx),
                a.len.to_token_stream()
            ),
            Type::Paren(p) => self.resolve(&p.elem, ctx),
            Type::Group(g) => self.resolve(&g.elem, ctx),
            Type::Tuple(t) if t.elems.is_empty() => "()".to_string(),
            other => {
                warn!(
                    type_expr = %other.to_token_stream(),
                    "unresolvable type expression, emitting `unknown`"
                );
                UNKNOWN_TYPE.to_string()
            }
        }
    }

    fn resolve_path(&self, path: &syn::Path, ctx: TypeContext) -> String {
        let segments: Vec<&syn::PathSegment> = path.segments.iter().collect();
        let Some((last, base)) = segments.split_last() else {
            return UNKNOWN_TYPE.to_string();
        };
        let args = self.resolve_args(&last.arguments, ctx);
        let name = last.ident.to_string();

        if base.is_empty() && path.leading_colon.is_none() {
            return format!("{}{args}", self.qualify(&name));
        }

        let plain = self.without_alias();
        let mut parts: Vec<String> = Vec::with_capacity(segments.len());
        for seg in base {
            parts.push(format!(
                "{}{}",
                seg.ident,
                plain.resolve_args(&seg.arguments, ctx)
            ));
        }
        let head = if path.leading_colon.is_some() {
            format!("::{}", parts.join("::"))
        } else {
            self.rewrite_head(&parts)
        };
        format!("{head}::{name}{args}")
    }

    /// Qualify a single identifier
    fn qualify(&self, name: &str) -> String {
        if name == "Self" {
            if let Some(self_type) = self.self_type {
                return self_type.to_string();
            }
        }
        if is_verbatim(name) || name.contains("::") {
            return name.to_string();
        }
        if let Some(imported) = self.imports.and_then(|m| m.get(name)) {
            let parts: Vec<String> = imported.split("::").map(str::to_string).collect();
            if parts.first().is_some_and(String::is_empty) {
                return imported.to_string();
            }
            return self.rewrite_head(&parts);
        }
        match self.alias {
            Some(alias) => format!("{alias}::{name}"),
            None => name.to_string(),
        }
    }

    /// Rewrite the leading segments of a qualified path so it is valid from the generated module.
    ///
    /// `crate` becomes the crate root, leading `self` and `super` segments are
    /// applied to the alias, and an imported first segment is replaced by its import.
    fn rewrite_head(&self, parts: &[String]) -> String {
        let Some((first, rest)) = parts.split_first() else {
            return String::new();
        };
        let (head, rest) = match first.as_str() {
            "crate" => (self.crate_root.unwrap_or("crate").to_string(), rest),
            "self" | "super" => match self.relative_base(parts) {
                Some((module, used)) => (module, parts.get(used..).unwrap_or_default()),
                None => {
                    warn!(
                        path = %parts.join("::"),
                        "relative path escapes the crate root, emitting it unchanged"
                    );
                    return parts.join("::");
                }
            },
            other => match self.imports.and_then(|m| m.get(other)) {
                Some(imported) if imported != other => {
                    let nested: Vec<String> = imported.split("::").map(str::to_string).collect();
                    (self.rewrite_head(&nested), rest)
                }
                _ => (other.to_string(), rest),
            },
        };
        if rest.is_empty() {
            head
        } else {
            format!("{head}::{}", rest.join("::"))
        }
    }

    /// Module reached by the leading `self`/`super` segments of `parts`, and how
    /// many segments they span. `None` without an alias or past the crate root.
    fn relative_base(&self, parts: &[String]) -> Option<(String, usize)> {
        let mut module: Vec<&str> = self.alias?.split("::").collect();
        let mut used = 0;
        for part in parts {
            match part.as_str() {
                "self" if used == 0 => {}
                "super" if module.len() > 1 => {
                    module.pop();
                }
                "super" => return None,
                _ => break,
            }
            used += 1;
        }
        Some((module.join("::"), used))
    }

    fn resolve_args(&self, args: &PathArguments, ctx: TypeContext) -> String {
        let PathArguments::AngleBracketed(ab) = args else {
            return String::new();
        };
        let rendered: Vec<String> = ab
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(self.resolve(ty, ctx)),
                GenericArgument::Lifetime(_) => None,
                GenericArgument::Const(expr) => Some(expr.to_token_stream().to_string()),
                GenericArgument::AssocType(assoc) => {
                    Some(format!("{} = {}", assoc.ident, self.resolve(&assoc.ty, ctx)))
                }
                other => {
                    warn!(
                        argument = %other.to_token_stream(),
                        "unresolvable generic argument"
                    );
                    Some(UNKNOWN_TYPE.to_string())
                }
            })
            .collect();
        if rendered.is_empty() {
            String::new()
        } else {
            format!("<{}>", rendered.join(", "))
        }
    }
}

/// The types a function returns, one per result: a tuple counts each element
/// and `()` or a missing return type count as none.
#[must_use]
pub fn result_types(output: &syn::ReturnType) -> Vec<&Type> {
    match output {
        syn::ReturnType::Default => Vec::new(),
        syn::ReturnType::Type(_, ty) => match ty.as_ref() {
            Type::Tuple(t) => t.elems.iter().collect(),
            other => vec![other],
        },
    }
}
