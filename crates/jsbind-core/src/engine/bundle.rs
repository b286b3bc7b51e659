//! Single-entry bundling for the in-process engine.
//!
//! Starting from the entry point, every relative import (`./`, `../`, or an
//! absolute path) is resolved on disk, transpiled, and rewritten from ESM
//! into a function registered under its path. The bundle is an IIFE that
//! requires the entry module last. Bare package specifiers need a package
//! layout to resolve and are reported as errors.
//!
//! Exports are getters on the module's export object, and every reference to
//! an imported binding is rewritten into a property read on the dependency's
//! exports, so bindings stay live and import cycles evaluate as they do
//! natively.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use oxc::ast::AstKind;
use oxc::ast::ast::{
    Declaration, ExportDefaultDeclarationKind, ImportDeclarationSpecifier, ModuleExportName,
    Statement,
};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::{GetSpan, SourceType};

use super::oxc_engine::{data_expression, string_literal, transpile};
use super::{EngineOutput, TransformInput};
use crate::loader::Loader;
use crate::message::Message;

/// Resolution order for extensionless specifiers, as esbuild uses it.
const EXTENSIONS: [&str; 7] = ["tsx", "ts", "jsx", "js", "mjs", "cjs", "json"];

const RUNTIME: &str = r#"  var __modules = {};
  var __cache = {};
  var __require = (id) => {
    if (!(id in __cache)) {
      __cache[id] = {};
      __modules[id](__cache[id]);
    }
    return __cache[id];
  };
  var __export = (target, getters) => {
    for (var name in getters) {
      Object.defineProperty(target, name, { get: getters[name], enumerable: true });
    }
  };
  var __reExport = (target, source) => {
    Object.keys(source).forEach((name) => {
      if (name !== "default" && !Object.prototype.hasOwnProperty.call(target, name)) {
        Object.defineProperty(target, name, { get: () => source[name], enumerable: true });
      }
    });
  };
"#;

/// Bundle `entry` and everything it imports. On success `code` holds the
/// bundle text.
pub(super) fn bundle(entry: &Path) -> EngineOutput {
    let entry = normalize(entry);
    let root = entry
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut linker = Linker {
        root,
        ids: HashMap::new(),
        modules: Vec::new(),
        errors: Vec::new(),
    };

    let entry_id = linker.visit(&entry, None);
    let entry_id = match entry_id {
        Some(id) if linker.errors.is_empty() => id,
        _ if linker.errors.is_empty() => {
            return EngineOutput::error(Message::new(format!(
                "Failed to bundle \"{}\"",
                entry.display()
            )))
        }
        _ => return EngineOutput::errors(linker.errors),
    };

    let mut out = String::from("(() => {\n  \"use strict\";\n");
    out.push_str(RUNTIME);
    for module in &linker.modules {
        out.push_str(&format!(
            "  // {}\n  __modules[{}] = (__exports) => {{\n{}  }};\n",
            module.id,
            string_literal(&module.id),
            module.body
        ));
    }
    out.push_str(&format!("  __require({});\n}})();\n", string_literal(&entry_id)));

    tracing::debug!(modules = linker.modules.len(), entry = %entry_id, "oxc bundle linked");
    EngineOutput::code(out)
}

struct LinkedModule {
    id: String,
    body: String,
}

struct Linker {
    root: PathBuf,
    /// Normalized path -> module id, filled before a module's imports are
    /// visited so cycles terminate.
    ids: HashMap<PathBuf, String>,
    /// Dependencies before dependents.
    modules: Vec<LinkedModule>,
    errors: Vec<Message>,
}

impl Linker {
    fn visit(&mut self, path: &Path, specifier: Option<&str>) -> Option<String> {
        if let Some(id) = self.ids.get(path) {
            return Some(id.clone());
        }

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                let wanted = specifier
                    .map(str::to_string)
                    .unwrap_or_else(|| path.display().to_string());
                self.errors.push(
                    Message::new(format!("Could not resolve \"{wanted}\""))
                        .with_note(e.to_string()),
                );
                return None;
            }
        };

        let id = self.module_id(path);
        self.ids.insert(path.to_path_buf(), id.clone());

        let input = TransformInput {
            source: &source,
            loader: Loader::from_extension(path),
            sourcefile: Some(id.as_str()),
        };
        let body = if input.loader.is_script() {
            let output = transpile(&input);
            if !output.errors.is_empty() {
                self.errors.extend(output.errors);
                return None;
            }
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            self.link(dir, &output.code)?
        } else {
            match data_expression(&input) {
                Ok(expr) => format!("__exports.default = {expr};\n"),
                Err(output) => {
                    self.errors.extend(output.errors);
                    return None;
                }
            }
        };

        self.modules.push(LinkedModule {
            id: id.clone(),
            body,
        });
        Some(id)
    }

    /// Resolve `specifier` from `dir` and visit the target.
    fn require(&mut self, dir: &Path, specifier: &str) -> Option<String> {
        if !is_path_specifier(specifier) {
            self.errors.push(
                Message::new(format!("Could not resolve \"{specifier}\"")).with_note(
                    "Package imports are bundled by the esbuild engine (JSBIND_ENGINE=esbuild)",
                ),
            );
            return None;
        }
        let base = normalize(&dir.join(specifier));
        match candidates(&base).into_iter().find(|p| p.is_file()) {
            Some(path) => self.visit(&path, Some(specifier)),
            None => {
                self.errors
                    .push(Message::new(format!("Could not resolve \"{specifier}\"")));
                None
            }
        }
    }

    /// Rewrite one transpiled ESM module into a registry function body.
    fn link(&mut self, dir: &Path, code: &str) -> Option<String> {
        let allocator = oxc_allocator::Allocator::default();
        let parse_ret = Parser::new(&allocator, code, SourceType::mjs()).parse();
        if parse_ret.panicked || !parse_ret.errors.is_empty() {
            self.errors.extend(
                parse_ret
                    .errors
                    .iter()
                    .map(|e| Message::new(format!("Failed to link module: {e}"))),
            );
            return None;
        }
        let program = parse_ret.program;
        let semantic = SemanticBuilder::new().build(&program).semantic;
        let scoping = semantic.scoping();
        let shorthand: HashSet<u32> = semantic
            .nodes()
            .iter()
            .filter_map(|node| match node.kind() {
                AstKind::ObjectProperty(prop) if prop.shorthand => Some(prop.span.start),
                _ => None,
            })
            .collect();

        let mut edits = Vec::new();
        let mut getters: Vec<(String, String)> = Vec::new();
        let mut bindings: Vec<String> = Vec::new();
        // Imported local name -> live read on the dependency's exports.
        let mut aliases: HashMap<String, String> = HashMap::new();
        let mut failed = false;

        // Imports first: they are hoisted, and exports may name them.
        for stmt in &program.body {
            let Statement::ImportDeclaration(decl) = stmt else {
                continue;
            };
            edits.push(Edit::remove(decl.span.start, decl.span.end));
            if decl.import_kind.is_type() {
                continue;
            }
            let Some(id) = self.require(dir, &decl.source.value) else {
                failed = true;
                continue;
            };
            let binding = format!("__import{}", bindings.len());
            bindings.push(format!("const {binding} = __require({});", string_literal(&id)));
            for spec in decl.specifiers.iter().flatten() {
                let (local, value) = match spec {
                    ImportDeclarationSpecifier::ImportSpecifier(s) => {
                        (&s.local, member(&binding, &s.imported))
                    }
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                        (&s.local, format!("{binding}.default"))
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                        (&s.local, binding.clone())
                    }
                };
                if let Some(symbol_id) = local.symbol_id.get() {
                    for reference in scoping.get_resolved_references(symbol_id) {
                        let span = semantic.nodes().get_node(reference.node_id()).kind().span();
                        let text = if shorthand.contains(&span.start) {
                            format!("{}: {value}", local.name)
                        } else {
                            value.clone()
                        };
                        edits.push(Edit::replace(span.start, span.end, &text));
                    }
                }
                aliases.insert(local.name.to_string(), value);
            }
        }

        for stmt in &program.body {
            match stmt {
                Statement::ExportNamedDeclaration(decl) => {
                    if decl.export_kind.is_type() {
                        edits.push(Edit::remove(decl.span.start, decl.span.end));
                    } else if let Some(source) = &decl.source {
                        edits.push(Edit::remove(decl.span.start, decl.span.end));
                        let Some(id) = self.require(dir, &source.value) else {
                            failed = true;
                            continue;
                        };
                        let binding = format!("__import{}", bindings.len());
                        bindings.push(format!(
                            "const {binding} = __require({});",
                            string_literal(&id)
                        ));
                        for s in &decl.specifiers {
                            getters.push((s.exported.name().to_string(), member(&binding, &s.local)));
                        }
                    } else if let Some(declaration) = &decl.declaration {
                        edits.push(Edit::remove(decl.span.start, declaration.span().start));
                        for name in declared_names(declaration) {
                            getters.push((name.clone(), name));
                        }
                    } else {
                        edits.push(Edit::remove(decl.span.start, decl.span.end));
                        for s in &decl.specifiers {
                            let local = s.local.name().to_string();
                            let value = aliases.get(&local).cloned().unwrap_or(local);
                            getters.push((s.exported.name().to_string(), value));
                        }
                    }
                }
                Statement::ExportDefaultDeclaration(decl) => {
                    let inner = decl.declaration.span();
                    let name = match &decl.declaration {
                        ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                            f.id.as_ref().map(|id| id.name.to_string())
                        }
                        ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                            c.id.as_ref().map(|id| id.name.to_string())
                        }
                        _ => None,
                    };
                    match name {
                        Some(name) => {
                            edits.push(Edit::remove(decl.span.start, inner.start));
                            getters.push(("default".to_string(), name));
                        }
                        None => {
                            edits.push(Edit::replace(decl.span.start, inner.start, "const __default = "));
                            edits.push(Edit::replace(inner.end, inner.end, ";"));
                            getters.push(("default".to_string(), "__default".to_string()));
                        }
                    }
                }
                Statement::ExportAllDeclaration(decl) => {
                    edits.push(Edit::remove(decl.span.start, decl.span.end));
                    if decl.export_kind.is_type() {
                        continue;
                    }
                    let Some(id) = self.require(dir, &decl.source.value) else {
                        failed = true;
                        continue;
                    };
                    let binding = format!("__import{}", bindings.len());
                    bindings.push(format!("const {binding} = __require({});", string_literal(&id)));
                    match &decl.exported {
                        Some(exported) => getters.push((exported.name().to_string(), binding)),
                        None => bindings.push(format!("__reExport(__exports, {binding});")),
                    }
                }
                _ => {}
            }
        }

        if failed {
            return None;
        }

        let mut body = String::new();
        if !getters.is_empty() {
            let entries = getters
                .iter()
                .map(|(name, value)| format!("{}: () => {value}", string_literal(name)))
                .collect::<Vec<_>>()
                .join(", ");
            body.push_str(&format!("__export(__exports, {{ {entries} }});\n"));
        }
        for line in &bindings {
            body.push_str(line);
            body.push('\n');
        }
        body.push_str(&apply(code, edits));
        if !body.ends_with('\n') {
            body.push('\n');
        }
        Some(body)
    }

    /// Path relative to the entry's directory, `/`-separated.
    fn module_id(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.display().to_string(),
        }
    }
}

struct Edit {
    start: u32,
    end: u32,
    text: String,
}

impl Edit {
    fn remove(start: u32, end: u32) -> Self {
        Self::replace(start, end, "")
    }

    fn replace(start: u32, end: u32, text: &str) -> Self {
        Self {
            start,
            end,
            text: text.to_string(),
        }
    }
}

/// Splice non-overlapping edits into `code`.
fn apply(code: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0usize;
    for edit in edits {
        let (start, end) = (edit.start as usize, edit.end as usize);
        if start < cursor {
            continue;
        }
        out.push_str(code.get(cursor..start).unwrap_or_default());
        out.push_str(&edit.text);
        cursor = end;
    }
    out.push_str(code.get(cursor..).unwrap_or_default());
    out
}

fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .flat_map(|d| d.id.get_binding_identifiers())
            .map(|id| id.name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(f) => f.id.iter().map(|id| id.name.to_string()).collect(),
        Declaration::ClassDeclaration(c) => c.id.iter().map(|id| id.name.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// `binding.name`, or `binding["name"]` when `name` is not an identifier.
fn member(binding: &str, name: &ModuleExportName<'_>) -> String {
    let name = name.name();
    if is_identifier(&name) {
        format!("{binding}.{name}")
    } else {
        format!("{binding}[{}]", string_literal(&name))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

/// Files a specifier may name, in lookup order.
fn candidates(base: &Path) -> Vec<PathBuf> {
    let mut out = vec![base.to_path_buf()];
    // TypeScript sources are imported by their emitted `.js` name.
    let rewrites: &[&str] = match base.extension().and_then(|e| e.to_str()) {
        Some("js") => &["ts", "tsx"],
        Some("jsx") => &["tsx"],
        Some("mjs") => &["mts"],
        Some("cjs") => &["cts"],
        _ => &[],
    };
    out.extend(rewrites.iter().map(|ext| base.with_extension(ext)));
    out.extend(EXTENSIONS.iter().map(|ext| {
        let mut path = base.as_os_str().to_os_string();
        path.push(".");
        path.push(ext);
        PathBuf::from(path)
    }));
    out.extend(EXTENSIONS.iter().map(|ext| base.join(format!("index.{ext}"))));
    out
}

/// Lexically drop `.` and fold `..` so one file always gets one key.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
