//! Definition documents: lexing, parsing, templates, the zip merge and
//! production of entities through a [`mosaic_core::Registry`].

/// Rendering of load errors and warnings with ariadne.
pub mod diagnostics;
/// Template errors.
pub mod error;
/// Tokenizer for definition documents.
pub mod lexer;
pub mod library;
/// Token stream to [`Node`] trees.
pub mod parser;
pub mod template;
pub mod zip;

use std::path::{Path, PathBuf};

use mosaic_core::Node;

pub use diagnostics::{Diagnostic, Severity};
pub use error::{TemplateError, TemplateKind, TemplateResult};
pub use library::{MemberKind, Produced, ProductionIssue, TemplateLibrary};
pub use template::{EntityDefinition, SetDefinition};
pub use zip::{zip_entity, zip_node, zip_set};

/// Options for [`load_dir_with`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File extension of definition documents, without the dot.
    pub extension: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extension: "xml".to_string(),
        }
    }
}

impl LoadOptions {
    /// Read files with `extension` instead of `xml`.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Result of loading one or more definition documents.
#[derive(Debug, Default)]
pub struct LoadResult {
    /// Every template registered so far.
    pub library: TemplateLibrary,
    /// Errors and warnings, in the order found.
    pub diagnostics: Vec<Diagnostic>,
    /// Every document read, for rendering diagnostics against.
    pub sources: Vec<(PathBuf, String)>,
}

impl LoadResult {
    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Render all diagnostics, each against the document it points into.
    pub fn render_diagnostics(&self) -> String {
        let mut out = String::new();
        for diag in &self.diagnostics {
            let source = diag
                .file
                .as_ref()
                .and_then(|file| self.sources.iter().find(|(path, _)| path == file));
            match source {
                Some((path, text)) => out.push_str(&diagnostics::render_diagnostics(
                    text,
                    &path.display().to_string(),
                    std::slice::from_ref(diag),
                )),
                None => {
                    out.push_str(&diag.to_string());
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Lex and parse a document into its root nodes.
pub fn parse_document(source: &str) -> (Vec<Node>, Vec<Diagnostic>) {
    let (tokens, lex_errors) = lexer::lex(source);

    let mut diagnostics: Vec<Diagnostic> = lex_errors
        .into_iter()
        .map(|e| Diagnostic::error(e.span, e.message))
        .collect();

    match parser::parse(&tokens) {
        Ok(nodes) => (nodes, diagnostics),
        Err(parse_errors) => {
            diagnostics.extend(
                parse_errors
                    .into_iter()
                    .map(|e| Diagnostic::error(e.span, e.message)),
            );
            (Vec::new(), diagnostics)
        }
    }
}

/// Register the templates of one document into `library`. Definitions
/// that fail are skipped and reported; a document that does not parse
/// registers nothing.
pub fn load_into(library: &mut TemplateLibrary, source: &str) -> Vec<Diagnostic> {
    let (nodes, mut diagnostics) = parse_document(source);
    for node in &nodes {
        diagnostics.extend(library.parse_lenient(node).iter().map(Diagnostic::from));
    }
    diagnostics
}

/// Load a single document into a fresh library.
pub fn load_source(source: &str) -> LoadResult {
    let mut library = TemplateLibrary::new();
    let mut diagnostics = load_into(&mut library, source);
    diagnostics.extend(validation_warnings(&library));
    LoadResult {
        library,
        diagnostics,
        sources: Vec::new(),
    }
}

/// Load every `.xml` document in `dir`.
pub fn load_dir(dir: &Path) -> LoadResult {
    load_dir_with(dir, &LoadOptions::default())
}

/// Load every document in `dir` with the configured extension, in file
/// name order, into one library. Later files may inherit from templates
/// of earlier ones.
pub fn load_dir_with(dir: &Path, options: &LoadOptions) -> LoadResult {
    let mut result = LoadResult::default();

    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == options.extension.as_str()))
            .collect(),
        Err(e) => {
            result.diagnostics.push(Diagnostic::error(
                0..0,
                format!("cannot read directory {}: {e}", dir.display()),
            ));
            return result;
        }
    };

    // Sort for deterministic ordering
    paths.sort();

    if paths.is_empty() {
        result.diagnostics.push(Diagnostic::error(
            0..0,
            format!("no .{} files found in {}", options.extension, dir.display()),
        ));
        return result;
    }

    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                log::debug!("loading {}", path.display());
                let found = load_into(&mut result.library, &source);
                result
                    .diagnostics
                    .extend(found.into_iter().map(|d| d.in_file(&path)));
                result.sources.push((path, source));
            }
            Err(e) => result.diagnostics.push(Diagnostic::error(
                0..0,
                format!("cannot read {}: {e}", path.display()),
            )),
        }
    }

    result.diagnostics.extend(validation_warnings(&result.library));
    result
}

fn validation_warnings(library: &TemplateLibrary) -> Vec<Diagnostic> {
    library
        .validate()
        .into_iter()
        .map(|err| Diagnostic::warning(0..0, err.to_string()))
        .collect()
}
