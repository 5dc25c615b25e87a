/// `mosaic check`: load and validate a definition directory.
pub mod check;
/// `mosaic list`: tabulate templates.
pub mod list;
/// `mosaic produce`: build entities and print them.
pub mod produce;
/// `mosaic run`: produce a template and drive it with a headless host.
pub mod run;
/// `mosaic show`: print one template as markup.
pub mod show;

use std::path::Path;

use colored::Colorize;
use mosaic_core::{Entity, Registry};
use mosaic_dsl::{LoadOptions, LoadResult, ProductionIssue, Severity, TemplateLibrary};

/// Load a directory of definition documents and print diagnostics.
/// Returns the library if there are no errors.
fn load_library(dir: &Path, extension: &str) -> Result<TemplateLibrary, String> {
    let options = LoadOptions::default().with_extension(extension);
    let result = mosaic_dsl::load_dir_with(dir, &options);
    print_diagnostics(&result);

    if result.has_errors() {
        Err("loading failed with errors".into())
    } else {
        Ok(result.library)
    }
}

/// Print diagnostics to stderr using ariadne.
fn print_diagnostics(result: &LoadResult) {
    if result.diagnostics.is_empty() {
        return;
    }
    eprint!("{}", result.render_diagnostics());

    let errors = result.diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            plural(errors),
            warnings,
            plural(warnings),
        );
    } else if warnings > 0 {
        eprintln!("  {} warning{}", warnings, plural(warnings));
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// A registry with the built-in component types.
fn registry() -> Registry {
    let mut registry = Registry::new();
    mosaic_host::register_builtin(&mut registry);
    registry
}

/// Produce the entity or set template `name`, printing skipped members.
fn produce(
    library: &TemplateLibrary,
    registry: &Registry,
    name: &str,
) -> Result<Vec<Entity>, String> {
    let produced = if library.entity(name).is_some() {
        library
            .produce_entity_with_issues(registry, name, None)
            .map(|(entity, issues)| (vec![entity], issues))
    } else if library.set(name).is_some() {
        library.produce_set_with_issues(registry, name, None)
    } else {
        return Err(format!("template not found: \"{name}\""));
    };
    let (entities, issues) = produced.map_err(|e| e.to_string())?;

    print_issues(&issues);
    Ok(entities)
}

fn print_issues(issues: &[ProductionIssue]) {
    for issue in issues {
        eprintln!("  {} {issue}", "warning:".yellow().bold());
    }
}

/// `alloc::string::String` -> `String`, keeping generic structure.
fn short_type_name(full: &str) -> String {
    let mut out = String::new();
    let mut word = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            word.push(ch);
        } else {
            out.push_str(last_segment(&word));
            word.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&word));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_type_names() {
        assert_eq!(short_type_name("alloc::string::String"), "String");
        assert_eq!(short_type_name("f32"), "f32");
        assert_eq!(
            short_type_name("core::option::Option<mosaic_core::entity::EntityId>"),
            "Option<EntityId>"
        );
    }
}
