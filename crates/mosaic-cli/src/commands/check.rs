use std::path::Path;

use colored::Colorize;

/// Load, then produce every template once. Any template that cannot be
/// produced fails the check; skipped members are warnings.
pub fn run(dir: &Path, extension: &str) -> Result<(), String> {
    let library = super::load_library(dir, extension)?;
    let registry = super::registry();

    let mut failed = 0;
    let mut warnings = 0;
    for name in library.entity_names() {
        match library.produce_entity_with_issues(&registry, name, None) {
            Ok((_, issues)) => {
                warnings += issues.len();
                super::print_issues(&issues);
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {} {e}", "error:".red().bold());
            }
        }
    }
    for name in library.set_names() {
        match library.produce_set_with_issues(&registry, name, None) {
            Ok((_, issues)) => {
                warnings += issues.len();
                super::print_issues(&issues);
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {} {e}", "error:".red().bold());
            }
        }
    }

    if failed > 0 {
        return Err(format!(
            "{failed} template{} could not be produced",
            super::plural(failed)
        ));
    }

    println!("  All checks passed for '{}'.", dir.display());
    println!(
        "  {} entity templates, {} set templates, {} warning{}",
        library.entity_names().len(),
        library.set_names().len(),
        warnings,
        super::plural(warnings)
    );

    Ok(())
}
