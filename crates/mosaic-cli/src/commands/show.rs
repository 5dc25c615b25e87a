use std::path::Path;

use colored::Colorize;

/// Print the definition of template `name`.
pub fn run(dir: &Path, extension: &str, name: &str) -> Result<(), String> {
    let library = super::load_library(dir, extension)?;

    let (kind, node) = if let Some(def) = library.entity(name) {
        ("entity", def.to_node())
    } else if let Some(def) = library.set(name) {
        ("set", def.to_node())
    } else {
        return Err(format!("template not found: \"{name}\""));
    };

    println!("  {} [{}]", name.bold(), kind.dimmed());
    println!();
    for line in node.to_string().lines() {
        println!("  {line}");
    }

    Ok(())
}
