use std::path::Path;

use comfy_table::{ContentArrangement, Table};

/// Print a table of the loaded templates, optionally only one kind.
pub fn run(dir: &Path, extension: &str, kind: Option<&str>) -> Result<(), String> {
    let library = super::load_library(dir, extension)?;

    let (entities, sets) = match kind.map(str::to_ascii_lowercase).as_deref() {
        None => (true, true),
        Some("entity" | "entities") => (true, false),
        Some("set" | "sets") => (false, true),
        Some(other) => return Err(format!("unknown template kind: \"{other}\" (expected entity or set)")),
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Kind", "Contents"]);

    let mut count = 0;
    if entities {
        for def in library.entity_names().iter().filter_map(|n| library.entity(n)) {
            let contents = format!(
                "{} properties, {} components",
                def.properties.len(),
                def.components.len()
            );
            table.add_row(vec![def.name.as_str(), "entity", contents.as_str()]);
            count += 1;
        }
    }
    if sets {
        for def in library.set_names().iter().filter_map(|n| library.set(n)) {
            let contents = format!("{} entities", def.entities.len());
            table.add_row(vec![def.name.as_str(), "set", contents.as_str()]);
            count += 1;
        }
    }

    if count == 0 {
        println!("  No templates found.");
        return Ok(());
    }

    println!("{table}");
    println!();
    println!("  {count} templates");

    Ok(())
}
