use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use mosaic_core::Entity;
use serde::Serialize;

/// A produced entity, flattened for printing.
#[derive(Debug, Serialize)]
pub struct EntitySnapshot {
    /// Entity name.
    pub name: String,
    /// Entity id, as a UUID string.
    pub id: String,
    /// Properties sorted by name.
    pub properties: Vec<PropertySnapshot>,
    /// Component names in attach order.
    pub components: Vec<String>,
    /// Event names, sorted.
    pub events: Vec<String>,
}

/// One property of an [`EntitySnapshot`].
#[derive(Debug, Serialize)]
pub struct PropertySnapshot {
    /// Property name.
    pub name: String,
    /// Short name of the value type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Debug rendering of the current value.
    pub value: String,
}

impl EntitySnapshot {
    /// Snapshot the current state of `entity`.
    pub fn of(entity: &Entity) -> Self {
        Self {
            name: entity.name().to_string(),
            id: entity.id().0.to_string(),
            properties: entity
                .properties()
                .iter()
                .map(|(name, cell)| PropertySnapshot {
                    name: name.to_string(),
                    type_name: super::short_type_name(cell.value_type_name()),
                    value: cell.debug_value(),
                })
                .collect(),
            components: entity.component_names().map(str::to_string).collect(),
            events: entity.events().names().into_iter().map(str::to_string).collect(),
        }
    }
}

/// Produce `name` and print every resulting entity.
pub fn run(dir: &Path, extension: &str, name: &str, json: bool) -> Result<(), String> {
    let library = super::load_library(dir, extension)?;
    let registry = super::registry();
    let entities = super::produce(&library, &registry, name)?;
    let snapshots: Vec<EntitySnapshot> = entities.iter().map(EntitySnapshot::of).collect();

    if json {
        let out = serde_json::to_string_pretty(&snapshots)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    for (i, snapshot) in snapshots.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_snapshot(snapshot);
    }
    println!();
    println!("  {} entit{} produced", snapshots.len(), if snapshots.len() == 1 { "y" } else { "ies" });

    Ok(())
}

fn print_snapshot(snapshot: &EntitySnapshot) {
    println!("  {} {}", snapshot.name.bold(), snapshot.id[..8].dimmed());

    if !snapshot.properties.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Property", "Type", "Value"]);
        for property in &snapshot.properties {
            table.add_row(vec![
                property.name.as_str(),
                property.type_name.as_str(),
                property.value.as_str(),
            ]);
        }
        println!("{table}");
    }
    if !snapshot.components.is_empty() {
        println!("  components: {}", snapshot.components.join(", "));
    }
    if !snapshot.events.is_empty() {
        println!("  events:     {}", snapshot.events.join(", "));
    }
}
