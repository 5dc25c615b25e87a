use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use mosaic_core::{PropertyContainer, Vector3};
use mosaic_host::{AssetDirectory, DrawLog, Host, HostConfig};

/// Flags of `mosaic run`.
pub struct RunOptions {
    /// Number of ticks to run.
    pub ticks: u64,
    /// Seconds per tick.
    pub dt: f32,
    /// Host configuration file (JSON).
    pub config: Option<PathBuf>,
    /// Print the run statistics as JSON.
    pub json: bool,
}

fn read_config(path: Option<&Path>) -> Result<HostConfig, String> {
    let Some(path) = path else {
        return Ok(HostConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid host config {}: {e}", path.display()))
}

/// Assets resolve relative to the definition directory.
pub fn run(dir: &Path, extension: &str, name: &str, options: RunOptions) -> Result<(), String> {
    let library = super::load_library(dir, extension)?;
    let config = read_config(options.config.as_deref())?;

    let mut registry = super::registry();
    let draw_log = DrawLog::new();
    let mut host = Host::new(
        &mut registry,
        config,
        Box::new(draw_log.clone()),
        Box::new(AssetDirectory::new(dir)),
    )
    .map_err(|e| e.to_string())?;

    let entities = super::produce(&library, &registry, name)?;
    let stats = host
        .run(options.ticks, options.dt)
        .map_err(|e| e.to_string())?;

    if options.json {
        let out = serde_json::to_string_pretty(&stats)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "  {} '{}' {}",
        "Run".bold(),
        name,
        format!("({} ticks, dt={}s)", stats.ticks, options.dt).dimmed()
    );
    println!(
        "  {} entities, {} updates, {} frames, {} sprites drawn, {} loads",
        entities.len(),
        stats.updates,
        stats.frames,
        stats.sprites,
        stats.loads
    );

    let positioned: Vec<_> = entities
        .iter()
        .filter_map(|e| e.get_property::<Vector3>("Position").map(|p| (e.name(), p.get())))
        .collect();
    if !positioned.is_empty() {
        println!();
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Entity", "Position"]);
        for (entity, position) in &positioned {
            table.add_row(vec![entity.to_string(), position.to_string()]);
        }
        println!("{table}");
    }

    Ok(())
}
