//! Settings CLI commands
//!
//! Handles: shelf settings show/set/reset

use clap::Subcommand;
use serde_json::Value;
use shelf_core::Settings;

use super::{confirm, Library};

/// Settings commands
#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print the effective settings as JSON
    Show,
    /// Change one setting
    Set {
        /// Setting name (for example `max_width`)
        key: String,
        /// New value
        value: String,
    },
    /// Restore the defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Execute settings command
pub fn execute(
    cmd: SettingsCommands,
    library: &Library,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = library.paths().settings();

    match cmd {
        SettingsCommands::Show => {
            println!("{}", serde_json::to_string_pretty(library.settings())?);
        }
        SettingsCommands::Set { key, value } => {
            let settings = apply(library.settings(), &key, &value)?;
            settings.save(&path)?;
            println!("Set {key} = {value}");
        }
        SettingsCommands::Reset { force } => {
            if !confirm("Reset all settings to their defaults?", force)? {
                println!("Cancelled.");
                return Ok(());
            }
            Settings::default().save(&path)?;
            println!("Settings reset to defaults");
        }
    }

    Ok(())
}

/// Return `current` with `key` replaced by `raw`, parsed as JSON when it
/// can be and as a plain string otherwise
fn apply(current: &Settings, key: &str, raw: &str) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut value = serde_json::to_value(current)?;
    let fields = value
        .as_object_mut()
        .ok_or("Settings are not a JSON object")?;

    if !fields.contains_key(key) {
        let known: Vec<_> = fields.keys().cloned().collect();
        return Err(format!("Unknown setting '{key}'. Known settings: {}", known.join(", ")).into());
    }

    let parsed = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    fields.insert(key.to_string(), parsed);

    serde_json::from_value(value).map_err(|e| format!("Invalid value for '{key}': {e}").into())
}
