//! Configuration commands for CLI.
//!
//! Keys are dot paths into `config.toml`:
//!
//! ```text
//! timeline.default_duration_days   7 | 14 | 30 | 90
//! timeline.week_starts_monday      true | false
//! timeline.overlap_policy          start_within_window | any_overlap
//! render.chart_width               columns available to the bars
//! render.label_width               columns for project/event labels
//! render.color                     true | false
//! render.show_weekends             true | false
//! priority_colors.low|medium|high  #rrggbb
//! ```

use clap::Subcommand;
use sitegrid_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, or a whole section (e.g. "render") as JSON
    Get {
        /// Dot-separated key, e.g. "timeline.default_duration_days"
        key: String,
    },
    /// Set a value; the whole config is re-validated before saving
    Set {
        /// Dot-separated key, e.g. "render.color"
        key: String,
        /// New value (durations must be 7, 14, 30 or 90)
        value: String,
    },
    /// List every key as `key = value`
    List {
        /// Output the config as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Reset config to defaults
    Reset,
}

/// Flatten nested sections into `(dot.path, value)` pairs, sorted by key.
fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (name, child) in map {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten(&key, child, out);
            }
        }
        serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            tracing::info!(%key, %value, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { json } => {
            let config = serde_json::to_value(Config::load()?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let mut entries = Vec::new();
                flatten("", &config, &mut entries);
                for (key, value) in entries {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
