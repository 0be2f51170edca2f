//! Schedule event management commands for CLI.

use clap::Subcommand;
use sitegrid_core::timeline::dates::parse_timestamp;
use sitegrid_core::{EventDb, Priority, ScheduleEvent};
use std::io::Read;
use std::path::Path;

#[derive(Subcommand)]
pub enum EventAction {
    /// Add a scheduled event
    Add {
        /// Event title
        title: String,
        /// Start as YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339
        #[arg(long)]
        start: String,
        /// End (defaults to start)
        #[arg(long)]
        end: Option<String>,
        /// Project ID to group under
        #[arg(long)]
        project_id: Option<String>,
        /// Project display name
        #[arg(long)]
        project: Option<String>,
        /// low, medium or high (default: medium)
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Event description
        #[arg(long)]
        description: Option<String>,
        /// Site or job location
        #[arg(long)]
        location: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Explicit event ID (default: random UUID)
        #[arg(long)]
        id: Option<String>,
    },
    /// List events
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get event details
    Show {
        /// Event ID
        id: String,
    },
    /// Delete an event
    Remove {
        /// Event ID
        id: String,
    },
    /// Import events from a JSON array file ("-" for stdin)
    Import {
        path: String,
    },
    /// Export all events as a JSON array
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
}

fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = EventDb::open()?;

    match action {
        EventAction::Add {
            title,
            start,
            end,
            project_id,
            project,
            priority,
            description,
            location,
            tags,
            id,
        } => {
            let start_date = parse_timestamp(&start)?;
            let end_date = match end {
                Some(end) => parse_timestamp(&end)?,
                None => start_date,
            };
            let priority: Priority = priority.parse()?;

            let event = ScheduleEvent {
                id: id.unwrap_or_else(ScheduleEvent::generate_id),
                title,
                description,
                start_date,
                end_date,
                project_id,
                project_name: project,
                priority,
                location,
                tags: parse_tags(tags),
            };
            if event.end_date < event.start_date {
                eprintln!("warning: end is before start; the timeline will show one day");
            }
            db.insert_event(&event)?;
            println!("Event created: {}", event.id);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EventAction::List { json } => {
            let events = db.list_events()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("No events.");
            } else {
                for event in &events {
                    println!(
                        "{:<36}  {}  {}  {:<6}  {:<20}  {}",
                        event.id,
                        event.start_day(),
                        event.end_day(),
                        event.priority,
                        event.project_label().unwrap_or("-"),
                        event.title
                    );
                }
            }
        }
        EventAction::Show { id } => match db.get_event(&id)? {
            Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
            None => return Err(format!("event not found: {id}").into()),
        },
        EventAction::Remove { id } => {
            if db.delete_event(&id)? {
                println!("Event removed: {id}");
            } else {
                return Err(format!("event not found: {id}").into());
            }
        }
        EventAction::Import { path } => {
            let count = if path == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                db.import_json(&buf)?
            } else {
                db.import_file(Path::new(&path))?
            };
            println!("Imported {count} event(s)");
        }
        EventAction::Export { output } => match output {
            Some(path) => {
                let count = db.export_file(Path::new(&path))?;
                println!("Exported {count} event(s) to {path}");
            }
            None => println!("{}", db.export_json()?),
        },
    }
    Ok(())
}
