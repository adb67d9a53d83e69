//! Event log inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use possync_core::config::AppConfig;
use possync_core::error::AppError;
use possync_entity::{Event, EventPayload};
use possync_worker::handlers::HandlerRegistry;
use possync_worker::Worker;

/// Arguments for event commands
#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Events subcommand
    #[command(subcommand)]
    pub command: EventsCommand,
}

/// Event subcommands
#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// Events the worker would pick up on its next tick
    Pending,
}

/// Pending event row
#[derive(Debug, Serialize, Tabled)]
struct EventRow {
    #[tabled(rename = "Event ID")]
    id: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Handled")]
    handled: bool,
}

impl EventRow {
    fn new(event: &Event, registry: &HandlerRegistry) -> Self {
        let subject = match &event.payload {
            EventPayload::DocumentPosted(p) => format!("document {}", p.document_id),
            EventPayload::StockChanged(p) => match p.new_quantity {
                Some(quantity) => format!("product {} -> {}", p.product_id, quantity),
                None => format!("product {}", p.product_id),
            },
            EventPayload::ProductUpdated(p) => format!("product {}", p.product_id),
            EventPayload::Untyped | EventPayload::Unknown => "-".to_string(),
        };

        Self {
            id: event.id.clone(),
            event_type: event.event_type.clone(),
            subject,
            handled: registry.has_handler(&event.event_type),
        }
    }
}

/// Execute event commands
pub async fn execute(
    args: &EventsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        EventsCommand::Pending => {
            let pending = pending_events(config).await;

            match format {
                OutputFormat::Json => {
                    let raw: Vec<&serde_json::Value> = pending.iter().map(|e| &e.raw).collect();
                    output::print_json(&raw);
                }
                OutputFormat::Table => {
                    let registry = HandlerRegistry::from_routing(&config.routing);
                    let rows: Vec<EventRow> =
                        pending.iter().map(|e| EventRow::new(e, &registry)).collect();
                    output::print_list(&rows, format);
                }
            }
        }
    }

    Ok(())
}

/// Events the next tick would handle. Reads the log and state only; no tick
/// is run.
async fn pending_events(config: &AppConfig) -> Vec<Event> {
    let mut worker = Worker::from_config(config);
    worker.load_state().await;
    worker.unprocessed_events().await
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::commands::testing::config_in;

    #[tokio::test]
    async fn test_pending_skips_processed_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let mut log = [
            r#"{"id":"e1","type":"STOCK_CHANGED","product_id":"p1","new_quantity":5}"#,
            "garbage",
            r#"{"id":"e2","type":"STOCK_CHANGED","product_id":"p2","new_quantity":"7"}"#,
            r#"{"id":"e3","type":"SHIFT_CLOSED"}"#,
        ]
        .join("\n")
        .into_bytes();
        log.extend_from_slice(b"\n\xff\n");
        std::fs::write(&config.paths.events_log, log).unwrap();
        std::fs::write(&config.paths.state_file, r#"{"processedEventIds":["e1"]}"#).unwrap();

        let pending = pending_events(&config).await;
        let ids: Vec<&str> = pending.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e2", "e3"]);

        let registry = HandlerRegistry::from_routing(&config.routing);
        let rows: Vec<EventRow> = pending.iter().map(|e| EventRow::new(e, &registry)).collect();
        assert_eq!(rows[0].subject, "product p2 -> 7");
        assert!(rows[0].handled);
        assert_eq!(rows[1].subject, "-");
        assert!(!rows[1].handled);

        let args = EventsArgs {
            command: EventsCommand::Pending,
        };
        execute(&args, &config, OutputFormat::Table).await.unwrap();
        execute(&args, &config, OutputFormat::Json).await.unwrap();
    }
}
