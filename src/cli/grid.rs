//! Grid command implementations
//!
//! Every verb works on the same engine the interactive grid uses: load the
//! collection, locate the row, mutate it, save. Failures have already been
//! shown by the notifier when they come back from the engine.

use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use log::debug;
use tabled::Tabled;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat, RecordCommands};
use crate::client::PortalClient;
use crate::client::models::{Record, RecordId, display_value, parse_field_value};
use crate::error::{Error, GridError, Result};
use crate::grid::{CrudGridEngine, ItemKey};
use crate::output::{json, pretty, table};

/// One field of a record for the table view
#[derive(Tabled)]
struct FieldDisplay {
    #[tabled(rename = "FIELD")]
    field: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

/// Dispatch a record command against `endpoint`.
pub async fn run(opts: &GlobalOptions, endpoint: &str, action: RecordCommands) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    debug!("Running {:?} on {}", action, endpoint);

    match action {
        RecordCommands::List { exclude } => list(&ctx, endpoint, &exclude).await,
        RecordCommands::Get { id } => get(&ctx, endpoint, &id).await,
        RecordCommands::Set { id, fields } => set(&ctx, endpoint, &id, &fields).await,
        RecordCommands::Add { fields } => add(&ctx, endpoint, &fields).await,
        RecordCommands::Delete { id, yes } => delete(&ctx, endpoint, &id, yes).await,
    }
}

/// Errors the engine already reported must not be printed twice.
fn reported(err: Error) -> Error {
    match err {
        Error::Api(_) => Error::Reported,
        other => other,
    }
}

async fn list(ctx: &CommandContext, endpoint: &str, exclude: &[String]) -> Result<()> {
    let engine = ctx.grid(endpoint, exclude);
    engine.load().await.map_err(reported)?;
    let view = engine.view().await;

    match ctx.format {
        OutputFormat::Pretty | OutputFormat::Table => {
            println!("{}", table::format_grid(&view, &engine.options().id_field));
        }
        OutputFormat::Json => {
            let records: Vec<&Record> = view.items.iter().map(|i| &i.record).collect();
            println!("{}", json::format_json(&records)?);
        }
    }

    Ok(())
}

async fn get(ctx: &CommandContext, endpoint: &str, id: &str) -> Result<()> {
    let record = ctx.resource(endpoint).get(&RecordId::new(id)).await?;
    print_record(ctx.format, &record)
}

async fn set(
    ctx: &CommandContext,
    endpoint: &str,
    id: &str,
    fields: &[(String, String)],
) -> Result<()> {
    let engine = ctx.grid(endpoint, &[]);
    engine.load().await.map_err(reported)?;

    let key = engine
        .find_by_id(&RecordId::new(id))
        .await
        .ok_or_else(|| GridError::UnknownItem(format!("{}/{}", endpoint, id)))?;

    engine.toggle_edit_mode(key).await?;
    save(ctx, &engine, key, fields).await
}

async fn add(ctx: &CommandContext, endpoint: &str, fields: &[(String, String)]) -> Result<()> {
    let engine = ctx.grid(endpoint, &[]);
    engine.load().await.map_err(reported)?;

    let key = engine.toggle_add().await;
    save(ctx, &engine, key, fields).await
}

/// Write the assignments into a row in edit mode and save it.
async fn save(
    ctx: &CommandContext,
    engine: &CrudGridEngine<PortalClient>,
    key: ItemKey,
    fields: &[(String, String)],
) -> Result<()> {
    for (field, raw) in fields {
        engine.set_field(key, field, parse_field_value(raw)).await?;
    }

    engine.update_item(key).await.map_err(reported)?;

    match engine.item(key).await {
        Some(item) => print_record(ctx.format, &item.record),
        None => Ok(()),
    }
}

async fn delete(ctx: &CommandContext, endpoint: &str, id: &str, yes: bool) -> Result<()> {
    let engine = ctx.grid(endpoint, &[]);
    engine.load().await.map_err(reported)?;

    let key = engine
        .find_by_id(&RecordId::new(id))
        .await
        .ok_or_else(|| GridError::UnknownItem(format!("{}/{}", endpoint, id)))?;

    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Delete {} from {}?", id.bold(), endpoint))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    engine.delete_item(key).await.map_err(reported)
}

fn print_record(format: OutputFormat, record: &Record) -> Result<()> {
    match format {
        OutputFormat::Pretty => print!("{}", pretty::format_record(record)),
        OutputFormat::Table => {
            let rows: Vec<FieldDisplay> = record
                .iter()
                .map(|(field, value)| FieldDisplay {
                    field: field.clone(),
                    value: display_value(value),
                })
                .collect();
            println!("{}", table::format_table(&rows));
        }
        OutputFormat::Json => println!("{}", json::format_json(record)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_reported_only_masks_api_errors() {
        assert!(matches!(
            reported(ApiError::NotFound("x".to_string()).into()),
            Error::Reported
        ));
        assert!(matches!(
            reported(GridError::NotEditing.into()),
            Error::Grid(GridError::NotEditing)
        ));
    }
}
