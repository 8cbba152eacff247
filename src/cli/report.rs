//! Report command implementations

use log::debug;
use tabled::Tabled;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat, ReportCommands};
use crate::client::AnalysisApi;
use crate::client::models::{Environment, display_value};
use crate::error::{Error, Result};
use crate::output::progress::Spinner;
use crate::output::{json, pretty, table};
use crate::report::{SampleReport, Summary, SummaryState};

/// Summary row for the table view
#[derive(Tabled)]
struct SummaryDisplay {
    #[tabled(rename = "ENVIRONMENT")]
    env: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "REPORT")]
    report: String,
}

/// Longest report excerpt shown in a table cell
const REPORT_CELL_WIDTH: usize = 60;

impl From<&Summary> for SummaryDisplay {
    fn from(summary: &Summary) -> Self {
        let (status, report) = match &summary.state {
            SummaryState::Pending { submission_status } => {
                (submission_status.to_string(), String::new())
            }
            SummaryState::Report { report } => ("DONE".to_string(), excerpt(report)),
        };
        Self {
            env: summary.env.clone(),
            status,
            report,
        }
    }
}

fn excerpt(report: &serde_json::Value) -> String {
    let text = report.to_string();
    if text.chars().count() <= REPORT_CELL_WIDTH {
        return text;
    }
    let cut: String = text.chars().take(REPORT_CELL_WIDTH - 3).collect();
    format!("{}...", cut)
}

#[derive(Tabled)]
struct EnvironmentDisplay {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
}

impl From<&Environment> for EnvironmentDisplay {
    fn from(env: &Environment) -> Self {
        Self {
            id: display_value(&env.id),
            name: env.name.clone(),
        }
    }
}

pub async fn run(opts: &GlobalOptions, command: ReportCommands) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    match command {
        ReportCommands::Dynamic { hash, sid } => dynamic(&ctx, &hash, sid.as_deref()).await,
        ReportCommands::Sample { hash, sid } => sample(&ctx, &hash, sid.as_deref()).await,
        ReportCommands::Environments => environments(&ctx).await,
    }
}

async fn load_summaries(
    ctx: &CommandContext,
    hash: &str,
    sid: Option<&str>,
) -> Result<Vec<Summary>> {
    let spinner = Spinner::new(
        ctx.format == OutputFormat::Pretty,
        format!("Fetching dynamic analysis of {}", hash),
    );
    let result = ctx.aggregator().load(hash, sid).await;
    spinner.finish();

    // The notifier has shown the failure already
    result.map_err(|_| Error::Reported)
}

async fn dynamic(ctx: &CommandContext, hash: &str, sid: Option<&str>) -> Result<()> {
    let summaries = load_summaries(ctx, hash, sid).await?;
    debug!(
        "{} summaries for {}, {} pending",
        summaries.len(),
        hash,
        summaries.iter().filter(|s| s.is_pending()).count()
    );

    match ctx.format {
        OutputFormat::Pretty => print!("{}", pretty::format_summaries(hash, &summaries)),
        OutputFormat::Table => {
            let rows: Vec<SummaryDisplay> = summaries.iter().map(SummaryDisplay::from).collect();
            println!("{}", table::format_table(&rows));
        }
        OutputFormat::Json => println!("{}", json::format_json(&summaries)?),
    }

    Ok(())
}

async fn sample(ctx: &CommandContext, hash: &str, sid: Option<&str>) -> Result<()> {
    let spinner = Spinner::new(
        ctx.format == OutputFormat::Pretty,
        format!("Fetching reports of {}", hash),
    );
    let report = SampleReport::fetch(ctx.client.clone(), hash, ctx.notifier.as_ref()).await;
    spinner.finish();

    // A failed dynamic section leaves the other sections in place
    let summaries = match sid {
        Some(sid) => load_summaries(ctx, hash, Some(sid)).await.ok(),
        None => None,
    };

    if report.is_empty() && summaries.is_none() {
        return Err(Error::Reported);
    }

    match ctx.format {
        OutputFormat::Json => {
            let data = serde_json::json!({
                "sample": report,
                "dynamic": summaries,
            });
            println!("{}", json::format_json(&data)?);
        }
        OutputFormat::Pretty | OutputFormat::Table => {
            print!("{}", pretty::format_sample(&report));
            if let Some(summaries) = summaries {
                println!();
                print!("{}", pretty::format_summaries(hash, &summaries));
            }
        }
    }

    Ok(())
}

async fn environments(ctx: &CommandContext) -> Result<()> {
    let environments = ctx.client.list_environments().await?;

    match ctx.format {
        OutputFormat::Pretty => print!("{}", pretty::format_environments(&environments)),
        OutputFormat::Table => {
            let rows: Vec<EnvironmentDisplay> =
                environments.iter().map(EnvironmentDisplay::from).collect();
            println!("{}", table::format_table(&rows));
        }
        OutputFormat::Json => println!("{}", json::format_json(&environments)?),
    }

    Ok(())
}
