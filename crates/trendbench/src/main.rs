//! Trendbench - run SQL trend templates and render their plots from the command line.

mod cli;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;
use trendbench_core::logging::{init_logging, log_dir, LogConfig};
use trendbench_core::{HttpTrendApi, Outcome, TemplateId, TrendError, TrendTemplate, Workbench};

use cli::{Cli, Commands, RunArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::new(log_dir());
    if cli.global.verbose {
        log_config = log_config.with_filter("debug");
    }
    let _logging_guard = init_logging(log_config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Trendbench");

    // The logging guard must outlive the failure report
    finish(run(cli).await)
}

fn finish(outcome: Result<()>) -> ExitCode {
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "Command failed");
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.global.api_config()?;
    let api = HttpTrendApi::new(config)?;
    let workbench = Workbench::new(Arc::new(api));

    match cli.command {
        Commands::Trends => {
            let trends = workbench.load_trends().await?;
            print!("{}", output::trends(&trends));
        }
        Commands::Show(args) => {
            refresh_options(&workbench).await;
            let template = select(&workbench, &args.template, args.code).await?;
            print!("{}", output::template(&template, &workbench.parameters()));
            print!("\n{}", output::plots(&workbench.plots()));
        }
        Commands::Plots(args) => {
            select(&workbench, &args.template, args.code).await?;
            print!("{}", output::plots(&workbench.plots()));
        }
        Commands::Run(args) => execute(&workbench, args).await?,
        Commands::Schema => {
            let schema = workbench.load_schema().await?;
            print!("{}", output::schema(&schema));
        }
        Commands::Params => {
            let names = workbench.api().trend_params().await?;
            let options = workbench.refresh_dropdown_options().await?;
            print!("{}", output::params(&names, &options));
        }
        Commands::Build(args) => {
            workbench.load_schema().await?;
            let sql = workbench.apply_query(&args.to_builder()?)?;
            println!("{sql}");
            let names = workbench.parameters().required_names();
            if !names.is_empty() {
                eprintln!("Parameters: {}", names.join(", "));
            }
        }
    }
    Ok(())
}

async fn execute(workbench: &Workbench, args: RunArgs) -> Result<()> {
    if args.template.is_none() && args.sql.is_none() {
        bail!("Give a template or --sql FILE");
    }

    refresh_options(workbench).await;
    if let Some(template) = &args.template {
        select(workbench, template, args.code).await?;
    }
    if let Some(path) = &args.sql {
        let sql = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        workbench.set_sql_text(sql);
    }
    for (name, value) in &args.params {
        workbench.set_parameter_input(name, value.as_str())?;
    }

    let result = match workbench.execute().await? {
        Outcome::Applied(result) => result,
        Outcome::Superseded => bail!("Execution was superseded"),
    };
    let plots = workbench.plots();
    let charts = workbench.charts();

    if args.json {
        let body = json!({ "result": &*result, "charts": charts });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", output::table(&result, args.max_rows));
        if !plots.is_empty() {
            print!("\n{}", output::charts(&plots, &charts));
        }
    }
    Ok(())
}

async fn select(workbench: &Workbench, template: &str, by_code: bool) -> Result<TrendTemplate> {
    let outcome = if by_code {
        workbench.select_template_by_code(template).await?
    } else {
        workbench.select_template(&TemplateId::new(template)).await?
    };
    if let Some(warning) = workbench.last_error() {
        eprintln!("Warning: {warning}");
    }
    outcome.applied().context("Template selection was superseded")
}

/// Dropdown choices only decorate the parameter list; failing to load them is not fatal.
async fn refresh_options(workbench: &Workbench) {
    if let Err(e) = workbench.refresh_dropdown_options().await {
        tracing::warn!(error = %e, "Continuing without dropdown options");
    }
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<TrendError>() {
        Some(e) => {
            let info = e.to_error_info();
            eprintln!("{}: {}", info.error_type, info.message);
            if let Some(detail) = info.technical_detail {
                eprintln!("  {detail}");
            }
            if let Some(hint) = info.hint {
                eprintln!("  Hint: {hint}");
            }
        }
        None => eprintln!("Error: {error:#}"),
    }
}
