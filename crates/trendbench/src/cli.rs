//! CLI argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use trendbench_core::services::{ColumnRef, JoinKind, QueryBuilder, SortDirection};
use trendbench_core::ApiConfig;

/// Run SQL trend templates against the trend service.
#[derive(Parser)]
#[command(name = "trendbench")]
#[command(version)]
#[command(about = "Run SQL trend templates and render their plots")]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Clone)]
pub struct GlobalOptions {
    /// Trend service base URL. Overrides TRENDBENCH_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds. Overrides TRENDBENCH_TIMEOUT_SECS.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalOptions {
    /// Environment configuration with command line overrides applied.
    pub fn api_config(&self) -> Result<ApiConfig> {
        let mut config = ApiConfig::from_env()?;
        if let Some(url) = &self.api_url {
            config = config.with_base_url(url.as_str())?;
        }
        if let Some(secs) = self.timeout {
            if secs == 0 {
                bail!("--timeout must be greater than zero");
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List trend templates.
    Trends,

    /// Show a template's SQL, parameters and plots.
    Show(TemplateArgs),

    /// Execute a template or a SQL file.
    Run(RunArgs),

    /// List the saved plots of a template.
    Plots(TemplateArgs),

    /// List tables and columns.
    Schema,

    /// List known parameter names and dropdown choices.
    Params,

    /// Build a SELECT statement checked against the schema.
    Build(BuildArgs),
}

#[derive(Args)]
pub struct TemplateArgs {
    /// Template id, or code with --code.
    pub template: String,

    /// Look the template up by code.
    #[arg(long)]
    pub code: bool,
}

#[derive(Args)]
pub struct RunArgs {
    /// Template id, or code with --code.
    pub template: Option<String>,

    /// Look the template up by code.
    #[arg(long, requires = "template")]
    pub code: bool,

    /// Parameter value.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub params: Vec<(String, String)>,

    /// Read the SQL from a file instead of the template.
    #[arg(long, value_name = "FILE")]
    pub sql: Option<PathBuf>,

    /// Print the result and chart specs as JSON.
    #[arg(long)]
    pub json: bool,

    /// Rows to print in the text table.
    #[arg(long, default_value_t = 20)]
    pub max_rows: usize,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Base table.
    #[arg(long)]
    pub table: String,

    /// Selected column, optionally aliased.
    #[arg(long = "column", value_name = "TABLE.COLUMN[:ALIAS]")]
    pub columns: Vec<String>,

    /// Join clause.
    #[arg(long = "join", value_name = "KIND:TABLE:LEFT=RIGHT")]
    pub joins: Vec<String>,

    /// Placeholder filter.
    #[arg(long = "filter", value_name = "TABLE.COLUMN=PARAM")]
    pub filters: Vec<String>,

    /// Sort key.
    #[arg(long = "order", value_name = "TABLE.COLUMN[:desc]")]
    pub order: Vec<String>,

    /// Row limit.
    #[arg(long)]
    pub limit: Option<u64>,
}

impl BuildArgs {
    /// Translate the arguments into a query builder.
    pub fn to_builder(&self) -> Result<QueryBuilder> {
        let mut builder = QueryBuilder::from(self.table.as_str());

        for column in &self.columns {
            builder = match column.split_once(':') {
                Some((column, alias)) => builder.select_as(ColumnRef::parse(column)?, alias),
                None => builder.select(ColumnRef::parse(column)?),
            };
        }

        for join in &self.joins {
            let mut parts = join.splitn(3, ':');
            let (Some(kind), Some(table), Some(condition)) = (parts.next(), parts.next(), parts.next()) else {
                bail!("Expected KIND:TABLE:LEFT=RIGHT, got '{join}'");
            };
            let kind = JoinKind::parse(kind).with_context(|| format!("Unknown join kind '{kind}'"))?;
            let (left, right) = parse_assignment(condition).map_err(anyhow::Error::msg)?;
            builder = builder.join(kind, table, ColumnRef::parse(&left)?, ColumnRef::parse(&right)?);
        }

        for filter in &self.filters {
            let (column, param) = parse_assignment(filter).map_err(anyhow::Error::msg)?;
            builder = builder.filter(ColumnRef::parse(&column)?, param.trim_start_matches(':'));
        }

        for order in &self.order {
            let (column, direction) = match order.rsplit_once(':') {
                Some((column, dir)) if dir.eq_ignore_ascii_case("desc") => (column, SortDirection::Desc),
                Some((column, dir)) if dir.eq_ignore_ascii_case("asc") => (column, SortDirection::Asc),
                _ => (order.as_str(), SortDirection::Asc),
            };
            builder = builder.order_by(ColumnRef::parse(column)?, direction);
        }

        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }
        Ok(builder)
    }
}

/// Parse `NAME=VALUE`. The value may be empty or contain further `=`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}
