//! CLI command definitions and dispatch.

use std::collections::HashMap;

use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use dynasource_core::pagination::ScanStrategy;
use dynasource_core::source::{
    item_from_json, AttributeValue, Item, QueryParams, Result, ScanParams, SourceError,
    StoreClient,
};

use crate::output::{format_envelope, format_item, format_write};
use crate::source::DataSource;

/// Paginated reads and single-item writes against DynamoDB.
#[derive(Debug, Parser)]
#[command(name = "dynasource")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Endpoint override, e.g. http://localhost:8000 for DynamoDB Local.
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// AWS region.
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// How paged scans fill a page: buffered or deficit.
    #[arg(long, env = "DYNASOURCE_SCAN_STRATEGY")]
    pub scan_strategy: Option<ScanStrategy>,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain JSON, without wire types.
    Json,
    /// DynamoDB JSON, e.g. {"S": "abc"}.
    Typed,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch one item by its key.
    Get {
        /// Table name.
        table: String,
        /// Key as a JSON object.
        key: String,
    },
    /// Write an item, replacing any item with the same key.
    Put {
        /// Table name.
        table: String,
        /// Item as a JSON object.
        item: String,
        /// Fill this attribute with a new v4 UUID.
        #[arg(long)]
        generate_key: Option<String>,
    },
    /// Apply an update expression to one item.
    Update {
        /// Table name.
        table: String,
        /// Key as a JSON object.
        key: String,
        /// Update expression, e.g. "SET status = :s".
        expression: String,
        /// Expression values as a JSON object, e.g. '{":s": "done"}'.
        #[arg(long, default_value = "{}")]
        values: String,
    },
    /// Run a query and read every page.
    Query(QueryArgs),
    /// Scan one page of a table.
    Scan(ScanArgs),
}

/// Query arguments.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Table name.
    pub table: String,
    /// Key condition expression.
    #[arg(long)]
    pub key_condition: Option<String>,
    /// Expression values as a JSON object.
    #[arg(long)]
    pub values: Option<String>,
    /// Filter expression.
    #[arg(long)]
    pub filter: Option<String>,
    /// Attribute name aliases as a JSON object, e.g. '{"#s": "status"}'.
    #[arg(long)]
    pub names: Option<String>,
    /// Secondary index name.
    #[arg(long)]
    pub index: Option<String>,
    /// Start key as a JSON object.
    #[arg(long)]
    pub start_key: Option<String>,
    /// Items per store request.
    #[arg(long)]
    pub page_size: Option<u32>,
}

/// Scan arguments.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Table name.
    pub table: String,
    /// Filter expression.
    #[arg(long)]
    pub filter: Option<String>,
    /// Filter values as a JSON object.
    #[arg(long, requires = "filter")]
    pub values: Option<String>,
    /// Attribute name aliases as a JSON object.
    #[arg(long)]
    pub names: Option<String>,
    /// Secondary index name.
    #[arg(long)]
    pub index: Option<String>,
    /// Start key as a JSON object; pass the previous LastEvaluatedKey.
    #[arg(long)]
    pub start_key: Option<String>,
    /// Items per returned page.
    #[arg(long, default_value = "10", conflicts_with = "first")]
    pub page_size: usize,
    /// Drain the scan and keep the first ten items.
    #[arg(long)]
    pub first: bool,
}

/// Runs `command` against `source` and renders the result.
pub async fn execute<C: StoreClient>(
    source: &DataSource<C>,
    command: Commands,
    format: OutputFormat,
) -> Result<String> {
    match command {
        Commands::Get { table, key } => {
            let item = source.select_one(&table, &parse_item(&key)?).await?;
            Ok(format_item(&item, format))
        }
        Commands::Put {
            table,
            item,
            generate_key,
        } => {
            let mut item = parse_item(&item)?;
            if let Some(attribute) = generate_key {
                item.insert(attribute, AttributeValue::S(Uuid::new_v4().to_string()));
            }
            source.add(&table, &item).await?;
            Ok(format_item(&item, format))
        }
        Commands::Update {
            table,
            key,
            expression,
            values,
        } => {
            let updated = source
                .update(&table, &parse_item(&key)?, &expression, &parse_item(&values)?)
                .await?;
            Ok(format_write(updated, format))
        }
        Commands::Query(args) => {
            let mut params = QueryParams {
                key_condition: args.key_condition,
                key_condition_values: args.values.as_deref().map(parse_item).transpose()?,
                filter: args.filter,
                attribute_names: args.names.as_deref().map(parse_names).transpose()?,
                index_name: args.index,
                start_key: args.start_key.as_deref().map(parse_item).transpose()?,
                page_size: None,
            };
            if let Some(page_size) = args.page_size {
                params = params.page_size(page_size);
            }

            let envelope = source.select_many(&args.table, params).await?;
            Ok(format_envelope(&envelope, format))
        }
        Commands::Scan(args) => {
            let params = ScanParams {
                filter: args.filter,
                filter_values: args.values.as_deref().map(parse_item).transpose()?,
                attribute_names: args.names.as_deref().map(parse_names).transpose()?,
                index_name: args.index,
                start_key: args.start_key.as_deref().map(parse_item).transpose()?,
            };

            let envelope = if args.first {
                source.scan_first_n(&args.table, params).await?
            } else {
                source.scan_paged(&args.table, params, args.page_size).await?
            };
            Ok(format_envelope(&envelope, format))
        }
    }
}

fn parse_item(arg: &str) -> Result<Item> {
    let value: serde_json::Value = serde_json::from_str(arg)
        .map_err(|e| SourceError::InvalidData(format!("Invalid JSON '{arg}': {e}")))?;
    item_from_json(&value)
}

fn parse_names(arg: &str) -> Result<HashMap<String, String>> {
    serde_json::from_str(arg).map_err(|e| {
        SourceError::InvalidData(format!("Attribute names must map strings to strings: {e}"))
    })
}
