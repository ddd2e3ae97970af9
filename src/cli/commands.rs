//! CLI command implementations
//!
//! Each command loads its inputs, runs, and writes exactly one JSON
//! response. Commands never print anything else to stdout; logs go through
//! the structured logger.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{json, Value};

use crate::eval::{Dataset, Evaluator};
use crate::expr::Query;
use crate::filter::{CompileContext, CompilerConfig, FilterCompiler, Predicate};
use crate::schema::{SchemaLoader, SchemaRegistry};

use super::args::{Command, FilterArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_json, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile { filter } => compile(&filter),
        Command::Query { filter, data } => query(&filter, &data),
        Command::Check { schema } => check(&schema),
    }
}

/// Compile a predicate and print `{"sql", "params"}`
pub fn compile(args: &FilterArgs) -> CliResult<()> {
    let query = build_filtered_query(args)?;
    write_response(compiled_output(&query))
}

/// Compile a predicate and print the matching dataset rows
pub fn query(args: &FilterArgs, data: &Path) -> CliResult<()> {
    let query = build_filtered_query(args)?;
    let dataset = Dataset::load(data)?;
    let rows = Evaluator::new(&dataset).select(&query)?;

    write_response(json!({
        "sql": compiled_output(&query)["sql"],
        "count": rows.len(),
        "rows": rows,
    }))
}

/// Load and validate schema files, printing the entities found
pub fn check(schema: &Path) -> CliResult<()> {
    let registry = load_registry(schema)?;
    let entities: Vec<Value> = registry
        .iter()
        .map(|d| {
            json!({
                "name": d.name(),
                "source": d.source(),
                "fields": d.fields().count(),
                "virtual_fields": d.virtual_fields().count(),
                "associations": d.associations().count(),
            })
        })
        .collect();

    write_response(json!({"valid": true, "entities": entities}))
}

fn compiled_output(query: &Query) -> Value {
    let sql = query.to_sql();
    json!({"sql": sql.sql, "params": sql.params})
}

fn build_filtered_query(args: &FilterArgs) -> CliResult<Query> {
    let config = load_config(args.config.as_deref())?;
    let registry = load_registry(&args.schema)?;
    let schema = registry
        .entity(&args.entity)
        .ok_or_else(|| CliError::unknown_entity(&args.entity))?;

    let predicate = Predicate::from_json(&read_json(&args.predicate)?)
        .map_err(|e| CliError::filter(&e, args.verbose_errors))?;
    let ctx = load_context(args.context.as_deref())?;

    FilterCompiler::with_config(&registry, config)
        .build_query(Query::from_schema(schema), &predicate, &ctx)
        .map_err(|e| CliError::filter(&e, args.verbose_errors))
}

fn load_config(path: Option<&Path>) -> CliResult<CompilerConfig> {
    let config = match path {
        Some(path) => CompilerConfig::load(path)?,
        None => CompilerConfig::default(),
    };
    config.apply_logging();
    Ok(config)
}

fn load_registry(path: &Path) -> CliResult<SchemaRegistry> {
    let mut loader = SchemaLoader::new();
    loader.load_path(path)?;
    Ok(loader.finish()?)
}

fn load_context(path: Option<&Path>) -> CliResult<CompileContext> {
    let Some(path) = path else {
        return Ok(CompileContext::new());
    };
    let values: BTreeMap<String, Value> = serde_json::from_value(read_json(path)?)?;
    Ok(CompileContext::from_map(values))
}
