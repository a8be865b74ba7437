use aggview::engine::ValidationError;
use aggview::engine::grid::{GridInputs, GridSession, GridSettings, GridStatus};
use aggview::engine::pipeline::{AggregationSpec, PipelineEditor};
use aggview::engine::query::{AggregationRequestBuilder, GridQuery, parse_sort};
use aggview::engine::schema::catalog::{IntrospectionEnvelope, TypeCatalog};
use aggview::engine::schema::{ResourceMeta, resolve_source_fields};
use aggview::frontend::GraphqlClient;
use aggview::logging;
use aggview::shared::config::CONFIG;
use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "aggview")]
#[command(about = "Inspect, validate and run aggregation pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the fields available at every stage and the stage diagnostics
    Fields {
        #[command(flatten)]
        schema: SchemaArgs,
    },
    /// Run save-time validation on a spec
    Validate {
        /// Aggregation spec (JSON)
        #[arg(long)]
        spec: PathBuf,
        /// Widget type the mapping is checked against
        #[arg(long, default_value = "bar")]
        widget: String,
    },
    /// Print the wire request the grid would send
    Request {
        #[command(flatten)]
        schema: SchemaArgs,
        #[command(flatten)]
        grid: GridArgs,
    },
    /// Load one page from the configured backend
    Fetch {
        /// Aggregation spec (JSON)
        #[arg(long)]
        spec: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args)]
struct SchemaArgs {
    /// Introspection result (`__schema` envelope, optionally wrapped in `data`)
    #[arg(long)]
    catalog: PathBuf,
    /// Resource type name
    #[arg(long)]
    resource: String,
    /// Root query serving the resource's records
    #[arg(long)]
    query: String,
    /// Aggregation spec (JSON)
    #[arg(long)]
    spec: PathBuf,
}

#[derive(Args)]
struct GridArgs {
    #[arg(long)]
    page_size: Option<usize>,
    #[arg(long, default_value = "0")]
    skip: usize,
    /// Sort as `field:asc|desc`
    #[arg(long)]
    sort: Option<String>,
    /// Context filter tree (JSON)
    #[arg(long)]
    context: Option<String>,
    /// Dashboard filter values used for `{{filter.*}}` placeholders (JSON)
    #[arg(long)]
    dashboard: Option<String>,
    /// Time-travel point: timestamp, date or version token
    #[arg(long)]
    as_of: Option<String>,
}

impl GridArgs {
    fn query(&self, spec: &AggregationSpec) -> anyhow::Result<GridQuery> {
        Ok(GridQuery {
            data_source_id: spec.data_source_id.clone(),
            aggregation_id: spec.id.clone().unwrap_or_default(),
            page_size: self.page_size.unwrap_or(CONFIG.grid.page_size),
            skip: self.skip,
            sort: self.sort.as_deref().map(parse_sort).transpose()?.into_iter().collect(),
            context_filters: self
                .context
                .as_deref()
                .map(|raw| {
                    serde_json::from_str(raw)
                        .map_err(|e| ValidationError::InvalidContextFilters(e.to_string()))
                })
                .transpose()?,
            as_of: self.as_of.clone(),
        })
    }

    fn dashboard(&self) -> anyhow::Result<Value> {
        Ok(parse_json_arg("dashboard", self.dashboard.as_deref())?.unwrap_or(Value::Null))
    }
}

fn parse_json_arg(name: &str, raw: Option<&str>) -> anyhow::Result<Option<Value>> {
    raw.map(|s| serde_json::from_str(s).with_context(|| format!("--{} is not valid JSON", name)))
        .transpose()
}

fn read_spec(path: &Path) -> anyhow::Result<AggregationSpec> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid spec {}", path.display()))
}

fn read_catalog(path: &Path) -> anyhow::Result<TypeCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let mut value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid catalog {}", path.display()))?;
    if let Some(data) = value.get_mut("data") {
        value = data.take();
    }
    let envelope: IntrospectionEnvelope =
        serde_json::from_value(value).context("Catalog is not an introspection result")?;
    Ok(TypeCatalog::from(envelope.schema).with_max_depth(CONFIG.schema.max_depth))
}

/// Resolves the aggregation's source fields and opens an editor over its pipeline.
fn open_editor(args: &SchemaArgs) -> anyhow::Result<(AggregationSpec, PipelineEditor)> {
    let spec = read_spec(&args.spec)?;
    let catalog = read_catalog(&args.catalog)?;
    let resource = ResourceMeta {
        id: spec.data_source_id.clone(),
        name: args.resource.clone(),
        query_name: Some(args.query.clone()),
    };
    let fields = resolve_source_fields(&catalog, &resource, &spec.source_fields)?;
    let editor = PipelineEditor::new(fields, spec.pipeline.clone());
    Ok((spec, editor))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_fields(args: &SchemaArgs) -> anyhow::Result<()> {
    let (_, editor) = open_editor(args)?;
    let diagnostics: Vec<Value> = editor
        .diagnostics()
        .iter()
        .map(|d| {
            json!({
                "stage": d.stage,
                "severity": if d.issue.is_blocking() { "error" } else { "warning" },
                "message": d.issue.to_string(),
            })
        })
        .collect();
    let field_issues: Vec<String> = editor.field_issues().iter().map(ToString::to_string).collect();
    print_json(&json!({
        "fieldsPerStage": editor.fields_per_stage(),
        "output": editor.output_fields(),
        "unchecked": editor.output().unchecked,
        "fieldIssues": field_issues,
        "diagnostics": diagnostics,
    }))
}

fn run_validate(spec: &Path, widget: &str) -> anyhow::Result<()> {
    let spec = read_spec(spec)?;
    match spec.validate(widget) {
        Ok(()) => {
            println!("ok");
            Ok(())
        }
        Err(issues) => bail!("{}", issues),
    }
}

fn run_request(schema: &SchemaArgs, grid: &GridArgs) -> anyhow::Result<()> {
    let (spec, editor) = open_editor(schema)?;
    if let Some(e) = editor.field_issues().first() {
        bail!("{}", e);
    }
    if let Some(d) = editor.diagnostics().iter().find(|d| d.issue.is_blocking()) {
        bail!("stage {}: {}", d.stage, d.issue);
    }
    let request = AggregationRequestBuilder::new(&spec, editor.output_fields())
        .with_dashboard_values(grid.dashboard()?)
        .build(&grid.query(&spec)?)?;
    print_json(&request)
}

async fn run_fetch(spec: &Path, grid: &GridArgs) -> anyhow::Result<()> {
    let spec = read_spec(spec)?;
    let query = grid.query(&spec)?;
    let client = Arc::new(GraphqlClient::from_config(&CONFIG)?);
    let mut settings = GridSettings::from(&CONFIG.grid);
    settings.page_size = query.page_size;
    // one-shot run, nothing to debounce
    settings.context_debounce = Duration::ZERO;

    let mut session = GridSession::new(Arc::clone(&client), settings);
    session.set_inputs(GridInputs {
        data_source_id: spec.data_source_id.clone(),
        aggregation: spec,
        context_filters: query.context_filters.clone(),
        as_of: query.as_of.clone(),
    })?;
    session.set_dashboard_filter(grid.dashboard()?)?;
    session.load_columns(client.as_ref()).await?;
    if !query.sort.is_empty() {
        session.sort(query.sort.clone())?;
    }
    if query.skip > 0 {
        session.page(query.skip, query.page_size)?;
    }
    session.settle().await;

    let state = session.grid().state();
    if state.status == GridStatus::Error {
        bail!("{}", state.error.as_deref().unwrap_or("Request failed"));
    }
    print_json(&json!({
        "columns": session.grid().columns(),
        "items": state.items,
        "totalCount": state.total_count,
        "skip": state.skip,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init()?;
    info!(target: "aggview::cli", "aggview starting");

    match &cli.command {
        Command::Fields { schema } => run_fields(schema),
        Command::Validate { spec, widget } => run_validate(spec, widget),
        Command::Request { schema, grid } => run_request(schema, grid),
        Command::Fetch { spec, grid } => run_fetch(spec, grid).await,
    }
}
