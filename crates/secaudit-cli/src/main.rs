//! `secaudit` operator CLI
//!
//! Offline inspection of taxonomy exports: category catalog, record schemas,
//! new-record templates, ordered listings and questionnaire bootstrap.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use secaudit_core::{AuditConfig, AuditSessionManager, CategoryCatalog, MemoryStore};
use secaudit_model::{CollectionKind, Identity, Record};
use secaudit_schema::{FieldKind, SchemaRegistry};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn build_cli() -> Command {
    let records_arg = Arg::new("records")
        .long("records")
        .value_parser(value_parser!(PathBuf))
        .help("JSON file holding an array of records");
    let collection_arg = Arg::new("collection")
        .required(true)
        .help("Collection name (Activos, Amenazas, Vulnerabilidades, Salvaguardas, Relaciones)");

    Command::new("secaudit")
        .version(secaudit_core::VERSION)
        .about("Security audit intake: questionnaire and taxonomy inspection")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("categories")
                .about("Show questionnaire categories derived from asset records")
                .arg(records_arg.clone().long("assets").id("assets").required(true)),
        )
        .subcommand(
            Command::new("schema")
                .about("Show the field layout of a collection")
                .arg(collection_arg.clone()),
        )
        .subcommand(
            Command::new("template")
                .about("Print a blank record with the next sequential id assigned")
                .arg(collection_arg.clone())
                .arg(records_arg.clone()),
        )
        .subcommand(
            Command::new("list")
                .about("List records in display order")
                .arg(collection_arg)
                .arg(records_arg.clone().required(true)),
        )
        .subcommand(
            Command::new("questionnaire")
                .about("Bootstrap a questionnaire draft for a respondent")
                .arg(records_arg.long("assets").id("assets").required(true))
                .arg(
                    Arg::new("owner")
                        .long("owner")
                        .default_value("cli")
                        .help("Respondent identity id"),
                )
                .arg(Arg::new("company").long("company").help("Respondent organization")),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_records(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&text)
        .with_context(|| format!("parsing records from {}", path.display()))?;
    tracing::debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn load_config(matches: &ArgMatches) -> Result<AuditConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => Ok(AuditConfig::load(path)?),
        None => Ok(AuditConfig::default()),
    }
}

fn collection(args: &ArgMatches) -> Result<CollectionKind> {
    let Some(name) = args.get_one::<String>("collection") else {
        bail!("missing collection");
    };
    Ok(name.parse()?)
}

fn catalog_json(catalog: &CategoryCatalog) -> Value {
    let categories: Vec<Value> = catalog
        .categories()
        .iter()
        .map(|category| {
            let names: Vec<Value> = catalog
                .names(category)
                .into_iter()
                .map(|n| json!({ "nombre": n.name, "proveedor": n.provider }))
                .collect();
            json!({
                "categoria": category,
                "pide_proveedor": catalog.asks_provider(category),
                "nombres": names,
                "proveedores": catalog.providers(category),
            })
        })
        .collect();
    Value::Array(categories)
}

fn schema_json(registry: &SchemaRegistry, kind: CollectionKind) -> Result<Value> {
    let schema = registry.get(kind)?;
    let fields: Vec<Value> = schema
        .fields
        .iter()
        .map(|f| {
            let kind = match &f.kind {
                FieldKind::Scalar(_) => "scalar".to_string(),
                FieldKind::Composite(parts) => format!(
                    "composite({})",
                    parts.iter().map(|p| p.key.as_str()).collect::<Vec<_>>().join(", ")
                ),
                FieldKind::FixedSlots { slots, .. } => format!("slots({slots})"),
                FieldKind::Reference { target } => format!("reference({target})"),
                FieldKind::SequentialId => "sequential_id".to_string(),
            };
            json!({ "name": f.name, "kind": kind, "required": f.required })
        })
        .collect();
    Ok(json!({ "collection": kind.name(), "fields": fields }))
}

async fn questionnaire(config: AuditConfig, assets: Vec<Record>, identity: &Identity) -> Result<Value> {
    let store = Arc::new(MemoryStore::new().with_records(CollectionKind::Assets, assets));
    let manager =
        AuditSessionManager::new(store.clone(), store).with_config(config.questionnaire);
    let session = manager.open(identity).await?;
    let progress = session.draft().progress();
    Ok(json!({
        "audit": session.audit_id().map(ToString::to_string),
        "state": session.state().map(|s| s.to_string()),
        "answered": progress.answered,
        "total": progress.total,
        "answers": serde_json::to_value(session.draft().answers())?,
    }))
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(&matches)?;
    let registry = SchemaRegistry::with_defaults();

    let output = match matches.subcommand() {
        Some(("categories", args)) => {
            let path = args.get_one::<PathBuf>("assets").context("missing --assets")?;
            let assets = load_records(path)?;
            catalog_json(&CategoryCatalog::from_assets(&assets, &config.questionnaire))
        }
        Some(("schema", args)) => schema_json(&registry, collection(args)?)?,
        Some(("template", args)) => {
            let kind = collection(args)?;
            let existing = match args.get_one::<PathBuf>("records") {
                Some(path) => load_records(path)?,
                None => Vec::new(),
            };
            let form = registry.new_record_template(kind, &existing)?;
            Value::Object(form.payload())
        }
        Some(("list", args)) => {
            let kind = collection(args)?;
            let path = args.get_one::<PathBuf>("records").context("missing --records")?;
            let mut records = load_records(path)?;
            registry.sort_for_listing(kind, &mut records);
            serde_json::to_value(&records)?
        }
        Some(("questionnaire", args)) => {
            let path = args.get_one::<PathBuf>("assets").context("missing --assets")?;
            let owner = args.get_one::<String>("owner").context("missing --owner")?;
            let mut identity = Identity::new(owner.clone());
            if let Some(company) = args.get_one::<String>("company") {
                identity = identity.with_company(company.clone());
            }
            questionnaire(config, load_records(path)?, &identity).await?
        }
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("log-json"));
    run(matches).await
}
