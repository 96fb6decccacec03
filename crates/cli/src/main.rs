use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::Level;

use drafter_engine::{CreateWorkflowRequest, WorkflowCoordinator};
use drafter_registry::{EchoOperation, OperationRegistry, TemplateStore};
use drafter_types::WorkflowTemplate;

fn main() -> Result<()> {
    init_tracing();
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("templates", sub)) => run_templates_cmd(sub),
        Some(("show", sub)) => run_show_cmd(sub),
        Some(("run", sub)) => run_run_cmd(sub),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .try_init();
}

fn build_cli() -> Command {
    let dir_arg = Arg::new("dir")
        .long("dir")
        .action(ArgAction::Set)
        .help("Load templates from this directory instead of the embedded catalog");

    Command::new("drafter")
        .about("Template-driven workflow engine for construction-document production")
        .subcommand(
            Command::new("templates")
                .about("List available workflow templates")
                .arg(dir_arg.clone()),
        )
        .subcommand(
            Command::new("show")
                .about("Print the resolved template document")
                .arg(
                    Arg::new("workflow-type")
                        .long("workflow-type")
                        .short('t')
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("project-type")
                        .long("project-type")
                        .short('p')
                        .action(ArgAction::Set),
                )
                .arg(dir_arg.clone()),
        )
        .subcommand(
            Command::new("run")
                .about("Create and run a workflow against echo operations")
                .arg(
                    Arg::new("workflow-type")
                        .long("workflow-type")
                        .short('t')
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("project-type")
                        .long("project-type")
                        .short('p')
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("building-code")
                        .long("building-code")
                        .short('c')
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("param")
                        .long("param")
                        .action(ArgAction::Append)
                        .help("Seed a context value, key=value; value is parsed as JSON when possible"),
                )
                .arg(dir_arg),
        )
}

fn load_templates(matches: &ArgMatches) -> Result<TemplateStore> {
    match matches.get_one::<String>("dir") {
        Some(dir) => TemplateStore::load_dir(dir)
            .with_context(|| format!("failed to load templates from '{dir}'")),
        None => TemplateStore::from_embedded().context("embedded template catalog is invalid"),
    }
}

fn run_templates_cmd(matches: &ArgMatches) -> Result<()> {
    let store = load_templates(matches)?;
    for summary in store.list() {
        let project_types = if summary.project_types.is_empty() {
            "any".to_string()
        } else {
            summary.project_types.join(", ")
        };
        println!(
            "{:<28} {:<36} phases: {:<2} projects: {}",
            summary.workflow_type, summary.name, summary.phase_count, project_types
        );
        if !summary.description.is_empty() {
            println!("    {}", summary.description);
        }
    }
    Ok(())
}

fn run_show_cmd(matches: &ArgMatches) -> Result<()> {
    let store = load_templates(matches)?;
    let workflow_type = matches
        .get_one::<String>("workflow-type")
        .ok_or_else(|| anyhow!("--workflow-type is required"))?;
    let project_type = matches
        .get_one::<String>("project-type")
        .map(String::as_str)
        .unwrap_or("");

    let template = store.resolve(workflow_type, project_type)?;
    println!("{}", serde_json::to_string_pretty(template.as_ref())?);
    Ok(())
}

fn run_run_cmd(matches: &ArgMatches) -> Result<()> {
    let store = load_templates(matches)?;
    let workflow_type = matches
        .get_one::<String>("workflow-type")
        .ok_or_else(|| anyhow!("--workflow-type is required"))?;
    let project_type = matches
        .get_one::<String>("project-type")
        .map(String::as_str)
        .unwrap_or("")
        .to_string();
    let building_code = matches
        .get_one::<String>("building-code")
        .map(String::as_str)
        .unwrap_or("")
        .to_string();

    // No CAD document is attached on the command line, so every method the
    // template names runs as an echo operation. Real hosts embed the engine
    // and register genuine operations instead.
    let template = store.resolve(workflow_type, &project_type)?;
    let operations = echo_operations_for(&template);

    let request = CreateWorkflowRequest {
        workflow_type: workflow_type.clone(),
        project_type,
        building_code,
        custom_parameters: parse_params(matches)?,
    };

    let coordinator = WorkflowCoordinator::new(store, operations);
    let summary = coordinator.create_and_run(request)?;
    let state = coordinator.status(&summary.workflow_id)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn echo_operations_for(template: &WorkflowTemplate) -> OperationRegistry {
    let mut operations = OperationRegistry::new();
    for phase in &template.phases {
        for task in &phase.tasks {
            if !task.is_custom() && !operations.contains(&task.method) {
                operations.register(&task.method, EchoOperation::new(task.method.clone()));
            }
        }
    }
    operations
}

fn parse_params(matches: &ArgMatches) -> Result<JsonMap<String, JsonValue>> {
    let mut params = JsonMap::new();
    if let Some(values) = matches.get_many::<String>("param") {
        for pair in values {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("--param expects key=value, got '{pair}'"))?;
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| JsonValue::String(value.to_string()));
            params.insert(key.to_string(), value);
        }
    }
    Ok(params)
}
