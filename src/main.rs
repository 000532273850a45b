// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use playbook_engine::config::{load_and_validate_config, EngineConfig, RuntimeBuilder};
use playbook_engine::model::Outcome;
use playbook_engine::observability::init_tracing;
use playbook_engine::playbook::{load_playbook, submit};
use playbook_engine::registry::Registry;
use playbook_engine::steps::builtin_registry;

fn usage(program: &str) {
    eprintln!("Usage: {} run [config]", program);
    eprintln!("       {} submit <playbook.yaml> [config]", program);
    eprintln!("       {} status <process-id> [config]", program);
    eprintln!("       {} steps", program);
    eprintln!("Example: {} submit playbooks/add-one.yaml engine.yaml", program);
}

fn config_at(path: Option<&String>) -> Result<EngineConfig> {
    let config = load_and_validate_config(path.map(Path::new))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("playbook-engine");
    let registry = Arc::new(builtin_registry()?);

    match args.get(1).map(String::as_str) {
        Some("run") => run(config_at(args.get(2))?, registry).await,
        Some("submit") => {
            let Some(playbook) = args.get(2) else {
                usage(program);
                bail!("submit needs a playbook file");
            };
            submit_playbook(playbook, config_at(args.get(3))?, registry).await
        }
        Some("status") => {
            let Some(id) = args.get(2) else {
                usage(program);
                bail!("status needs a process id");
            };
            let id = Uuid::parse_str(id).with_context(|| format!("'{id}' is not a process id"))?;
            status(id, config_at(args.get(3))?, registry).await
        }
        Some("steps") => {
            list_steps(&registry);
            Ok(())
        }
        _ => {
            usage(program);
            std::process::exit(1);
        }
    }
}

async fn run(config: EngineConfig, registry: Arc<Registry>) -> Result<()> {
    let runtime = RuntimeBuilder::connect(&config, registry).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    runtime.run(cancel).await?;
    Ok(())
}

async fn submit_playbook(path: &str, config: EngineConfig, registry: Arc<Registry>) -> Result<()> {
    let playbook = load_playbook(path)?;
    let runtime = RuntimeBuilder::connect(&config, registry.clone()).await?;
    let store = runtime.store();
    let queue = runtime.queue();

    let ids = submit(&playbook, &registry, store.as_ref(), queue.as_ref(), &config.queue.name).await?;
    for (label, id) in ids {
        println!("{label}\t{id}");
    }
    Ok(())
}

async fn status(id: Uuid, config: EngineConfig, registry: Arc<Registry>) -> Result<()> {
    let runtime = RuntimeBuilder::connect(&config, registry).await?;
    let Some(record) = runtime.store().get_process(id).await? else {
        bail!("process {id} not found");
    };

    let step = record.process.step_type();
    match record.resolution.as_ref().map(|r| r.outcome()) {
        None => println!("{id}\t{step}\tunresolved"),
        Some(Outcome::Pending) => println!("{id}\t{step}\tpending"),
        Some(Outcome::Succeeded(data)) => println!("{id}\t{step}\tsucceeded\t{}", data.value()),
        Some(Outcome::Failed(data)) => {
            let message = data.error_message().unwrap_or_default();
            println!("{id}\t{step}\tfailed\t{message}")
        }
    }
    Ok(())
}

fn list_steps(registry: &Registry) {
    for spec in registry.specs() {
        let kind = if spec.kind().is_prompt() { "prompt" } else { "computed" };
        let inputs: Vec<String> = spec
            .inputs()
            .iter()
            .map(|(name, ty)| format!("{name}: {}", ty.spec()))
            .collect();
        println!(
            "{:<16} {:<9} ({}) -> {}\t{}",
            spec.spec(),
            kind,
            inputs.join(", "),
            spec.output().spec(),
            spec.meta().description
        );
    }
}
