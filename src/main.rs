//! condition-router CLI.
//!
//! Evaluates condition routing rules from a TOML file against the providers
//! listed in the same file.
//!
//! # Architecture Overview
//!
//! ```text
//!   rules.toml ──▶ config::loader ──▶ RuleConfig::to_config_url
//!                        │                       │
//!                        │                       ▼
//!                        │             routing::factory ──▶ RouterTable
//!                        ▼                                      │
//!              providers (StaticInvoker)                        │
//!                        │                                      ▼
//!   --consumer url ──────┴───────────────────────────▶ table.route(...)
//!                                                               │
//!                                                               ▼
//!                                                     surviving providers
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use condition_router::config::{load_config, ConfigWatcher, RouterConfig};
use condition_router::endpoint::{Invoker, RpcInvocation, ServiceUrl, StaticInvoker};
use condition_router::observability::logging::init_logging;
use condition_router::routing::{ConditionRouterFactory, Rule, RouterTable};

#[derive(Parser)]
#[command(name = "condition-router")]
#[command(about = "Evaluate condition routing rules against a provider list", long_about = None)]
struct Cli {
    /// Rule file (TOML).
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the rule file and print every rule in canonical form
    Check,
    /// Route the configured providers for one consumer call
    Route {
        /// Consumer url, e.g. consumer://10.0.0.1/com.foo.BarService
        #[arg(long)]
        consumer: String,
        /// Invoked method name
        #[arg(long)]
        method: Option<String>,
    },
    /// Re-route on every change of the rule file
    Watch {
        #[arg(long)]
        consumer: String,
        #[arg(long)]
        method: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(&config.logging)?;

    tracing::debug!(
        path = ?cli.config,
        rules = config.rules.len(),
        providers = config.providers.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Check => check(&config)?,
        Commands::Route { consumer, method } => {
            let consumer = ServiceUrl::parse(&consumer)?;
            let invocation = RpcInvocation::new().with_method_name(method.unwrap_or_default());
            let table = build_table(&config)?;
            let invokers = config.build_invokers()?;
            let routed = table.route(&invokers, &consumer, &invocation);
            println!("{}", serde_json::to_string_pretty(&provider_urls(&routed))?);
        }
        Commands::Watch { consumer, method } => {
            let consumer = ServiceUrl::parse(&consumer)?;
            let invocation = RpcInvocation::new().with_method_name(method.unwrap_or_default());
            watch(&cli.config, config, consumer, invocation).await?;
        }
    }

    Ok(())
}

fn check(config: &RouterConfig) -> Result<(), Box<dyn std::error::Error>> {
    for rule in &config.rules {
        let parsed = Rule::parse(&rule.rule)?;
        println!(
            "{}: {} [scope={}, priority={}, force={}, enabled={}]",
            rule.name, parsed, rule.scope, rule.priority, rule.force, rule.enabled
        );
    }
    println!("{} rule(s), {} provider(s) OK", config.rules.len(), config.providers.len());
    Ok(())
}

fn build_table(config: &RouterConfig) -> Result<RouterTable, Box<dyn std::error::Error>> {
    let table = RouterTable::new();
    table.replace_from_urls(&ConditionRouterFactory::service(), &config.rule_urls())?;
    Ok(table)
}

fn provider_urls(invokers: &[Arc<StaticInvoker>]) -> Vec<String> {
    invokers.iter().map(|i| i.url().to_string()).collect()
}

async fn watch(
    path: &Path,
    config: RouterConfig,
    consumer: ServiceUrl,
    invocation: RpcInvocation,
) -> Result<(), Box<dyn std::error::Error>> {
    let factory = ConditionRouterFactory::service();
    let table = build_table(&config)?;
    let mut invokers = config.build_invokers()?;

    let (watcher, mut updates) = ConfigWatcher::new(path);
    let _watcher = watcher.run()?;

    report(&table, &invokers, &consumer, &invocation);
    loop {
        tokio::select! {
            Some(next) = updates.recv() => {
                if table.replace_from_urls(&factory, &next.rule_urls()).is_err() {
                    continue;
                }
                match next.build_invokers() {
                    Ok(fresh) => invokers = fresh,
                    Err(e) => tracing::warn!(error = %e, "Keeping previous providers"),
                }
                report(&table, &invokers, &consumer, &invocation);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}

fn report(
    table: &RouterTable,
    invokers: &[Arc<StaticInvoker>],
    consumer: &ServiceUrl,
    invocation: &RpcInvocation,
) {
    let routed = table.route(invokers, consumer, invocation);
    tracing::info!(
        consumer = %consumer,
        routers = table.len(),
        candidates = invokers.len(),
        survivors = ?provider_urls(&routed),
        "Route evaluated"
    );
}
