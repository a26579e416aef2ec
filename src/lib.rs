// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod privilege;
pub mod signal;
pub mod types;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::{DaemonConfig, load_and_resolve};
use crate::engine::Scheduler;
use crate::exec::ShellBuildRunner;
use crate::signal::{DEFAULT_SEND_TIMEOUT, Endpoint, TriggerListener, send_trigger, spawn_accept_loop};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - producer mode (`--send`)
/// - config loading and `--dry-run`
/// - the root check
/// - scheduler + shell build runner
/// - both trigger listeners
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    if let Some(ref target) = args.send {
        let endpoint = Endpoint::parse(target)?;
        send_trigger(&endpoint, DEFAULT_SEND_TIMEOUT)
            .await
            .with_context(|| format!("sending trigger to {endpoint}"))?;
        info!(endpoint = %endpoint, "trigger sent");
        return Ok(());
    }

    let cfg = load_and_resolve(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    privilege::refuse_root()?;

    let runner = ShellBuildRunner::new(cfg.build_cmd.clone(), cfg.build_timeout);
    let scheduler = Scheduler::new(cfg.scheduler, runner);

    // Bind both before accepting on either: never run half-configured.
    let local = TriggerListener::bind(&Endpoint::Unix(cfg.unix_socket.clone())).await?;
    let network = TriggerListener::bind(&Endpoint::Tcp(cfg.tcp_addr.clone())).await?;

    info!(
        unix_socket = %cfg.unix_socket.display(),
        tcp_addr = %cfg.tcp_addr,
        debounce_secs = cfg.scheduler.debounce.as_secs(),
        max_retries = cfg.scheduler.max_retries,
        retry_reset_secs = cfg.scheduler.retry_reset.as_secs(),
        build_cmd = %cfg.build_cmd,
        "rebuildd started"
    );

    let _local_loop = spawn_accept_loop(local, scheduler.clone());
    let _network_loop = spawn_accept_loop(network, scheduler);

    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl+C")?;
    info!("Ctrl+C received; exiting");

    Ok(())
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &DaemonConfig) {
    println!("rebuildd dry-run");
    println!("  unix_socket      = {}", cfg.unix_socket.display());
    println!("  tcp_addr         = {}", cfg.tcp_addr);
    println!("  debounce_secs    = {}", cfg.scheduler.debounce.as_secs());
    println!("  max_retries      = {}", cfg.scheduler.max_retries);
    println!("  retry_reset_secs = {}", cfg.scheduler.retry_reset.as_secs());
    println!("  build_cmd        = {}", cfg.build_cmd);
    match cfg.build_timeout {
        Some(t) => println!("  build_timeout    = {}s", t.as_secs()),
        None => println!("  build_timeout    = none"),
    }
}
