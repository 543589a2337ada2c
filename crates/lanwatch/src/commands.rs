//! Subcommand handlers.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lanwatch_config::Config;
use lanwatch_core::{
    BatchCommand, BatchExecutor, BatchReport, DeviceRecord, DeviceStats, DeviceStore, Gateway,
    HeuristicClassifier, LogNotifier, MacAddress, RateLimiter, Reconciler,
};

use crate::cli::{Command, GlobalOpts};
use crate::error::DaemonError;
use crate::poller::Poller;

/// Everything a command needs, built once from configuration.
pub struct Context {
    config: Config,
    store: DeviceStore,
    gateway: Gateway,
    json: bool,
}

impl Context {
    pub async fn build(global: &GlobalOpts) -> Result<Self, DaemonError> {
        let config = lanwatch_config::load_config(global.config.as_deref())?;

        let db_path = config.db_path();
        debug!(path = %db_path.display(), "opening device store");
        let store = DeviceStore::open(&db_path).await?;

        // One limiter for the whole process.
        let limiter = RateLimiter::shared(config.rate_limit_config());
        let gateway = Gateway::new(&config.to_controller_config(), limiter);

        Ok(Self {
            config,
            store,
            gateway,
            json: global.json,
        })
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.store.clone(), Arc::new(HeuristicClassifier))
            .with_notifier(Arc::new(LogNotifier))
    }

    fn poller(&self) -> Poller {
        Poller::new(
            self.gateway.clone(),
            self.reconciler(),
            self.config.poll_interval(),
        )
    }
}

pub async fn dispatch(command: Command, ctx: Context) -> Result<(), DaemonError> {
    let result = match command {
        Command::Run => run(&ctx).await,
        Command::Poll => poll(&ctx).await,
        Command::Devices { all } => devices(&ctx, all).await,
        Command::Ack { macs } => acknowledge(&ctx, &macs).await,
        Command::Stats => stats(&ctx).await,
        Command::Blocked => blocked(&ctx).await,
        Command::Block { macs } => batch(&ctx, BatchCommand::Block, &macs).await,
        Command::Unblock { macs } => batch(&ctx, BatchCommand::Unblock, &macs).await,
    };
    ctx.store.close().await;
    result
}

// ── Polling ─────────────────────────────────────────────────────────

async fn run(ctx: &Context) -> Result<(), DaemonError> {
    if !ctx.gateway.is_configured() {
        warn!("controller not configured; every poll will fail until the configuration is fixed");
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received, shutting down"),
            Err(e) => warn!(error = %e, "cannot listen for ctrl-c, shutting down"),
        }
        on_signal.cancel();
    });

    ctx.poller().run(cancel).await;
    Ok(())
}

async fn poll(ctx: &Context) -> Result<(), DaemonError> {
    let poller = ctx.poller();
    let result = poller.poll_once().await;
    ctx.gateway.logout().await;
    let report = result?;

    if ctx.json {
        print_json(&serde_json::json!({
            "observed": report.observed,
            "candidates": report.candidates,
            "inserted": report.inserted,
            "refreshed": report.refreshed,
            "new_devices": report.new_devices,
        }))?;
    } else {
        println!(
            "observed {} clients, {} new, {} refreshed",
            report.observed, report.inserted, report.refreshed
        );
        for device in &report.new_devices {
            println!("{}", device_line(device));
        }
    }
    Ok(())
}

// ── Store ───────────────────────────────────────────────────────────

async fn devices(ctx: &Context, all: bool) -> Result<(), DaemonError> {
    let devices = if all {
        ctx.store.list_all().await?
    } else {
        ctx.store.list_unacknowledged().await?
    };

    if ctx.json {
        return print_json(&devices);
    }
    if devices.is_empty() {
        println!("no devices");
    }
    for device in &devices {
        println!("{}", device_line(device));
    }
    Ok(())
}

async fn acknowledge(ctx: &Context, macs: &[String]) -> Result<(), DaemonError> {
    let mut records = Vec::with_capacity(macs.len());
    for raw in macs {
        records.push(ctx.store.acknowledge(&MacAddress::new(raw)).await?);
    }

    if ctx.json {
        return print_json(&records);
    }
    for record in &records {
        println!("acknowledged {}", device_line(record));
    }
    Ok(())
}

async fn stats(ctx: &Context) -> Result<(), DaemonError> {
    let stats = ctx.store.stats().await?;
    if ctx.json {
        return print_json(&stats);
    }
    println!("{}", stats_line(&stats));
    Ok(())
}

// ── Controller ──────────────────────────────────────────────────────

async fn blocked(ctx: &Context) -> Result<(), DaemonError> {
    let result = ctx.gateway.fetch_blocked_clients().await;
    ctx.gateway.logout().await;
    let macs = result?;

    if ctx.json {
        return print_json(&macs);
    }
    for mac in &macs {
        println!("{mac}");
    }
    Ok(())
}

async fn batch(ctx: &Context, command: BatchCommand, macs: &[String]) -> Result<(), DaemonError> {
    let macs: Vec<MacAddress> = macs.iter().map(MacAddress::new).collect();
    let executor = BatchExecutor::new(ctx.gateway.clone()).with_delay(ctx.config.batch_delay());

    let report = executor.run(command, &macs).await;
    ctx.gateway.logout().await;

    if ctx.json {
        print_json(&report)?;
    } else {
        print_batch(command, &report);
    }

    let failed = report.failure_count();
    if failed > 0 {
        return Err(DaemonError::PartialFailure {
            command,
            failed,
            total: report.outcomes.len(),
        });
    }
    Ok(())
}

// ── Output ──────────────────────────────────────────────────────────

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), DaemonError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_batch(command: BatchCommand, report: &BatchReport) {
    for outcome in &report.outcomes {
        if let Some(error) = &outcome.error {
            println!("{command} {}: FAILED ({error})", outcome.mac);
        } else {
            println!("{command} {}: ok", outcome.mac);
        }
    }
}

fn local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn device_line(device: &DeviceRecord) -> String {
    let ack = device
        .acknowledged_at
        .map_or_else(String::new, |at| format!("  acked {}", local(at)));
    format!(
        "{}  {:<24}  {:<16}  {:<8}  {:<15}  detected {}{ack}",
        device.mac,
        device.name,
        device.vendor,
        device.kind,
        device.ip.as_deref().unwrap_or("-"),
        local(device.detected_at),
    )
}

fn stats_line(stats: &DeviceStats) -> String {
    format!(
        "total {}  acknowledged {}  unacknowledged {}  today {}",
        stats.total, stats.acknowledged, stats.unacknowledged, stats.today
    )
}
