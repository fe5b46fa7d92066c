mod cli;

use crate::cli::{Command, LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use burrow_cache::CacheConfig;
use burrow_core::api::Request;
use burrow_core::RecordStore;
use burrow_gateway::{Gateway, GatewaySettings, Reply};
use burrow_generator::HashGeneratorSettings;
use burrow_shortener::ShortenerConfig;
use burrow_storage::{
    ExpirySweeper, InMemoryRecordStore, MySqlRecordStore, RedisRecordStore, StoreTimeouts,
};
use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(storage_backend = %config.storage, "starting burrow");

    let store = connect_store(&config).await?;
    let gateway = Gateway::new(Arc::clone(&store), settings(&config))?;

    let reply = match config.command {
        Command::Shorten { url } => gateway.reply(Request::Shorten { url }).await,
        Command::Resolve { code } => gateway.reply(Request::Resolve { code }).await,
        Command::Stats { code } => gateway.reply(Request::Stats { code }).await,
        Command::Sweep { watch } => {
            sweep(store, watch).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Batch => {
            batch(&gateway).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    print_json(&reply)?;
    Ok(match reply {
        Reply::Ok(_) => ExitCode::SUCCESS,
        Reply::Err { .. } => ExitCode::FAILURE,
    })
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

fn settings(config: &CLI) -> GatewaySettings {
    GatewaySettings::builder()
        .cache(CacheConfig::builder().capacity(config.cache_capacity).build())
        .generator(
            HashGeneratorSettings::builder()
                .length(config.code_length)
                .build(),
        )
        .shortener(ShortenerConfig {
            max_attempts: config.max_attempts,
            default_ttl: config.default_ttl_secs.map(Duration::from_secs),
        })
        .build()
}

async fn connect_store(config: &CLI) -> anyhow::Result<Arc<dyn RecordStore>> {
    let timeouts = StoreTimeouts::builder()
        .call(Duration::from_millis(config.store_timeout_ms))
        .build();

    let store: Arc<dyn RecordStore> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(InMemoryRecordStore::new()),
        StorageBackendArg::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("redis url is required when storage backend is redis")?;
            Arc::new(RedisRecordStore::connect(url, timeouts).await?)
        }
        StorageBackendArg::Mysql => {
            let dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlRecordStore::connect(dsn, timeouts).await?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
    };

    Ok(store)
}

async fn sweep(store: Arc<dyn RecordStore>, watch_secs: Option<u64>) -> anyhow::Result<()> {
    let Some(secs) = watch_secs else {
        let removed = ExpirySweeper::new(store, Duration::from_secs(0))
            .sweep_once()
            .await?;
        print_json(&serde_json::json!({ "removed": removed }))?;
        return Ok(());
    };

    let (tx, rx) = watch::channel(false);
    let handle = ExpirySweeper::new(store, Duration::from_secs(secs.max(1))).spawn(rx);
    info!(interval_secs = secs, "expiry sweeper running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    // fails only when the sweeper has already exited
    let _ = tx.send(true);
    handle.await?;
    Ok(())
}

async fn batch(gateway: &Gateway) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        print_json(&gateway.reply_line(&line).await)?;
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
