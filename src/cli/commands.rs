//! Command dispatch

use std::io;
use std::sync::Arc;

use clap::CommandFactory;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::application::services::{PrefetchHandle, PrefetchOutcome};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::hierarchy::to_tree_string;
use crate::domain::{
    EmptyPagePolicy, ExpansionMode, HierarchyPath, PageRequest, RouteBatch, RowsRequest,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{ChannelSink, NullSink};

pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `treepager --help`".into(),
        ));
    };

    match command {
        Commands::Rows {
            path,
            start,
            end,
            json,
        } => {
            let path = path.clone().unwrap_or_default();
            rows(cli, &path, *start, *end, *json).await
        }
        Commands::Expand { path, json } => expand(cli, path, *json).await,
        Commands::Tree => tree(cli).await,
        Commands::Config { command } => config(cli, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "treepager", &mut io::stdout());
            Ok(())
        }
    }
}

/// Settings from config files and environment, then command line flags.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(source) = &cli.source {
        settings.source = source.clone();
    }
    if let Some(latency_ms) = cli.latency_ms {
        settings.latency_ms = latency_ms;
    }
    if cli.prefetch {
        settings.expansion = ExpansionMode::Prefetch;
    }
    if cli.allow_empty_page {
        settings.empty_page = EmptyPagePolicy::Succeed;
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize output".into(),
        source: Box::new(e),
    })?;
    output::info(&text);
    Ok(())
}

#[instrument(skip(cli))]
async fn rows(
    cli: &Cli,
    path: &HierarchyPath,
    start: usize,
    end: Option<usize>,
    json: bool,
) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let end = end.unwrap_or_else(|| start.saturating_add(settings.page_size));
    let page = PageRequest::new(start, end).map_err(|e| CliError::InvalidArgs(e.to_string()))?;

    let container = ServiceContainer::new(settings)?;
    let (sink, mut rx) = ChannelSink::new();
    let datasource = container.datasource(Arc::new(sink)).await?;

    let request = RowsRequest {
        path: path.clone(),
        page,
    };
    let (response, handle) = datasource.get_rows_tracked(&request).await?;

    if json {
        print_json(&response)?;
    } else {
        output::rows(&response);
    }

    if let Some(handle) = handle {
        let outcome = follow_pushes(handle, &mut rx, json).await?;
        debug!("prefetch finished: {:?}", outcome);
        match outcome {
            PrefetchOutcome::Completed { pushed } if !json => {
                output::action("done", &format!("{} batches pushed", pushed))
            }
            PrefetchOutcome::Cancelled { pushed } => {
                output::warning(&format!("prefetch cancelled after {} batches", pushed))
            }
            PrefetchOutcome::SinkClosed { pushed } => {
                output::warning(&format!("sink closed after {} batches", pushed))
            }
            PrefetchOutcome::Failed(e) => return Err(e.into()),
            PrefetchOutcome::Completed { .. } => {}
        }
    }
    Ok(())
}

/// Print pushed batches until the prefetch walk ends; Ctrl-C cancels it.
async fn follow_pushes(
    handle: PrefetchHandle,
    rx: &mut UnboundedReceiver<RouteBatch>,
    json: bool,
) -> CliResult<PrefetchOutcome> {
    let print = |batch: &RouteBatch| -> CliResult<()> {
        if json {
            print_json(batch)
        } else {
            output::batch(batch);
            Ok(())
        }
    };

    let token = handle.cancel_token();
    let wait = handle.wait();
    tokio::pin!(wait);
    let mut listening = true;

    loop {
        tokio::select! {
            Some(batch) = rx.recv() => print(&batch)?,
            signal = tokio::signal::ctrl_c(), if listening => {
                listening = on_interrupt(signal, &token);
            }
            outcome = &mut wait => {
                let outcome = outcome?;
                while let Ok(batch) = rx.try_recv() {
                    print(&batch)?;
                }
                return Ok(outcome);
            }
        }
    }
}

/// Cancel on a delivered Ctrl-C. Returns whether to keep listening: a
/// handler that cannot be installed is logged and not retried.
fn on_interrupt(signal: io::Result<()>, token: &CancellationToken) -> bool {
    match signal {
        Ok(()) => {
            debug!("interrupted, cancelling prefetch");
            token.cancel();
            true
        }
        Err(e) => {
            warn!("cannot listen for Ctrl-C: {}", e);
            false
        }
    }
}

#[instrument(skip(cli))]
async fn expand(cli: &Cli, path: &HierarchyPath, json: bool) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let container = ServiceContainer::new(settings)?;
    let datasource = container.datasource(Arc::new(NullSink)).await?;

    let batch = datasource.expand(path).await?;

    if json {
        print_json(&batch)
    } else {
        output::batch(&batch);
        Ok(())
    }
}

#[instrument(skip(cli))]
async fn tree(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    let container = ServiceContainer::new(settings)?;
    let dataset = container.loader.load().await?;

    output::info(&to_tree_string(&dataset, &container.loader.origin()));
    output::info(&format!(
        "{} top-level nodes, {} total",
        dataset.len(),
        dataset.node_count()
    ));
    Ok(())
}

fn config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "" } else { " (not found)" };
                    output::action("global", &format!("{}{}", path.display(), state));
                }
                None => output::warning("no config directory for this platform"),
            }
            if let Some(local) = &cli.config {
                output::action("local", &local.display());
            }
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
