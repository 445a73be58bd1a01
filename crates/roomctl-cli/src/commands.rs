//! Subcommand dispatch: builds the gateway client and reconciler, then maps
//! CLI arguments onto engine calls.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::sync::watch;

use roomctl_core::normalize_stream_id;
use roomctl_engine::{RoomReconciler, UpdateOutcome};
use roomctl_gateway::{
    AdminApiClient, RoomAttributes, RoomGateway, StreamFilter, StreamPrivacy, StreamScope,
    StreamStatus,
};

use crate::cli_args::{
    AllArgs, Cli, Command, CommonSettingsArgs, CsvArgs, OriginStatusFilterArgs, ScopeFilterArgs,
    SingleArgs, SingleOnlySettingsArgs,
};
use crate::config;

pub async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(&cli.config)?;
    let client = AdminApiClient::new(
        config.api_base,
        config.session_token,
        Some(config.request_timeout_ms),
    )
    .context("failed to build the admin api client")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("ctrl-c received, finishing the current room");
            let _ = shutdown_tx.send(true);
        }
    });

    let reconciler = RoomReconciler::connect(client)
        .await
        .context("failed to establish a bot session")?
        .with_shutdown(shutdown_rx);

    match cli.command {
        Command::Single(args) => run_single(&reconciler, args).await,
        Command::All(args) => run_all(&reconciler, args).await,
        Command::Csv(args) => run_csv(&reconciler, args).await,
    }
}

async fn run_single<G: RoomGateway>(
    reconciler: &RoomReconciler<G>,
    args: SingleArgs,
) -> Result<()> {
    let desired = single_settings(&args.settings, &args.single_settings);
    if desired.is_empty_update() {
        bail!("no settings given, nothing to change");
    }
    let outcome = reconciler
        .reconcile(&args.stream, &desired, !args.no_pre_check)
        .await;
    match &outcome {
        UpdateOutcome::Updated(detail) => {
            tracing::info!(
                stream_id = %detail.room_system_info.id,
                room_name = detail.room_attributes.name.as_deref().unwrap_or(""),
                "room updated"
            );
            Ok(())
        }
        UpdateOutcome::Skipped { detail, reason } => {
            tracing::info!(
                stream_id = %detail.room_system_info.id,
                reason = %reason,
                "room skipped"
            );
            Ok(())
        }
        UpdateOutcome::Failed { reason } => bail!("room update failed: {reason}"),
    }
}

async fn run_all<G: RoomGateway>(reconciler: &RoomReconciler<G>, args: AllArgs) -> Result<()> {
    let desired = common_settings(&args.settings);
    if desired.is_empty_update() {
        bail!("no settings given, nothing to change");
    }
    let filter = narrow_filter_for_settings(scope_filter(&args.filter), &desired);
    let outcomes = reconciler
        .update_rooms_by_filter(filter, &desired, !args.no_pre_check)
        .await
        .context("bulk update failed while listing rooms")?;
    log_outcome_summary(&outcomes);
    Ok(())
}

async fn run_csv<G: RoomGateway>(reconciler: &RoomReconciler<G>, args: CsvArgs) -> Result<()> {
    if let Some(input) = &args.input {
        let input = resolve_input_path(input);
        if !input.is_file() {
            bail!("input csv {} is not a file", input.display());
        }
        let global = common_settings(&args.settings);
        let global_settings = (!global.is_empty_update()).then_some(&global);

        let reader = File::open(&input)
            .with_context(|| format!("failed to open input csv {}", input.display()))?;
        // Per-row results are only materialized when asked for.
        let writer = match &args.output {
            Some(path) => {
                let output_path = resolve_output_path(path);
                tracing::info!(output = %output_path.display(), "writing per-row results");
                Some(File::create(&output_path).with_context(|| {
                    format!("failed to create output csv {}", output_path.display())
                })?)
            }
            None => None,
        };

        reconciler
            .update_rooms_from_csv(reader, writer, global_settings, !args.no_pre_check)
            .await?;
        return Ok(());
    }

    if args.list || args.list_all {
        let mut filter = scope_filter(&args.filter);
        apply_origin_status(&mut filter, &args.origin_status);
        if args.list {
            filter = filter.into_modifiable();
        }
        let output_path = resolve_output_path(
            args.output.as_deref().unwrap_or_else(|| Path::new(".")),
        );
        tracing::info!(output = %output_path.display(), "exporting rooms");
        let writer = File::create(&output_path)
            .with_context(|| format!("failed to create output csv {}", output_path.display()))?;
        reconciler
            .export_rooms_csv(&filter, writer, args.extended)
            .await?;
        return Ok(());
    }

    bail!("specify one of --list, --list-all or --input");
}

/// Maps the shared settings flags onto a desired-change record. A false
/// copy-protection flag is dropped since the remote setting only moves one
/// way.
fn common_settings(args: &CommonSettingsArgs) -> RoomAttributes {
    let mut desired = RoomAttributes {
        members_can_invite: args.members_can_invite,
        discoverable: args.discoverable,
        view_history: args.view_history,
        ..RoomAttributes::default()
    };
    match args.copy_protected {
        Some(true) => desired.copy_protected = Some(true),
        Some(false) => {
            tracing::warn!("copy protection cannot be disabled once set, ignoring the flag");
        }
        None => {}
    }
    desired
}

fn single_settings(
    common: &CommonSettingsArgs,
    single: &SingleOnlySettingsArgs,
) -> RoomAttributes {
    let mut desired = common_settings(common);
    match single.name.as_deref().map(unquote_empty) {
        Some(name) if name.is_empty() => {
            tracing::warn!("a room name cannot be empty, ignoring the flag");
        }
        Some(name) => desired.name = Some(name),
        None => {}
    }
    desired.description = single.description.as_deref().map(unquote_empty);
    desired.pinned_message_id = single.pinned_message_id.as_deref().map(|id| {
        let id = unquote_empty(id);
        if id.is_empty() {
            id
        } else {
            normalize_stream_id(&id)
        }
    });
    desired
}

/// A literal `""` or `''` argument means "set to empty", matching the CSV
/// convention for explicit-empty cells.
fn unquote_empty(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed == "\"\"" || trimmed == "''" {
        String::new()
    } else {
        value.to_string()
    }
}

/// Both flags of a pair select both rooms kinds, the same as neither flag.
fn scope_filter(args: &ScopeFilterArgs) -> StreamFilter {
    let mut filter = StreamFilter::rooms();
    filter.scope = match (args.internal, args.external) {
        (true, false) => Some(StreamScope::Internal),
        (false, true) => Some(StreamScope::External),
        _ => None,
    };
    filter.privacy = match (args.public, args.private) {
        (true, false) => Some(StreamPrivacy::Public),
        (false, true) => Some(StreamPrivacy::Private),
        _ => None,
    };
    filter
}

fn apply_origin_status(filter: &mut StreamFilter, args: &OriginStatusFilterArgs) {
    filter.origin = match (args.internal_origin, args.external_origin) {
        (true, false) => Some(roomctl_gateway::StreamOrigin::Internal),
        (false, true) => Some(roomctl_gateway::StreamOrigin::External),
        _ => None,
    };
    filter.status = match (args.active, args.inactive) {
        (true, false) => Some(StreamStatus::Active),
        (false, true) => Some(StreamStatus::Inactive),
        _ => None,
    };
}

/// Some settings only exist for a subset of rooms; asking the API to change
/// them elsewhere fails every room in the batch. Narrow the listing instead.
fn narrow_filter_for_settings(mut filter: StreamFilter, desired: &RoomAttributes) -> StreamFilter {
    if desired.copy_protected.is_some() || desired.view_history.is_some() {
        if filter.scope != Some(StreamScope::Internal) {
            tracing::info!("restricting the run to internal rooms for the requested settings");
            filter.scope = Some(StreamScope::Internal);
        }
    }
    if desired.discoverable.is_some() {
        if filter.scope != Some(StreamScope::Internal) || filter.privacy != Some(StreamPrivacy::Private)
        {
            tracing::info!("restricting the run to internal private rooms to change discoverability");
            filter.scope = Some(StreamScope::Internal);
            filter.privacy = Some(StreamPrivacy::Private);
        }
    }
    filter
}

fn log_outcome_summary(outcomes: &[UpdateOutcome]) {
    let updated = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, UpdateOutcome::Updated(_)))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, UpdateOutcome::Skipped { .. }))
        .count();
    let failed = outcomes.iter().filter(|outcome| outcome.is_failure()).count();
    tracing::info!(
        rooms = outcomes.len(),
        updated,
        skipped,
        failed,
        "finished bulk update"
    );
}

/// A directory input path resolves to the conventional `input.csv` inside it.
fn resolve_input_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join("input.csv")
    } else {
        path.to_path_buf()
    }
}

/// A directory path resolves to a timestamped file inside it so repeated
/// runs never clobber an earlier report.
fn resolve_output_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        let stamp = chrono::Local::now().format("%d%b%Y_%H-%M-%S");
        path.join(format!("output-{stamp}.csv"))
    } else {
        path.to_path_buf()
    }
}
