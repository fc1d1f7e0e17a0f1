use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::archive;
use crate::cancel::CancelToken;
use crate::cli::BuildArgs;
use crate::commands::config::{self, BuildEntry, Overrides};
use crate::error::ArchitectError;
use crate::events::BuildEvent;
use crate::generation::{GeminiProvider, GenerationClient};
use crate::orchestrator::{BuildOutcome, Orchestrator};

/// Final line of a `--json` build.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildReport<'a> {
    ok: bool,
    project_name: Option<&'a str>,
    archive_path: Option<String>,
    files: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ArchitectError>,
}

fn render_event(event: &BuildEvent) -> String {
    match event {
        BuildEvent::StageStarted {
            stage,
            description,
            stage_index,
            total_stages,
        } => format!("[{stage_index}/{total_stages}] {stage}: {description}"),
        BuildEvent::Progress { percent, status } => format!("{percent:>3}% {status}"),
        BuildEvent::Log(entry) => format!("    {} [{}] {}", entry.timestamp, entry.source, entry.message),
        BuildEvent::StageCompleted { stage, files } => format!("    {stage}: {files} files"),
        BuildEvent::Error { stage, message } => format!("    {stage} failed: {message}"),
        BuildEvent::Finished { files } => format!("Done: {files} files"),
    }
}

/// Prints events until the build drops its sender.
async fn print_events(mut rx: mpsc::UnboundedReceiver<BuildEvent>, json: bool) {
    while let Some(event) = rx.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "could not serialize event"),
            }
        } else {
            eprintln!("{}", render_event(&event));
        }
    }
}

fn api_key(args: &BuildArgs) -> Option<String> {
    args.api_key
        .clone()
        .or_else(|| std::env::var("API_KEY").ok())
}

pub async fn run_build(args: BuildArgs) -> anyhow::Result<()> {
    let config_path = config::config_path();
    let stored = config_path
        .as_deref()
        .map(config::load_config)
        .unwrap_or_default();

    let settings = config::resolve_settings(
        &stored,
        Overrides {
            api_key: api_key(&args),
            model: args.model.clone(),
            api_base: args.api_base.clone(),
            output_dir: args.out.clone(),
        },
    )?;

    let provider = GeminiProvider::new(settings.api_key.clone(), settings.api_base.clone())?;
    let client = GenerationClient::new(Arc::new(provider), settings.model.clone());
    let orchestrator = Orchestrator::new(client);

    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling build");
                cancel.cancel();
            }
        })
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx, args.json));

    let result = orchestrator
        .build_project(&args.name, args.dimension, Some(tx), &cancel)
        .await;
    watcher.abort();
    // The orchestrator has dropped its sender, so the printer drains and ends.
    let _ = printer.await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if args.json {
                print_report(&BuildReport {
                    ok: false,
                    project_name: None,
                    archive_path: None,
                    files: vec![],
                    error: Some(&e),
                });
            }
            return Err(e).context("Architectural Error");
        }
    };

    let archive_path = package(&outcome, &settings.output_dir, args.extract_dir.as_ref())?;

    if let Some(path) = &config_path {
        let entry = BuildEntry {
            project_name: outcome.project_name.clone(),
            dimension: args.dimension,
            archive_path: archive_path.to_string_lossy().to_string(),
            files: outcome.manifest.len(),
            model: settings.model.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = config::save_build(path, entry) {
            tracing::warn!(error = %e, "could not record build history");
        }
    }

    if args.json {
        print_report(&BuildReport {
            ok: true,
            project_name: Some(&outcome.project_name),
            archive_path: Some(archive_path.to_string_lossy().to_string()),
            files: outcome.manifest.paths().collect(),
            error: None,
        });
    } else {
        for path in outcome.manifest.paths() {
            println!("  {path}");
        }
        println!("Archive written to {}", archive_path.display());
    }
    Ok(())
}

fn package(
    outcome: &BuildOutcome,
    output_dir: &std::path::Path,
    extract_dir: Option<&PathBuf>,
) -> anyhow::Result<PathBuf> {
    let bytes = archive::assemble(&outcome.manifest)?;
    let path = archive::write_archive(output_dir, &outcome.project_name, &bytes)
        .with_context(|| format!("Failed to write archive to {}", output_dir.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "archive written");

    if let Some(dir) = extract_dir {
        let written = archive::extract_to_dir(&outcome.manifest, dir)
            .with_context(|| format!("Failed to extract project into {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), files = written, "project extracted");
    }
    Ok(path)
}

fn print_report(report: &BuildReport<'_>) {
    match serde_json::to_string(report) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!(error = %e, "could not serialize build report"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AgentLogEntry;

    #[test]
    fn test_render_events() {
        let started = BuildEvent::StageStarted {
            stage: "core-managers".into(),
            description: "Save and inventory".into(),
            stage_index: 1,
            total_stages: 3,
        };
        assert_eq!(render_event(&started), "[1/3] core-managers: Save and inventory");

        let progress = BuildEvent::Progress {
            percent: 20,
            status: "Working...".into(),
        };
        assert_eq!(render_event(&progress), " 20% Working...");

        let log = BuildEvent::Log(AgentLogEntry {
            source: "System".into(),
            message: "hi".into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        });
        assert_eq!(render_event(&log), "    2026-01-01T00:00:00.000Z [System] hi");
    }

    #[test]
    fn test_failure_report_has_no_files() {
        let err = ArchitectError::QuotaExceeded("HTTP 429".into());
        let report = BuildReport {
            ok: false,
            project_name: None,
            archive_path: None,
            files: vec![],
            error: Some(&err),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["files"].as_array().unwrap().len(), 0);
        assert_eq!(json["error"], "Quota exceeded: HTTP 429");
    }
}
