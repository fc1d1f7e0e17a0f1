//! Staged project build: three generation calls, patching, then the merge
//! with the fixed core files.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::UnboundedSender;

use crate::cancel::CancelToken;
use crate::error::{ArchitectError, Result};
use crate::events::{BuildEvent, Reporter};
use crate::generation::{GenerationClient, PromptSpec};
use crate::merge::merge;
use crate::model::{AgentLogEntry, Dimension, GeneratedFile, ProjectManifest};
use crate::patch;
use crate::registry::SingletonRegistry;
use crate::templates::{self, prompts};
use crate::util::{normalize_project_path, sanitize_project_name};

/// The fixed build stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageId {
    CoreManagers,
    PlayerSystems,
    UiInteraction,
}

impl StageId {
    pub const ALL: [StageId; 3] = [
        StageId::CoreManagers,
        StageId::PlayerSystems,
        StageId::UiInteraction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StageId::CoreManagers => "core-managers",
            StageId::PlayerSystems => "player-systems",
            StageId::UiInteraction => "ui-interaction",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StageId::CoreManagers => "Save and inventory singletons with item data",
            StageId::PlayerSystems => "Player controller, movement and vital stats",
            StageId::UiInteraction => "Inventory UI, HUD and enemy AI",
        }
    }

    /// Status line shown while the stage runs.
    pub fn status(self) -> &'static str {
        match self {
            StageId::CoreManagers => "Architecting Global Managers (Save & Inventory)...",
            StageId::PlayerSystems => "Designing Player Controller & Survival Systems...",
            StageId::UiInteraction => "Designing UI & Interaction Logic...",
        }
    }

    /// Progress reported when the stage starts.
    pub fn progress(self) -> u8 {
        match self {
            StageId::CoreManagers => 20,
            StageId::PlayerSystems => 50,
            StageId::UiInteraction => 80,
        }
    }
}

pub const COMPLETE_STATUS: &str = "Full Survival Architecture Generated!";

/// Output of a successful build.
#[derive(Debug)]
pub struct BuildOutcome {
    pub project_name: String,
    pub manifest: ProjectManifest,
    pub log: Vec<AgentLogEntry>,
}

/// Runs builds one at a time.
pub struct Orchestrator {
    client: GenerationClient,
    registry: SingletonRegistry,
    in_progress: AtomicBool,
}

/// Clears the in-progress flag however the build ends.
struct BuildGuard<'a>(&'a AtomicBool);

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Orchestrator {
    pub fn new(client: GenerationClient) -> Self {
        Self::with_registry(client, SingletonRegistry::default())
    }

    pub fn with_registry(client: GenerationClient, registry: SingletonRegistry) -> Self {
        Self {
            client,
            registry,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_building(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Generates all stages and merges them with the core files.
    ///
    /// The first error from any stage aborts the build; later stages are not
    /// run and no manifest is produced. A second call while one is running
    /// fails with [`ArchitectError::BuildInProgress`].
    pub async fn build_project(
        &self,
        project_name: &str,
        dimension: Dimension,
        events: Option<UnboundedSender<BuildEvent>>,
        cancel: &CancelToken,
    ) -> Result<BuildOutcome> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ArchitectError::BuildInProgress);
        }
        let _guard = BuildGuard(&self.in_progress);

        let project_name = sanitize_project_name(project_name);
        let mut reporter = Reporter::new(events);
        tracing::info!(project = %project_name, %dimension, model = self.client.model(), "build started");

        let mut current = StageId::CoreManagers;
        let result = self
            .run_stages(&project_name, dimension, &mut reporter, cancel, &mut current)
            .await;

        match result {
            Ok(manifest) => {
                reporter.progress(100, COMPLETE_STATUS);
                reporter.emit(BuildEvent::Finished {
                    files: manifest.len(),
                });
                tracing::info!(files = manifest.len(), "build finished");
                Ok(BuildOutcome {
                    project_name,
                    manifest,
                    log: reporter.log_entries().to_vec(),
                })
            }
            Err(e) => {
                tracing::error!(stage = current.label(), error = %e, "build failed");
                reporter.log("System", &format!("Architectural Error: {e}"));
                reporter.emit(BuildEvent::Error {
                    stage: current.label().to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        project_name: &str,
        dimension: Dimension,
        reporter: &mut Reporter,
        cancel: &CancelToken,
        current: &mut StageId,
    ) -> Result<ProjectManifest> {
        let total = StageId::ALL.len();
        let mut generated = Vec::new();

        for (i, stage) in StageId::ALL.into_iter().enumerate() {
            *current = stage;
            cancel.check()?;

            reporter.emit(BuildEvent::StageStarted {
                stage: stage.label().to_string(),
                description: stage.description().to_string(),
                stage_index: i + 1,
                total_stages: total,
            });
            reporter.progress(stage.progress(), stage.status());

            let spec = PromptSpec {
                source: stage.label().to_string(),
                stage_index: i + 1,
                total_stages: total,
                description: stage.description().to_string(),
                prompt: prompts::stage_prompt(stage, project_name, dimension, &self.registry),
            };
            let files = self.client.generate(&spec, reporter, cancel).await?;

            reporter.emit(BuildEvent::StageCompleted {
                stage: stage.label().to_string(),
                files: files.len(),
            });
            generated.extend(files);
        }

        let patched = prepare_files(generated, reporter);
        let core = templates::core_files(project_name, dimension, &self.registry);
        Ok(merge(patched, &core))
    }
}

/// Normalizes paths and runs the patch engine over every generated file.
/// Files whose path cannot be made safe are dropped.
fn prepare_files(files: Vec<GeneratedFile>, reporter: &mut Reporter) -> Vec<GeneratedFile> {
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let Some(path) = normalize_project_path(&file.path) else {
            tracing::warn!(path = %file.path, "dropping file with unsafe path");
            reporter.log("System", &format!("Skipped unsafe path: {}", file.path));
            continue;
        };

        let (content, applied) = patch::patch_with_report(&path, &file.content);
        if !applied.is_empty() {
            reporter.log("patcher", &format!("{path}: {}", applied.join(", ")));
        }
        out.push(GeneratedFile::new(path, content));
    }
    out
}
