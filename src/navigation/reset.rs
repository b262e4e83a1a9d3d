use super::backup::{self, file_name};
use super::seed::{apply_seed, SeedNode};
use cms_types::menu::MenuRepository;
use derive_more::{Display, Error};
use log_error::LogError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResetStep {
    Backup,
    Delete,
    Seed,
    Compensate,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Done,
    Failed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StepRecord {
    pub step: ResetStep,
    pub status: StepStatus,
    pub at: String,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Step log of one reset run, rewritten to disk after every step.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResetLog {
    pub started_at: String,
    pub backup: Option<PathBuf>,
    pub deleted: Option<usize>,
    pub seeded: Option<usize>,
    pub steps: Vec<StepRecord>,
    #[serde(skip)]
    pub path: PathBuf,
}

fn now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

impl ResetLog {
    fn new(dir: &Path) -> Self {
        let started = OffsetDateTime::now_utc();
        Self {
            started_at: started.format(&Rfc3339).unwrap_or_default(),
            backup: None,
            deleted: None,
            seeded: None,
            steps: vec![],
            path: dir.join(file_name("navigation-reset", started, "log.json")),
        }
    }

    async fn record(&mut self, step: ResetStep, status: StepStatus, detail: Option<String>) {
        match status {
            StepStatus::Done => log::info!("Reset step {step:?} done"),
            StepStatus::Failed => log::error!("Reset step {step:?} failed: {detail:?}"),
        }
        self.steps.push(StepRecord {
            step,
            status,
            at: now(),
            detail,
        });
        self.persist().await.log_error("Unable to write reset log");
    }

    async fn persist(&self) -> Result<(), anyhow::Error> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(self)?).await?;
        Ok(())
    }
}

#[derive(Debug, Display, Error)]
pub enum ResetError {
    #[error(ignore)]
    #[display("Backup failed, nothing was deleted: {_0:#}")]
    BackupFailed(anyhow::Error),
    #[error(ignore)]
    #[display("Unable to delete menu nodes (backup {backup:?}): {cause:#}")]
    DeleteFailed { backup: PathBuf, cause: anyhow::Error },
    #[error(ignore)]
    #[display("Seeding failed (backup {backup:?}, restored: {compensated}): {cause:#}")]
    SeedFailed {
        backup: PathBuf,
        compensated: bool,
        cause: anyhow::Error,
    },
}

/// Backs the menu up, deletes every node and recreates `seed`.
///
/// Nothing is deleted unless the backup was written. If seeding fails after the
/// delete, the partial seed is cleared and the fresh backup is restored.
pub async fn reset(
    repo: &dyn MenuRepository,
    dir: &Path,
    seed: &[SeedNode],
) -> Result<ResetLog, ResetError> {
    let mut journal = ResetLog::new(dir);
    log::info!("Reset log: {}", journal.path.display());

    let backup = match backup::backup(repo, dir).await {
        Ok(path) => {
            journal.backup = Some(path.clone());
            let detail = path.display().to_string();
            journal.record(ResetStep::Backup, StepStatus::Done, Some(detail)).await;
            path
        }
        Err(err) => {
            let detail = format!("{err:#}");
            journal.record(ResetStep::Backup, StepStatus::Failed, Some(detail)).await;
            return Err(ResetError::BackupFailed(err));
        }
    };

    match repo.clear().await {
        Ok(deleted) => {
            journal.deleted = Some(deleted);
            let detail = format!("{deleted} nodes");
            journal.record(ResetStep::Delete, StepStatus::Done, Some(detail)).await;
        }
        Err(cause) => {
            let detail = format!("{cause:#}");
            journal.record(ResetStep::Delete, StepStatus::Failed, Some(detail)).await;
            return Err(ResetError::DeleteFailed { backup, cause });
        }
    }

    match apply_seed(repo, seed).await {
        Ok(seeded) => {
            journal.seeded = Some(seeded);
            let detail = format!("{seeded} nodes");
            journal.record(ResetStep::Seed, StepStatus::Done, Some(detail)).await;
            Ok(journal)
        }
        Err(cause) => {
            let detail = format!("{cause:#}");
            journal.record(ResetStep::Seed, StepStatus::Failed, Some(detail)).await;
            let compensated = match compensate(repo, &backup).await {
                Ok(restored) => {
                    let detail = format!("{restored} nodes restored");
                    journal.record(ResetStep::Compensate, StepStatus::Done, Some(detail)).await;
                    true
                }
                Err(err) => {
                    let detail = format!("{err:#}");
                    journal.record(ResetStep::Compensate, StepStatus::Failed, Some(detail)).await;
                    false
                }
            };
            Err(ResetError::SeedFailed {
                backup,
                compensated,
                cause,
            })
        }
    }
}

async fn compensate(repo: &dyn MenuRepository, backup: &Path) -> Result<usize, anyhow::Error> {
    repo.clear().await?;
    let report = backup::restore_file(repo, backup).await?;
    Ok(report.created)
}
