use log::info;
use thiserror::Error;
use crate::artifact::{self, ObjectStore};
use crate::job::DeploymentTarget;
use crate::sheet::{self, CellRef, Spreadsheet, UpdateValuesResponse};
use crate::version;

#[derive(Error, Debug)]
pub enum Error {
    #[error("artifact must not be blank")]
    BlankArtifact,

    #[error("configuration: {0}")]
    Config(#[from] crate::config::Error),

    #[error("artifact storage: {0}")]
    Artifact(#[from] artifact::Error),

    #[error("release spreadsheet: {0}")]
    Sheet(#[from] sheet::Error),

    #[error("google cloud: {0}")]
    Google(#[from] crate::google::Error),
}

/// Inputs handed over by the build system for one run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Name of the build job, e.g. `mp/env-dev/feature-x`.
    pub job_name: String,
    /// Path whose last numeric segment is the build number, e.g. `builds/42`.
    pub version_path: String,
    /// Artifact tracked in the release spreadsheet, e.g. `mp-api-node`.
    pub artifact: String,
}

/// Where the build outputs of a run live and which build they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub target: DeploymentTarget,
    pub build_version: String,
    pub prefix: String,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub cell: CellRef,
    pub semantic_version: String,
    pub response: UpdateValuesResponse,
}

impl BuildContext {
    /// Derive the deployment target, build number and storage prefix. No I/O.
    pub fn plan(&self, delimiter: &str) -> Result<Plan, Error> {
        if self.artifact.trim().is_empty() {
            return Err(Error::BlankArtifact);
        }
        let target = DeploymentTarget::from_job_name(&self.job_name, delimiter);
        let build_version = version::build_version(&self.version_path);
        let prefix = artifact::storage_prefix(
            &target.project,
            &self.artifact,
            target.branch,
            &build_version,
            delimiter,
        );
        info!("Project detected: {}", target.project);
        info!("Environment detected: {}", target.environment_key());
        info!("Storage prefix: {prefix}");
        Ok(Plan { target, build_version, prefix })
    }
}

/// Find the semantic version of the artifact built in this run.
pub async fn semantic_version<S>(plan: &Plan, store: &S, delimiter: &str) -> Result<String, Error>
where
    S: ObjectStore + Sync + ?Sized,
{
    let semantic_version = artifact::locate(store, &plan.prefix, delimiter).await?;
    info!("Semantic version in storage: {semantic_version}");
    Ok(semantic_version)
}

/// Resolve the spreadsheet cell tracking the artifact in the detected environment.
pub async fn cell<W>(ctx: &BuildContext, plan: &Plan, spreadsheet: &W, index_range: &str) -> Result<CellRef, Error>
where
    W: Spreadsheet + Sync + ?Sized,
{
    Ok(sheet::resolve(
        spreadsheet,
        index_range,
        &plan.target.project,
        plan.target.environment_key(),
        &ctx.artifact,
    ).await?)
}

/// Run the whole build step once: locate the artifact's semantic version in
/// storage and record it in the release spreadsheet.
///
/// `plan` comes from [`BuildContext::plan`], so input errors surface before
/// any client is connected. Stages run strictly one after another. A failed
/// storage listing or an unresolvable cell ends the run before anything is
/// written.
pub async fn update_release_sheet<S, W>(
    ctx: &BuildContext,
    plan: &Plan,
    delimiter: &str,
    index_range: &str,
    store: &S,
    spreadsheet: &W,
) -> Result<Outcome, Error>
where
    S: ObjectStore + Sync + ?Sized,
    W: Spreadsheet + Sync + ?Sized,
{
    let semantic_version = semantic_version(plan, store, delimiter).await?;
    let cell = cell(ctx, plan, spreadsheet, index_range).await?;
    let response = sheet::write(spreadsheet, &cell, &semantic_version).await?;

    info!(
        "Setting semantic version: {} for: {} of project: {} at: {}",
        semantic_version,
        ctx.artifact,
        plan.target.project,
        plan.target.environment_key(),
    );

    Ok(Outcome { cell, semantic_version, response })
}
