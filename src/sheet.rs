use std::fmt::{Display, Formatter};
use std::str::FromStr;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::job::{self, Environment};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid project: '{0}'")]
    InvalidProject(String),

    #[error("invalid environment: '{0}'")]
    InvalidEnvironment(String),

    #[error("the artifact '{artifact}' has no entry in sheet {sheet}")]
    ArtifactNotFound { artifact: String, sheet: ReleaseSheet },

    #[error("google sheets: {0}")]
    Google(#[from] crate::google::Error),
}

/// Acknowledgement of a value update, as returned by the Sheets API.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub spreadsheet_id: String,
    pub updated_range: Option<String>,
    pub updated_rows: Option<u32>,
    pub updated_columns: Option<u32>,
    pub updated_cells: Option<u32>,
}

/// The release tracking spreadsheet.
#[async_trait]
pub trait Spreadsheet {
    /// Read `range` column by column: each inner list is one column.
    async fn read_columns(&self, range: &str) -> Result<Vec<Vec<serde_json::Value>>, crate::google::Error>;

    /// Write a single raw value into `range`.
    async fn write_raw(&self, range: &str, value: &str) -> Result<UpdateValuesResponse, crate::google::Error>;
}

/// Sheets of the release spreadsheet, one per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseSheet {
    DaasRelease,
    MediaPortal,
    Mp2Cloud,
}

impl ReleaseSheet {
    pub fn name(&self) -> &'static str {
        match self {
            ReleaseSheet::DaasRelease => "DaaS_Release",
            ReleaseSheet::MediaPortal => "MediaPortal",
            ReleaseSheet::Mp2Cloud => "MP2Cloud",
        }
    }
}

impl Display for ReleaseSheet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReleaseSheet {
    type Err = Error;

    /// Sheet holding the releases of a project key. Keys are case-insensitive.
    fn from_str(project: &str) -> Result<Self, Self::Err> {
        match project.to_lowercase().as_str() {
            "daas" => Ok(ReleaseSheet::DaasRelease),
            "mp" => Ok(ReleaseSheet::MediaPortal),
            "mp2cloud" => Ok(ReleaseSheet::Mp2Cloud),
            _ => Err(Error::InvalidProject(project.to_string())),
        }
    }
}

/// Column holding the versions deployed to an environment.
pub fn column(environment: Environment) -> char {
    match environment {
        Environment::Dev => 'B',
        Environment::Uat => 'C',
        Environment::Prod => 'D',
    }
}

/// A single cell, rendered as `Sheet!C14`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRef {
    pub sheet: ReleaseSheet,
    pub column: char,
    pub row: usize,
}

impl Display for CellRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}!{}{}", self.sheet, self.column, self.row)
    }
}

/// Row of `artifact` in the first column of a column-major listing.
pub fn find_row(columns: &[Vec<serde_json::Value>], artifact: &str) -> Option<usize> {
    columns
        .first()?
        .iter()
        .position(|cell| cell.as_str() == Some(artifact))
        .map(|index| index + 1)
}

/// Look up the row of `artifact` in the index range of `sheet`.
pub async fn row<S>(spreadsheet: &S, sheet: ReleaseSheet, index_range: &str, artifact: &str) -> Result<usize, Error>
where
    S: Spreadsheet + Sync + ?Sized,
{
    let range = format!("{sheet}!{index_range}");
    debug!("Reading artifact index {range}");
    let columns = spreadsheet.read_columns(&range).await?;
    find_row(&columns, artifact).ok_or_else(|| Error::ArtifactNotFound {
        artifact: artifact.to_string(),
        sheet,
    })
}

/// Resolve the cell that tracks `artifact` of `project` in `environment`.
///
/// Project and environment are validated before the spreadsheet is read.
pub async fn resolve<S>(
    spreadsheet: &S,
    index_range: &str,
    project: &str,
    environment: &str,
    artifact: &str,
) -> Result<CellRef, Error>
where
    S: Spreadsheet + Sync + ?Sized,
{
    let sheet: ReleaseSheet = project.parse()?;
    let column = column(environment.parse::<Environment>().map_err(|err| match err {
        job::Error::InvalidEnvironment(key) => Error::InvalidEnvironment(key),
    })?);
    let row = row(spreadsheet, sheet, index_range, artifact).await?;
    let cell = CellRef { sheet, column, row };
    info!("Resolved cell {cell} for {artifact}");
    Ok(cell)
}

/// Record `semantic_version` in `cell`.
pub async fn write<S>(spreadsheet: &S, cell: &CellRef, semantic_version: &str) -> Result<UpdateValuesResponse, Error>
where
    S: Spreadsheet + Sync + ?Sized,
{
    let response = spreadsheet.write_raw(&cell.to_string(), semantic_version).await?;
    info!("{}", serde_json::to_string(&response).unwrap_or_default());
    Ok(response)
}
