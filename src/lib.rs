//! Update deploy info
//!
//! Build step that records the semantic version of a freshly built artifact
//! in the release tracking spreadsheet.
//!
//! 1. derive project, environment and branch from the build job name
//! 2. take the build number from the version path
//! 3. list `<project>/<artifact>/<branch>/<build number>/` in the artifact bucket
//!    and read the semantic version off the last object's file name
//! 4. resolve the cell `<sheet>!<column><row>` for project, environment and artifact
//! 5. write the semantic version into that cell

pub mod artifact;
pub mod config;
pub mod google;
pub mod job;
pub mod pipeline;
pub mod s3;
pub mod sheet;
pub mod version;
