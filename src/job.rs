use std::fmt::{Display, Formatter};
use std::str::FromStr;
use log::warn;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid environment: '{0}'")]
    InvalidEnvironment(String),
}

/// Deployment stage a build job targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Uat,
    Prod,
}

impl Environment {
    /// Marker substrings searched for in a job name, in scan order.
    const MARKERS: [(&'static str, Environment); 3] = [
        ("env-dev", Environment::Dev),
        ("env-uat", Environment::Uat),
        ("env-prod", Environment::Prod),
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Uat => "uat",
            Environment::Prod => "prod",
        }
    }

    /// Source branch that is built for this environment.
    pub fn branch(&self) -> &'static str {
        match self {
            Environment::Dev => "develop",
            Environment::Uat | Environment::Prod => "master",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(environment: &str) -> Result<Self, Self::Err> {
        match environment {
            "dev" => Ok(Environment::Dev),
            "uat" => Ok(Environment::Uat),
            "prod" => Ok(Environment::Prod),
            _ => Err(Error::InvalidEnvironment(environment.to_string())),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Detect the environment from the markers in a job name.
///
/// Every marker is checked, so when a job name carries several of them the
/// last one in scan order wins.
pub fn detect_environment(job_name: &str) -> Option<Environment> {
    Environment::MARKERS
        .iter()
        .filter(|(marker, _)| job_name.contains(marker))
        .map(|(_, environment)| *environment)
        .last()
}

/// Branch for a detected environment, or the empty string when there is none.
pub fn branch(environment: Option<Environment>) -> &'static str {
    environment.map(|e| e.branch()).unwrap_or_default()
}

/// Project key: the first path segment of the job name, lowercased.
pub fn project(job_name: &str, delimiter: &str) -> String {
    job_name
        .split(delimiter)
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Everything derived from a job name for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentTarget {
    pub project: String,
    pub environment: Option<Environment>,
    pub branch: &'static str,
}

impl DeploymentTarget {
    pub fn from_job_name(job_name: &str, delimiter: &str) -> Self {
        let environment = detect_environment(job_name);
        if environment.is_none() {
            warn!("Environment not detected or is invalid in job name '{job_name}'");
        }
        Self {
            project: project(job_name, delimiter),
            environment,
            branch: branch(environment),
        }
    }

    /// Environment key as understood by the cell resolver. Empty when undetected.
    pub fn environment_key(&self) -> &'static str {
        self.environment.map(|e| e.key()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_marker() {
        for (job, environment, branch_name) in [
            ("mp/env-dev/feature-x", Environment::Dev, "develop"),
            ("daas/env-uat/service", Environment::Uat, "master"),
            ("MP2Cloud/env-prod/deploy", Environment::Prod, "master"),
        ] {
            let detected = detect_environment(job);
            assert_eq!(detected, Some(environment), "{job}");
            assert_eq!(branch(detected), branch_name, "{job}");
        }
    }

    #[test]
    fn parse_environment_key() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("uat".parse::<Environment>().unwrap(), Environment::Uat);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        for key in [Environment::Dev, Environment::Uat, Environment::Prod] {
            assert_eq!(key.key().parse::<Environment>().unwrap(), key);
        }
        assert!(matches!("".parse::<Environment>(), Err(Error::InvalidEnvironment(e)) if e.is_empty()));
        assert!(matches!("Dev".parse::<Environment>(), Err(Error::InvalidEnvironment(_))));
    }

    #[test]
    fn no_marker() {
        let detected = detect_environment("mp/staging/feature-x");
        assert_eq!(detected, None);
        assert_eq!(branch(detected), "");
    }

    #[test]
    fn last_marker_in_scan_order_wins() {
        assert_eq!(detect_environment("env-prod/env-dev"), Some(Environment::Prod));
        assert_eq!(detect_environment("env-uat/env-dev"), Some(Environment::Uat));
    }

    #[test]
    fn branch_ignores_unrelated_branch_tokens() {
        let target = DeploymentTarget::from_job_name("mp/env-dev/master", "/");
        assert_eq!(target.branch, "develop");
    }

    #[test]
    fn target_from_job_name() {
        let target = DeploymentTarget::from_job_name("MP/env-uat/release", "/");
        assert_eq!(target.project, "mp");
        assert_eq!(target.environment, Some(Environment::Uat));
        assert_eq!(target.environment_key(), "uat");
        assert_eq!(target.branch, "master");

        let unknown = DeploymentTarget::from_job_name("", "/");
        assert_eq!(unknown.project, "");
        assert_eq!(unknown.environment_key(), "");
        assert_eq!(unknown.branch, "");
    }
}
