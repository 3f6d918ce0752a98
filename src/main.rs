//! udi: update deploy info
use clap::{Parser, Subcommand};
use log::error;
use update_deploy_info::config;
use update_deploy_info::google::Sheets;
use update_deploy_info::pipeline::{self, BuildContext, Error, Plan};
use update_deploy_info::s3::{Bucket, StaticCredentials};

/// Record the semantic version of a built artifact in the release spreadsheet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long)]
    config: Option<String>,

    /// Name of the build job, e.g. `mp/env-dev/feature-x`.
    #[arg(long, env = "JOB_NAME")]
    job_name: String,

    /// Artifact name as listed in the first column of the release spreadsheet.
    #[arg(long, env = "ARTIFACT")]
    artifact: String,

    /// Path ending in the build number, e.g. `builds/42`.
    #[arg(long, env = "version", default_value = "")]
    version_path: String,

    /// Google service account credentials file.
    /// Application default credentials are used when omitted.
    #[arg(long, env = "client_json_path")]
    client_json_path: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret_access_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the project, environment, branch and storage prefix derived from the job.
    Target,
    /// Print the semantic version of the artifact found in storage.
    Version,
    /// Print the spreadsheet cell that tracks the artifact, without writing to it.
    Cell,
    /// Write the semantic version of the artifact into the release spreadsheet.
    Update,
}

impl Cli {
    fn build_context(&self) -> BuildContext {
        BuildContext {
            job_name: self.job_name.clone(),
            version_path: self.version_path.clone(),
            artifact: self.artifact.clone(),
        }
    }

    fn storage_credentials(&self) -> Option<StaticCredentials> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            }),
            _ => None,
        }
    }
}

/// Read configuration file from disk and merge it with the
/// `default.toml` [built-in config](../default.toml).
///
/// If a configuration file name is not set explicitly, this function will
/// detect whether a config file with the default file name exists in the
/// working directory. If it does, it is used implicitly.
fn read_config(args: &Cli) -> Result<config::File, Error> {
    let config_file = match &args.config {
        None => {
            if std::fs::metadata(config::DEFAULT_CONFIG_FILE)
                .map(|metadata| metadata.is_file())
                .unwrap_or(false)
            {
                Some(config::DEFAULT_CONFIG_FILE.to_string())
            } else {
                None
            }
        }
        Some(c) => Some(c.clone()),
    };

    Ok(if let Some(config_file) = config_file {
        config::File::default_with_user_config_file(&config_file)?
    } else {
        config::File::default()
    })
}

/// Everything a run needs that can be checked without touching the network:
/// configuration, build context and the derived plan.
fn prepare(args: &Cli) -> Result<(config::File, BuildContext, Plan), Error> {
    let cfg = read_config(args)?;
    let ctx = args.build_context();
    let plan = ctx.plan(&cfg.storage.delimiter)?;
    Ok((cfg, ctx, plan))
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            error!("fatal: {}", err.to_string());
            std::process::exit(1)
        }
    }
}

async fn run() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let (cfg, ctx, plan) = prepare(&args)?;
    let delimiter = cfg.storage.delimiter.as_str();

    match args.command {
        Commands::Target => {
            println!("project: {}", plan.target.project);
            println!("environment: {}", plan.target.environment_key());
            println!("branch: {}", plan.target.branch);
            println!("build version: {}", plan.build_version);
            println!("prefix: {}", plan.prefix);
            Ok(())
        }
        Commands::Version => {
            let bucket = Bucket::connect(&cfg.storage.bucket, &cfg.storage.region, args.storage_credentials()).await;
            println!("{}", pipeline::semantic_version(&plan, &bucket, delimiter).await?);
            Ok(())
        }
        Commands::Cell => {
            let sheets = Sheets::connect(&cfg.spreadsheet.id, args.client_json_path.as_deref()).await?;
            println!("{}", pipeline::cell(&ctx, &plan, &sheets, &cfg.spreadsheet.index_range).await?);
            Ok(())
        }
        Commands::Update => {
            let bucket = Bucket::connect(&cfg.storage.bucket, &cfg.storage.region, args.storage_credentials()).await;
            let sheets = Sheets::connect(&cfg.spreadsheet.id, args.client_json_path.as_deref()).await?;
            pipeline::update_release_sheet(
                &ctx,
                &plan,
                delimiter,
                &cfg.spreadsheet.index_range,
                &bucket,
                &sheets,
            ).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use super::{prepare, Cli, Error};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("udi").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn blank_artifact_is_rejected_before_connecting() {
        let args = cli(&["--job-name", "mp/env-dev/feature-x", "--artifact", "  ", "update"]);
        assert!(matches!(prepare(&args), Err(Error::BlankArtifact)));
    }

    #[test]
    fn prepare_derives_plan() {
        let args = cli(&[
            "--job-name", "mp/env-dev/feature-x",
            "--artifact", "mp-api-node",
            "--version-path", "builds/42",
            "update",
        ]);
        let (cfg, ctx, plan) = prepare(&args).unwrap();
        assert_eq!(cfg.storage.delimiter, "/");
        assert_eq!(ctx.artifact, "mp-api-node");
        assert_eq!(plan.prefix, "mp/mp-api-node/develop/42/");
    }
}
