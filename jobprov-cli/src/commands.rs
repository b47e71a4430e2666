//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use jobprov_core::{
    HttpReporter, IdentityResolver, Job, LocalDirStorage, LocalFileStaging, ProvenanceConfig,
    ProvenanceError, ProvenanceService, Solution, StaticIdentityResolver, UserIdentity,
    build_activity_uri, build_output_uri, turtle,
};
use std::path::Path;
use std::sync::Arc;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, workspace, config_file).await,
        Commands::ActivityUri { job_id, server } => {
            let server = match server {
                Some(server) => server,
                None => load(workspace, config_file)?.server_url,
            };
            println!("{}", build_activity_uri(job_id, &server));
            Ok(())
        }
        Commands::OutputUri {
            job_id,
            key,
            server,
        } => {
            let server = match server {
                Some(server) => server,
                None => load(workspace, config_file)?.server_url,
            };
            println!("{}", build_output_uri(job_id, &key, &server));
            Ok(())
        }
        Commands::Start {
            job,
            solution,
            user_link,
        } => {
            let config = load(workspace, config_file)?;
            let job = read_job(&job)?;
            let solution = read_solution(&solution)?;
            let user = match user_link {
                Some(link) => UserIdentity::new(&job.user, Some(link.as_str())),
                None => StaticIdentityResolver::from(config.identity.links.clone())
                    .resolve(&job.user)
                    .await?
                    .unwrap_or_else(|| UserIdentity::new(&job.user, None)),
            };
            let service = build_service(&config)?;
            let graph = service.start_job(&job, &solution, &user).await?;
            tracing::info!(
                job_id = job.id,
                storage = %job.storage_service_id,
                file = %config.activity_file_name,
                "Stored initial activity graph"
            );
            print!("{graph}");
            Ok(())
        }
        Commands::Complete {
            job: job_path,
            no_submit,
        } => {
            let config = load(workspace, config_file)?;
            let job = read_job(&job_path)?;
            let service = build_service(&config)?;
            if no_submit {
                let graph = service.record_completion(&job).await?;
                tracing::info!(
                    job_id = job.id,
                    file = %config.activity_file_name,
                    "Stored completed activity graph without submitting"
                );
                print!("{graph}");
                return Ok(());
            }
            let done = service
                .complete_job(&job)
                .await
                .map_err(|e| with_retry_hint(e, &job, &job_path))?;
            print!("{}", done.turtle);
            eprintln!("Registry accepted report (HTTP {}).", done.status);
            Ok(())
        }
        Commands::Report { job: job_path } => {
            let config = load(workspace, config_file)?;
            let job = read_job(&job_path)?;
            let service = build_service(&config)?;
            let status = service
                .resubmit(&job)
                .await
                .map_err(|e| with_retry_hint(e, &job, &job_path))?;
            println!("Registry accepted report (HTTP {status}).");
            Ok(())
        }
        Commands::Canonicalize { file, base } => {
            let text = std::fs::read_to_string(&file)?;
            let graph = turtle::parse(&text, base.as_deref())
                .map_err(|e| anyhow::anyhow!("{}: {}", file.display(), e))?;
            print!("{}", turtle::serialize(&graph));
            Ok(())
        }
    }
}

async fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".jobprov");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let default_config = ProvenanceConfig::default();
            let toml_str = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_file)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<ProvenanceConfig> {
    let config = match config_file {
        Some(file) => jobprov_core::load_config_file(Some(workspace), file),
        None => jobprov_core::load_config(Some(workspace), None),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config.validate()?;
    Ok(config)
}

/// Wire the service to the local storage backend, the configured identity
/// table and the HTTP registry client.
fn build_service(config: &ProvenanceConfig) -> anyhow::Result<ProvenanceService> {
    let storage = LocalDirStorage::new(&config.storage_id, &config.storage_root);
    let service = ProvenanceService::new(
        config,
        Arc::new(LocalFileStaging::new(&config.staging_root)),
        Arc::new(StaticIdentityResolver::from(config.identity.links.clone())),
        Arc::new(HttpReporter::new(config.http.timeout())?),
    )?
    .with_storage(Arc::new(storage));
    Ok(service)
}

fn read_job(path: &Path) -> anyhow::Result<Job> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read job file {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Invalid job file {}: {}", path.display(), e))
}

fn read_solution(path: &Path) -> anyhow::Result<Solution> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read solution file {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Invalid solution file {}: {}", path.display(), e))
}

fn retry_command(job_path: &Path) -> String {
    format!("jobprov report --job {}", job_path.display())
}

/// On a submission failure the completed graph is already stored, so point
/// the user at the command that resends it.
fn with_retry_hint(err: ProvenanceError, job: &Job, job_path: &Path) -> anyhow::Error {
    if err.is_submission_failure() {
        let retry = retry_command(job_path);
        tracing::warn!(job_id = job.id, error = %err, retry = %retry, "Report submission failed");
        return anyhow::Error::new(err).context(format!(
            "The activity graph for job {} is stored. Retry with `{retry}`",
            job.id
        ));
    }
    anyhow::Error::new(err)
}
