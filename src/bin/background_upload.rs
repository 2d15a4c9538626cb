//! One isolated upload pass, scheduled by the OS. Reads only the shared
//! key-value store; never opens the foreground app's local queue database.
//!
//! Exits 0 even when there is nothing to do or the remote is unreachable --
//! schedulers penalize tasks that keep failing, and a missing snapshot is the
//! expected common case, not an error.

use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf, sync::Arc};
use wayline::{
    shared::config::AppConfig, BackgroundUploadTask, FileSharedState, HttpRemoteStore, RunOutcome,
    StaticAuthProvider,
};

#[derive(Debug, Clone)]
struct CliOptions {
    shared_dir: Option<PathBuf>,
    namespace: Option<String>,
}

fn usage() -> &'static str {
    "Usage: background_upload [--shared-dir <path>] [--namespace <name>]"
}

fn parse_args() -> Result<CliOptions> {
    let mut options = CliOptions {
        shared_dir: None,
        namespace: None,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--shared-dir" => {
                let value = args.next().context(usage())?;
                options.shared_dir = Some(PathBuf::from(value));
            }
            "--namespace" => {
                options.namespace = Some(args.next().context(usage())?);
            }
            "--help" | "-h" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("Unknown argument {other:?}\n{}", usage()),
        }
    }

    Ok(options)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    wayline::init_logging();

    let options = parse_args()?;
    let config = AppConfig::default();

    let shared_dir = options
        .shared_dir
        .or_else(|| env::var("WAYLINE_SHARED_DIR").ok().map(PathBuf::from))
        .unwrap_or(config.handoff.shared_dir);
    let namespace = options
        .namespace
        .or_else(|| env::var("WAYLINE_NAMESPACE").ok())
        .unwrap_or(config.handoff.namespace);

    let shared = Arc::new(FileSharedState::new(shared_dir, namespace));

    // The credential travels in the snapshot; this provider only exists to
    // satisfy the client constructor and is never asked to mint.
    let placeholder = StaticAuthProvider::new(wayline::CredentialSnapshot {
        access_token: String::new(),
        owner_id: wayline::OwnerId::parse("background").expect("static owner id"),
        remote_base_url: config.remote.base_url.clone(),
        minted_at: chrono::Utc::now(),
    });
    let remote = Arc::new(
        HttpRemoteStore::new(config.remote, Arc::new(placeholder))
            .context("Building remote store client")?,
    );

    let task = BackgroundUploadTask::new(shared, remote);
    let report = task
        .run_once()
        .await
        .context("Background upload pass hit an unexpected error")?;

    match report.outcome {
        RunOutcome::Uploaded { count } => {
            println!("uploaded {count} records ({} skipped)", report.skipped_invalid);
        }
        RunOutcome::PartialFailure { uploaded, failed } => {
            println!("partial failure: {uploaded} uploaded, {failed} failed; nothing cleared");
        }
        RunOutcome::NoSnapshot | RunOutcome::NoCredential => {
            println!("nothing to do");
        }
        RunOutcome::NothingToUpload => {
            println!(
                "no valid records ({} examined, {} skipped)",
                report.examined, report.skipped_invalid
            );
        }
        RunOutcome::RemoteUnavailable => {
            println!("remote unavailable; left snapshot for next run");
        }
    }

    Ok(())
}
