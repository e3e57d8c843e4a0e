use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use atlcli_sync::config::Config;
use atlcli_sync::error::SyncError;
use atlcli_sync::format_codec::MarkdownStorageCodec;
use atlcli_sync::logging;
use atlcli_sync::reconcile::{ReconciliationEngine, WebhookScopeFilter};
use atlcli_sync::remote::MockRemoteStore;
use atlcli_sync::types::{Accept, OnConflict, Scope};

#[derive(Parser)]
#[command(name = "atlcli-sync", version, about = "2-way directory/wiki sync utility")]
struct Cli {
	/// Profile to use from the directory's configuration.
	#[arg(short, long, default_value = "default")]
	profile: String,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Bind a directory to a remote space.
	Init {
		dir: PathBuf,
		#[arg(long)]
		space: String,
		#[arg(long)]
		base_url: String,
	},
	/// One-shot fetch of remote pages into the tracked directory.
	Pull {
		dir: PathBuf,
		/// Overwrite local changes instead of skipping diverged files.
		#[arg(long)]
		force: bool,
	},
	/// One-shot upload of locally changed tracked files.
	Push { dir: PathBuf },
	/// Register an untracked file as a new remote page.
	Add {
		file: PathBuf,
		#[arg(long)]
		title: Option<String>,
		#[arg(long)]
		parent_id: Option<String>,
	},
	/// Run the reconciliation daemon until interrupted.
	Sync {
		dir: PathBuf,
		#[arg(long, default_value = "merge")]
		on_conflict: String,
		#[arg(long)]
		webhook_port: Option<u16>,
		#[arg(long)]
		dry_run: bool,
	},
	/// Report per-file sync state without mutating anything.
	Status { dir: PathBuf },
	/// Resolve a conflicted file by accepting local, remote, or a manual merge.
	Resolve {
		file: PathBuf,
		#[arg(long, default_value = "merged")]
		accept: String,
	},
}

fn parse_accept(s: &str) -> Result<Accept, SyncError> {
	match s {
		"local" => Ok(Accept::Local),
		"remote" => Ok(Accept::Remote),
		"merged" => Ok(Accept::Merged),
		other => Err(SyncError::Usage { message: format!("unrecognized --accept value: {}", other) }),
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	logging::init_tracing();
	let cli = Cli::parse();

	// A real deployment would construct its RemoteStore from `--profile`'s
	// stored credentials; this CLI wires in the in-memory mock so the binary
	// is runnable without a live wiki.
	let remote = Arc::new(MockRemoteStore::new());
	let codec = Arc::new(MarkdownStorageCodec);

	let result = run(cli, remote, codec).await;
	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("error: {}", e);
			match e {
				SyncError::Usage { .. } => ExitCode::from(2),
				_ => ExitCode::FAILURE,
			}
		}
	}
}

async fn run(
	cli: Cli,
	remote: Arc<MockRemoteStore>,
	codec: Arc<MarkdownStorageCodec>,
) -> Result<(), SyncError> {
	match cli.command {
		Commands::Init { dir, space, base_url } => {
			let engine = ReconciliationEngine::new(dir, remote, codec, Config::default());
			engine.init(&space, &base_url, &cli.profile).await?;
			println!("initialized");
		}
		Commands::Pull { dir, force } => {
			let engine = ReconciliationEngine::new(dir, remote, codec, Config::default());
			let actions = engine.pull(Scope::Space, force).await?;
			for action in actions {
				println!("{:?}", action);
			}
		}
		Commands::Push { dir } => {
			let engine = ReconciliationEngine::new(dir, remote, codec, Config::default());
			let actions = engine.push().await?;
			for action in actions {
				println!("{:?}", action);
			}
		}
		Commands::Add { file, title, parent_id } => {
			let dir = file.parent().unwrap_or(&file).to_path_buf();
			let engine = ReconciliationEngine::new(dir, remote, codec, Config::default());
			let id = engine.add(&file, title, parent_id).await?;
			println!("created {}", id);
		}
		Commands::Sync { dir, on_conflict, webhook_port, dry_run } => {
			let on_conflict: OnConflict = on_conflict
				.parse()
				.map_err(|message| SyncError::Usage { message })?;
			let config = Config { on_conflict, dry_run, webhook_port, ..Config::default() };
			let engine = Arc::new(ReconciliationEngine::new(dir, remote, codec, config));

			atlcli_sync::utils::setup_signal_handlers();
			let (_shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
			let webhook = webhook_port.map(|port| (port, WebhookScopeFilter::default()));
			engine.sync(Scope::Space, webhook, shutdown_rx).await?;
		}
		Commands::Status { dir } => {
			let engine = ReconciliationEngine::new(dir, remote, codec, Config::default());
			let report = engine.status().await?;
			println!(
				"synced: {}, local-modified: {}, remote-modified: {}, conflict: {}",
				report.synced, report.local_modified, report.remote_modified, report.conflict
			);
		}
		Commands::Resolve { file, accept } => {
			let accept = parse_accept(&accept)?;
			let dir = file.parent().unwrap_or(&file).to_path_buf();
			let engine = ReconciliationEngine::new(dir, remote, codec, Config::default());
			engine.resolve(&file, accept).await?;
			println!("resolved");
		}
	}
	Ok(())
}

// vim: ts=4
