//! `wiki-anchors` - keep wiki comment anchors in step with page edits

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wiki_anchors_config::Config;
use wiki_anchors_engine::{
    Administration, Commenter, DiffSource, EditScript, Interval, MemoryStore, NewComment,
    RemapLimits, io, unix_now,
};

#[derive(Parser, Debug)]
#[command(name = "wiki-anchors")]
#[command(about = "Keep comment anchors on wiki pages in step with page edits")]
struct Cli {
    /// Config file (defaults to ~/.config/wiki-anchors/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Anchor store, overriding the config's store_path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the edit script between two versions of a page as JSON
    Diff { old: PathBuf, new: PathBuf },

    /// Move a page's anchors through an edit
    Remap {
        /// Page path, e.g. /basic/intro/
        path: String,

        /// JSON edit script
        #[arg(long, conflicts_with_all = ["old", "new"])]
        script: Option<PathBuf>,

        /// Page text before the edit
        #[arg(long, requires = "new")]
        old: Option<PathBuf>,

        /// Page text after the edit
        #[arg(long, requires = "old")]
        new: Option<PathBuf>,
    },

    /// Re-key a page's anchors under a new path
    Rename { from: String, to: String },

    /// Post a comment on [START, END) of a page
    Comment {
        path: String,
        start: i64,
        end: i64,
        body: String,

        /// Commenter name
        #[arg(long)]
        name: Option<String>,
    },

    /// Print a page's comments grouped by anchor as JSON
    Comments { path: String },

    /// Record or compare the site revision the anchors refer to
    CommitHash {
        #[command(subcommand)]
        action: CommitHashAction,
    },

    /// List pages that have anchors
    Paths,
}

#[derive(Subcommand, Debug)]
enum CommitHashAction {
    Set { hash: String },
    /// Exit non-zero unless the stored hash equals HASH
    Check { hash: String },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .log_filter
                    .as_deref()
                    .unwrap_or("wiki_anchors=info")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path.clone());
    debug!(store = %store_path.display(), config = %config_path.display(), "starting");

    run(cli.command, &config, &store_path)
}

fn diff_source(config: &Config) -> DiffSource {
    match config.diff_timeout_ms {
        Some(ms) => DiffSource::new().with_timeout(Duration::from_millis(ms)),
        None => DiffSource::new(),
    }
}

fn open(config: &Config, store_path: &Path) -> Result<Administration<MemoryStore>> {
    let store = io::load_store(store_path)
        .with_context(|| format!("loading anchor store {}", store_path.display()))?;
    Ok(Administration::new(store)
        .with_limits(RemapLimits {
            max_edit_ops: config.max_edit_ops,
        })
        .with_diff_source(diff_source(config)))
}

fn save(admin: Administration<MemoryStore>, store_path: &Path) -> Result<()> {
    io::save_store(store_path, &admin.into_store())
        .with_context(|| format!("saving anchor store {}", store_path.display()))
}

fn run(command: Commands, config: &Config, store_path: &Path) -> Result<ExitCode> {
    match command {
        Commands::Diff { old, new } => {
            let script = diff_source(config).diff(&io::read_text(&old)?, &io::read_text(&new)?);
            println!("{}", serde_json::to_string_pretty(&script)?);
        }
        Commands::Remap {
            path,
            script,
            old,
            new,
        } => {
            let admin = open(config, store_path)?;
            let summary = match (script, old, new) {
                (Some(script), _, _) => {
                    let script: EditScript = io::read_edit_script(&script)?;
                    admin.modify_comments(&path, &script)?
                }
                (None, Some(old), Some(new)) => admin.modify_comments_between(
                    &path,
                    &io::read_text(&old)?,
                    &io::read_text(&new)?,
                )?,
                _ => bail!("remap needs --script or both --old and --new"),
            };
            save(admin, store_path)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Rename { from, to } => {
            let admin = open(config, store_path)?;
            admin.rename(&from, &to)?;
            save(admin, store_path)?;
        }
        Commands::Comment {
            path,
            start,
            end,
            body,
            name,
        } => {
            let admin = open(config, store_path)?;
            let id = admin.with_store_mut(|store| {
                store.post_comment(
                    NewComment {
                        path: path.clone(),
                        interval: Interval::new(start, end),
                        commenter: Commenter {
                            name,
                            ..Commenter::default()
                        },
                        body,
                    },
                    unix_now(),
                )
            })?;
            save(admin, store_path)?;
            info!(%path, start, end, "posted comment");
            println!("{}", serde_json::to_string(&id)?);
        }
        Commands::Comments { path } => {
            let admin = open(config, store_path)?;
            let threads: Vec<_> = admin.with_store(|store| {
                store
                    .comments_by_interval(&path)
                    .into_iter()
                    .map(|(interval, comments)| {
                        serde_json::json!({ "interval": interval, "comments": comments })
                    })
                    .collect()
            });
            println!("{}", serde_json::to_string_pretty(&threads)?);
        }
        Commands::CommitHash { action } => {
            let admin = open(config, store_path)?;
            match action {
                CommitHashAction::Set { hash } => {
                    admin.set_commit_hash(&hash);
                    save(admin, store_path)?;
                }
                CommitHashAction::Check { hash } => {
                    if !admin.commit_hash_matches(&hash) {
                        let stored = admin.commit_hash();
                        eprintln!(
                            "Stored commit hash {} does not match {hash}",
                            stored.as_deref().unwrap_or("(none)")
                        );
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
        Commands::Paths => {
            let admin = open(config, store_path)?;
            for path in admin.with_store(MemoryStore::paths) {
                println!("{path}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
