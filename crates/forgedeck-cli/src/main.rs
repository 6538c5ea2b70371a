//! forgedeck CLI - drive a remote autonomous-build service from a terminal.
//!
//! `build` runs the full session flow (create, start, poll, final file
//! listing), streaming controller events to stdout. The remaining commands
//! are one-shot queries against the service.

use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use forgedeck_core::{
    config, BuildEvent, BuildService, ForgedeckContext, HttpBuildService, LogEntry, LogLevel,
    ProjectId,
};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(
    name = "forgedeck",
    about = "Control deck for a remote autonomous-build service",
    version
)]
struct Cli {
    /// Base URL of the build service. Falls back to FORGEDECK_API_URL,
    /// then http://localhost:8000.
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a project idea and watch the build through to its end
    Build {
        /// The project idea, free text
        #[arg(required = true)]
        description: Vec<String>,
    },
    /// Show a project's current status and detail
    Status { project_id: String },
    /// Print a project's build log
    Logs { project_id: String },
    /// List the files a build produced
    Files { project_id: String },
    /// Print one generated file
    Cat { project_id: String, path: String },
    /// Create or overwrite a generated file
    Put {
        project_id: String,
        path: String,
        /// Local file to read; stdin when omitted
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Check service health
    Health,
    /// Show the service's agent roster
    Agents,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let api_url = cli.api_url.unwrap_or_else(config::api_url_from_env);
    let client = HttpBuildService::new(&api_url);

    match cli.command {
        Command::Build { description } => watch_build(&api_url, &description.join(" ")),
        Command::Status { project_id } => {
            let detail = client.fetch_project(&ProjectId(project_id))?;
            println!("{}  {}", detail.id, detail.name);
            println!("status: {}", detail.status);
            if let Some(created_at) = &detail.created_at {
                println!("created: {created_at}");
            }
            println!("{}", detail.description);
            Ok(())
        }
        Command::Logs { project_id } => {
            for entry in client.fetch_logs(&ProjectId(project_id))? {
                println!("{}", format_entry(&entry));
            }
            Ok(())
        }
        Command::Files { project_id } => {
            for path in client.list_files(&ProjectId(project_id))? {
                println!("{path}");
            }
            Ok(())
        }
        Command::Cat { project_id, path } => {
            print!("{}", client.fetch_file(&ProjectId(project_id), &path));
            Ok(())
        }
        Command::Put {
            project_id,
            path,
            from,
        } => {
            let content = match from {
                Some(local) => std::fs::read_to_string(local)?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            client.write_file(&ProjectId(project_id), &path, &content)?;
            println!("wrote {path}");
            Ok(())
        }
        Command::Health => {
            let health = client.health()?;
            println!(
                "{} ({} agents) at {}",
                health.status, health.agents, health.timestamp
            );
            Ok(())
        }
        Command::Agents => {
            let roster = client.agent_statuses()?;
            let mut roles: Vec<_> = roster.into_values().collect();
            roles.sort_by(|a, b| a.role.cmp(&b.role));
            for agent in roles {
                println!("{:<24} {}", agent.role, agent.status);
            }
            Ok(())
        }
    }
}

/// Run the full controller flow, streaming events until the build ends and
/// the final file listing arrives.
fn watch_build(api_url: &str, description: &str) -> Result<(), Box<dyn Error>> {
    let ctx = ForgedeckContext::builder().api_url(api_url).build();
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let mut rx = ctx.event_bus.subscribe();

        let controller = ctx.controller.clone();
        let idea = description.to_string();
        let project =
            tokio::task::spawn_blocking(move || controller.start_build(&idea)).await??;
        println!("session {} ({})", project.id, project.name);

        // Lines already printed from the server's log snapshot; each poll
        // replaces the snapshot wholesale, so only the tail is new.
        let mut printed = 0;
        let mut finished = false;

        loop {
            // Once the build is finished only the file listing is still
            // expected; don't hang if its refresh failed.
            let received = if finished {
                match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                    Ok(received) => received,
                    Err(_) => break,
                }
            } else {
                rx.recv().await
            };

            match received {
                Ok(BuildEvent::LogAppended { entry }) => println!("{}", format_entry(&entry)),
                Ok(BuildEvent::LogsReplaced { entries }) => {
                    if entries.len() < printed {
                        printed = 0;
                    }
                    for entry in &entries[printed..] {
                        println!("{}", format_entry(entry));
                    }
                    printed = entries.len();
                }
                Ok(BuildEvent::BuildFinished { status }) => {
                    println!("build {status}");
                    finished = true;
                }
                Ok(BuildEvent::FilesRefreshed { files }) if finished => {
                    if files.is_empty() {
                        println!("no files generated");
                    } else {
                        println!("generated files:");
                        for path in files {
                            println!("  {path}");
                        }
                    }
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("event stream lagged; skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }

        ctx.controller.stop();
        Ok(())
    })
}

fn format_entry(entry: &LogEntry) -> String {
    let marker = match entry.level {
        LogLevel::Error => "!",
        LogLevel::Success => "*",
        _ => " ",
    };
    format!(
        "[{}]{} {}: {}",
        entry.timestamp, marker, entry.agent, entry.message
    )
}
