use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use playforge_core::{
    recent_log_lines, AgentConfig, LogFormat, LoggingSettings, Pipeline, PipelineError,
    PipelineOptions, PipelineReport, DEFAULT_CONFIG_PATH,
};
use playforge_sync::{CommitOutcome, Credentials, PushReport};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Environment variable holding the secret for `push-remote`
const TOKEN_ENV: &str = "PLAYFORGE_GIT_TOKEN";

fn cli() -> Command {
    Command::new("playforge")
        .version(playforge_core::VERSION)
        .about("Natural-language requests to validated, version-controlled playbooks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .default_value(DEFAULT_CONFIG_PATH)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file"),
        )
        .subcommand(
            Command::new("generate")
                .about("Reuse or generate a playbook for a request")
                .arg(
                    Arg::new("prompt")
                        .required(true)
                        .num_args(1..)
                        .help("Request, e.g. \"Install nginx on Ubuntu\""),
                )
                .arg(
                    Arg::new("skip-check")
                        .long("skip-check")
                        .action(ArgAction::SetTrue)
                        .help("Always generate, never reuse a stored playbook"),
                )
                .arg(
                    Arg::new("param")
                        .long("param")
                        .short('p')
                        .action(ArgAction::Append)
                        .value_parser(parse_param)
                        .help("Extra parameter KEY=VALUE (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("match")
                .about("Score stored playbooks against a request")
                .arg(Arg::new("prompt").required(true).num_args(1..)),
        )
        .subcommand(Command::new("push").about("Push pending commits to the configured remote"))
        .subcommand(
            Command::new("push-remote")
                .about(format!("Push once with credentials; the secret is read from {TOKEN_ENV}"))
                .arg(Arg::new("url").long("url").required(true).help("HTTPS remote URL"))
                .arg(Arg::new("user").long("user").required(true).help("Username")),
        )
        .subcommand(
            Command::new("status")
                .about("Show repository and push status")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Show recent commits")
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .short('n')
                        .default_value("10")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("logs")
                .about("Show the end of the log file")
                .arg(
                    Arg::new("lines")
                        .long("lines")
                        .short('n')
                        .default_value("20")
                        .value_parser(value_parser!(usize)),
                ),
        )
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

fn prompt(args: &ArgMatches) -> String {
    args.get_many::<String>("prompt")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let json = settings.format == LogFormat::Json;

    let console = settings.console.then(|| {
        let layer = fmt::layer().with_writer(std::io::stderr);
        if json {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    });

    let file = settings.file.as_deref().and_then(|path| match open_log_file(path) {
        Ok(file) => {
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            Some(if json { layer.json().boxed() } else { layer.boxed() })
        }
        Err(e) => {
            eprintln!("warning: cannot open log file {}: {e}", path.display());
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AgentConfig::load(&config_path)
        .await
        .with_context(|| format!("loading {}", config_path.display()))?;
    init_tracing(&config.logging);
    tracing::debug!(config = %config_path.display(), output = %config.output_dir.display(), "starting");

    if let Some(("logs", args)) = matches.subcommand() {
        let limit = args.get_one::<usize>("lines").copied().unwrap_or(20);
        return show_logs(&config.logging, limit).await;
    }

    let (pipeline, scheduler) = Pipeline::from_config(&config).await?;
    let result = dispatch(&pipeline, matches).await;

    if let Some(scheduler) = scheduler {
        scheduler.cancel().await;
    }
    pipeline.sync().shutdown().await;
    result
}

async fn dispatch(pipeline: &Pipeline, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("generate", args)) => {
            let options = PipelineOptions {
                skip_check: args.get_flag("skip-check"),
                params: args
                    .get_many::<(String, String)>("param")
                    .map(|pairs| pairs.cloned().collect())
                    .unwrap_or_default(),
            };
            generate(pipeline, &prompt(args), options).await
        }
        Some(("match", args)) => find_matches(pipeline, &prompt(args)).await,
        Some(("push", _)) => {
            let report = pipeline.sync().push().await?;
            print_push(&report);
            Ok(())
        }
        Some(("push-remote", args)) => {
            let url = args.get_one::<String>("url").cloned().unwrap_or_default();
            let user = args.get_one::<String>("user").cloned().unwrap_or_default();
            let secret = std::env::var(TOKEN_ENV).unwrap_or_default();
            let credentials = Credentials::new(user, secret)
                .with_context(|| format!("set {TOKEN_ENV} to the password or token"))?;
            let report = pipeline.sync().push_with_credentials(&url, &credentials).await?;
            print_push(&report);
            Ok(())
        }
        Some(("status", args)) => {
            let status = pipeline.sync().status().await?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&status)?);
                return Ok(());
            }
            println!("State:        {:?}", status.state);
            println!("Repository:   {}", status.repo_path.display());
            println!("Branch:       {}", status.branch);
            println!("Commits:      {}", status.commit_count);
            if let (Some(url), Some(mode)) = (&status.remote_url, status.push_mode) {
                println!("Remote:       {url}");
                println!("Push mode:    {mode}");
            } else {
                println!("Remote:       not configured");
            }
            println!("Pending:      {}", status.pending);
            match status.last_push {
                Some(at) => println!("Last push:    {}", at.to_rfc3339()),
                None => println!("Last push:    never"),
            }
            Ok(())
        }
        Some(("history", args)) => {
            let limit = args.get_one::<usize>("limit").copied().unwrap_or(10);
            let lines = pipeline.sync().history(limit).await?;
            if lines.is_empty() {
                println!("No commits yet");
            }
            for line in lines {
                println!("{line}");
            }
            Ok(())
        }
        _ => bail!("unknown command, see --help"),
    }
}

async fn generate(pipeline: &Pipeline, prompt: &str, options: PipelineOptions) -> anyhow::Result<()> {
    let report = match pipeline.process(prompt, options).await {
        Ok(report) => report,
        Err(PipelineError::ValidationFailed { path, report }) => {
            println!("Validation failed: {}", report.message);
            if let Some(diagnostic) = &report.diagnostic {
                println!("{diagnostic}");
            }
            bail!("{} was kept on disk but not committed", path.display());
        }
        Err(e) => return Err(e.into()),
    };

    let resolution = report.resolution();
    println!(
        "Intent:   {} (os: {}, hosts: {})",
        resolution.kind(),
        resolution.os_type,
        resolution.target_hosts
    );

    match &report {
        PipelineReport::Reused(reused) => {
            println!(
                "Reusing:  {} (match {:.0}%)",
                reused.artifact.path.display(),
                reused.artifact.score * 100.0
            );
        }
        PipelineReport::Generated(generated) => {
            if let Some(score) = generated.best_score {
                println!("Best stored match {:.0}%, generating a new playbook", score * 100.0);
            }
            println!("Playbook: {}", generated.path.display());
            println!("Source:   {:?} ({:?})", generated.source, generated.repair);
            println!("Check:    {}", generated.validation.message);
            match &generated.commit {
                Ok(CommitOutcome::Committed(record)) => {
                    println!("Commit:   {} {}", record.hash, record.message);
                    match &record.immediate_push {
                        Some(Ok(push)) => print_push(push),
                        Some(Err(e)) => println!("Push failed, commit kept pending: {e}"),
                        None if record.pending_push => println!("Push:     pending"),
                        None => {}
                    }
                }
                Ok(CommitOutcome::Skipped { reason }) => println!("Commit:   skipped ({reason})"),
                Err(e) => println!("Commit failed: {e}"),
            }
        }
    }
    Ok(())
}

async fn find_matches(pipeline: &Pipeline, prompt: &str) -> anyhow::Result<()> {
    let report = pipeline.find_matches(prompt).await?;
    println!("Intent: {}", report.resolution.kind());
    if report.candidates.is_empty() {
        println!("No stored playbooks match");
        return Ok(());
    }

    let reusable = report.reusable().map(|c| c.path.clone());
    for candidate in &report.candidates {
        let marker = if reusable.as_ref() == Some(&candidate.path) { "*" } else { " " };
        println!(
            "{marker} {:>4.0}%  {}  ({} bytes)",
            candidate.score * 100.0,
            candidate.file_name,
            candidate.size
        );
    }
    println!("Reuse threshold: {:.0}%", report.threshold * 100.0);
    Ok(())
}

async fn show_logs(settings: &LoggingSettings, limit: usize) -> anyhow::Result<()> {
    let Some(path) = &settings.file else {
        println!("File logging is disabled");
        return Ok(());
    };
    let lines = recent_log_lines(path, limit)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    if lines.is_empty() {
        println!("No log entries in {}", path.display());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn print_push(report: &PushReport) {
    match report {
        PushReport::NothingPending => println!("Nothing to push"),
        PushReport::Pushed { count, at } => {
            println!("Pushed {count} commit(s) at {}", at.to_rfc3339());
        }
    }
}
