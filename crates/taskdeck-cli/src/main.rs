//! `taskdeck` command line
//!
//! Loads a JSON snapshot and runs queries against it as one user:
//!
//! ```text
//! taskdeck --snapshot board.json --as 2 projects
//! taskdeck --snapshot board.json --as 3 authorize complete --task 60
//! taskdeck --snapshot board.json --as 1 report logged-time-sum --from 2026-03-01 --to 2026-03-07
//! taskdeck --snapshot board.json --as 1 grant --project 40 2 3
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout only carries
//! command output.

#![allow(missing_docs)]

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use serde_json::json;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use taskdeck_core::{
    AccessBasis, Action, DateRange, DeckConfig, ReportKind, ReportRequest, TargetRef, TaskDeck,
    TimeFilters,
};
use taskdeck_model::{ArchiveFilter, ProjectId, TaskId, UserId};
use taskdeck_store::MemoryStore;
use tracing_subscriber::EnvFilter;

/// Exit code of a denied `authorize`
const DENIED: u8 = 2;

fn cli() -> Command {
    Command::new("taskdeck")
        .version(taskdeck_core::VERSION)
        .about("Query a Taskdeck snapshot as one user")
        .subcommand_required(true)
        .arg(
            Arg::new("snapshot")
                .long("snapshot")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON snapshot to load"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("as")
                .long("as")
                .required(true)
                .value_parser(value_parser!(u64))
                .help("Id of the acting user"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .subcommand(
            Command::new("projects")
                .about("List accessible projects, favorites first")
                .arg(
                    Arg::new("archived")
                        .long("archived")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("all")
                        .help("Only archived projects"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Active and archived projects"),
                ),
        )
        .subcommand(
            Command::new("authorize")
                .about("Check whether the user may perform an action")
                .arg(
                    Arg::new("action")
                        .required(true)
                        .value_parser(value_parser!(Action))
                        .help("view, create, update, archive, restore, reorder, complete or edit-user-access"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .value_parser(value_parser!(u64))
                        .help("Target project id"),
                )
                .arg(
                    Arg::new("task")
                        .long("task")
                        .value_parser(value_parser!(u64))
                        .help("Target task id"),
                )
                .group(ArgGroup::new("target").args(["project", "task"]).required(true)),
        )
        .subcommand(Command::new("labels").about("List the label catalog"))
        .subcommand(
            Command::new("report")
                .about("Compute a report (always printed as JSON)")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(value_parser!(ReportKind))
                        .help("dashboard, logged-time-sum, daily-logged-time, fixed-price-sum or work-statistics"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .requires("to")
                        .value_parser(value_parser!(NaiveDate))
                        .help("First day, YYYY-MM-DD"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .requires("from")
                        .value_parser(value_parser!(NaiveDate))
                        .help("Last day, YYYY-MM-DD"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(u64))
                        .help("Restrict to a project (repeatable)"),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(u64))
                        .help("Restrict to a user (repeatable)"),
                )
                .arg(
                    Arg::new("incomplete")
                        .long("incomplete")
                        .action(ArgAction::SetTrue)
                        .help("Incomplete tasks instead of completed ones"),
                )
                .arg(
                    Arg::new("non-billable")
                        .long("non-billable")
                        .action(ArgAction::SetTrue)
                        .help("Non-billable entries instead of billable ones"),
                ),
        )
        .subcommand(
            Command::new("grant")
                .about("Replace a project's access grants and save the snapshot")
                .arg(
                    Arg::new("project")
                        .long("project")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Project id"),
                )
                .arg(
                    Arg::new("users")
                        .num_args(0..)
                        .value_parser(value_parser!(u64))
                        .help("User ids to grant; none clears every grant"),
                ),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Result of one command
#[derive(Debug)]
struct Output {
    body: String,
    code: u8,
}

impl Output {
    fn ok(body: String) -> Self {
        Self { body, code: 0 }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let matches = cli().get_matches();
    let output = run(&matches).await?;
    println!("{}", output.body);
    Ok(ExitCode::from(output.code))
}

async fn run(matches: &ArgMatches) -> Result<Output> {
    let snapshot = matches
        .get_one::<PathBuf>("snapshot")
        .context("--snapshot is required")?;
    let store = Arc::new(
        MemoryStore::load_json(snapshot)
            .with_context(|| format!("loading snapshot {}", snapshot.display()))?,
    );
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => DeckConfig::from_file(path)?,
        None => DeckConfig::default(),
    };
    let deck = TaskDeck::new(Arc::clone(&store), config)?;

    let user = UserId(*matches.get_one::<u64>("as").context("--as is required")?);
    let actor = deck.actor(user)?;
    let json = matches.get_flag("json");
    tracing::debug!("acting as {} with roles {:?}", actor.user_id, actor.roles);

    match matches.subcommand() {
        Some(("projects", args)) => {
            let filter = if args.get_flag("all") {
                ArchiveFilter::All
            } else if args.get_flag("archived") {
                ArchiveFilter::Archived
            } else {
                ArchiveFilter::Active
            };
            let projects = deck.list_accessible_projects(&actor, filter)?;
            if json {
                return Ok(Output::ok(serde_json::to_string_pretty(&projects)?));
            }
            let mut body = String::new();
            for summary in &projects {
                let star = if summary.favorite { " *" } else { "" };
                writeln!(body, "{}\t{}{}", summary.project.id.get(), summary.project.name, star)?;
            }
            Ok(Output::ok(body.trim_end().to_owned()))
        }
        Some(("authorize", args)) => {
            let action = *args.get_one::<Action>("action").context("action is required")?;
            let target = match (args.get_one::<u64>("project"), args.get_one::<u64>("task")) {
                (Some(id), _) => TargetRef::Project(ProjectId(*id)),
                (None, Some(id)) => TargetRef::Task(TaskId(*id)),
                (None, None) => anyhow::bail!("either --project or --task is required"),
            };
            Ok(authorize(&deck, &actor, action, target, json))
        }
        Some(("labels", _)) => {
            let labels = deck.list_labels(&actor)?;
            if json {
                return Ok(Output::ok(serde_json::to_string_pretty(&labels)?));
            }
            let mut body = String::new();
            for label in &labels {
                writeln!(body, "{}\t{}\t{}", label.id.get(), label.color, label.name)?;
            }
            Ok(Output::ok(body.trim_end().to_owned()))
        }
        Some(("report", args)) => {
            let kind = *args.get_one::<ReportKind>("kind").context("kind is required")?;
            let request = ReportRequest::new(kind).with_filters(report_filters(args)?);
            let report = deck.compute_report(&actor, &request)?;
            Ok(Output::ok(serde_json::to_string_pretty(&report)?))
        }
        Some(("grant", args)) => {
            let project = ProjectId(*args.get_one::<u64>("project").context("--project is required")?);
            let users: Vec<UserId> = args
                .get_many::<u64>("users")
                .map(|ids| ids.copied().map(UserId).collect())
                .unwrap_or_default();
            let granted = deck.replace_project_access(&actor, project, users).await?;
            store
                .save_json(snapshot)
                .with_context(|| format!("saving snapshot {}", snapshot.display()))?;
            tracing::info!("saved {}", snapshot.display());

            let ids: Vec<u64> = granted.iter().map(|u| u.get()).collect();
            if json {
                return Ok(Output::ok(json!({ "project": project.get(), "users": ids }).to_string()));
            }
            let list: Vec<String> = ids.iter().map(ToString::to_string).collect();
            Ok(Output::ok(format!("{}: {}", project, list.join(", "))))
        }
        _ => anyhow::bail!("no command given, see --help"),
    }
}

fn authorize(
    deck: &TaskDeck,
    actor: &taskdeck_core::Actor,
    action: Action,
    target: TargetRef,
    json: bool,
) -> Output {
    let (allowed, detail) = match deck.authorize(actor, action, target) {
        Ok(basis) => (true, describe(basis)),
        Err(err) => (false, err.to_string()),
    };
    let body = if json {
        json!({ "action": action.as_str(), "allowed": allowed, "detail": detail }).to_string()
    } else if allowed {
        format!("allowed ({detail})")
    } else {
        format!("denied: {detail}")
    };
    Output {
        body,
        code: if allowed { 0 } else { DENIED },
    }
}

fn describe(basis: AccessBasis) -> String {
    match basis {
        AccessBasis::Admin => "admin".to_owned(),
        AccessBasis::Grant => "explicit grant".to_owned(),
        AccessBasis::TeamLeader { via } => format!("team leader, via {via}"),
        AccessBasis::ClientCompany(company) => format!("client of {company}"),
    }
}

fn report_filters(args: &ArgMatches) -> Result<TimeFilters> {
    let mut filters = TimeFilters::default()
        .with_completed(!args.get_flag("incomplete"))
        .with_billable(!args.get_flag("non-billable"));
    if let Some(ids) = args.get_many::<u64>("project") {
        filters = filters.with_projects(ids.copied().map(ProjectId));
    }
    if let Some(ids) = args.get_many::<u64>("user") {
        filters = filters.with_users(ids.copied().map(UserId));
    }
    if let (Some(from), Some(to)) = (args.get_one::<NaiveDate>("from"), args.get_one::<NaiveDate>("to")) {
        filters = filters.with_date_range(DateRange::new(*from, *to)?);
    }
    Ok(filters)
}
