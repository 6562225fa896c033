use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use aia::config::{self, ConfigSource, WorkflowConfig};
use aia::{AssistantRole, BoardStatus, Coordinator, OperationResult, WorkItem};

#[derive(Debug, Parser)]
#[command(
    name = "aia",
    version,
    about = "Drive AI assistants through a kanban workflow on your Git host"
)]
pub struct Cli {
    /// Git hosting provider (github, gitlab, bitbucket)
    #[arg(long, env = "AIA_PROVIDER", default_value = "github", global = true)]
    pub provider: String,

    /// More log output (-v, -vv, -vvv); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show issue counts per board column
    Status {
        /// Also list the ToDo queue and each assistant's issues
        #[arg(long)]
        list: bool,
    },
    /// Let an assistant pick up its next piece of work
    Trigger { role: AssistantRole },
    /// Start the coder on an issue in ToDo
    Start { issue: u64 },
    /// Finish a role's work on an issue and hand it on
    Complete {
        role: AssistantRole,
        issue: u64,
        /// Pull request title (tester only)
        #[arg(long)]
        title: Option<String>,
        /// Pull request body (tester only)
        #[arg(long)]
        body: Option<String>,
    },
    /// Assign the researcher to an issue
    Research { issue: u64 },
    /// Run an issue through coder, reviewer and tester in one go
    Pipeline { issue: u64 },
    /// Check that the project board is reachable
    Validate,
    /// Write a project configuration file
    Init {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        /// Project board number
        #[arg(long)]
        project: Option<u64>,
        #[arg(long, default_value = "main")]
        base: String,
    },
    /// Show the resolved configuration
    Info,
}

/// Runs one command. `Ok(false)` means the workflow step reported a failure.
pub async fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Command::Init {
            owner,
            name,
            project,
            base,
        } => return handle_init(owner, name, *project, base),
        Command::Info => return handle_info(&cli.provider).await,
        _ => {}
    }

    let (config, _) = config::load_config().await?.context(
        "No configuration found. Run `aia init --owner <owner> --name <repo>` or set GITHUB_REPO_OWNER/GITHUB_REPO_NAME",
    )?;
    let coordinator = Coordinator::new(&cli.provider, config)?;

    match cli.command {
        Command::Status { list } => handle_status(&coordinator, list).await,
        Command::Trigger { role } => {
            println!("{} Triggering {role} workflow...", role.emoji());
            Ok(report(&coordinator.trigger_role(role).await?))
        }
        Command::Start { issue } => Ok(report(&coordinator.start_coder(issue).await?)),
        Command::Complete {
            role,
            issue,
            title,
            body,
        } => {
            let result = complete(&coordinator, role, issue, title, body).await?;
            Ok(report(&result))
        }
        Command::Research { issue } => Ok(report(&coordinator.assign_researcher(issue).await?)),
        Command::Pipeline { issue } => handle_pipeline(&coordinator, issue).await,
        Command::Validate => Ok(report(&coordinator.validate_board().await?)),
        Command::Init { .. } | Command::Info => Ok(true),
    }
}

async fn complete(
    coordinator: &Coordinator,
    role: AssistantRole,
    issue: u64,
    title: Option<String>,
    body: Option<String>,
) -> Result<OperationResult> {
    let result = match role {
        AssistantRole::Coder => coordinator.complete_coder(issue).await?,
        AssistantRole::Reviewer => coordinator.complete_reviewer(issue).await?,
        AssistantRole::Tester => {
            let (default_title, default_body) = default_pr_text(issue);
            coordinator
                .complete_tester(
                    issue,
                    &title.unwrap_or(default_title),
                    &body.unwrap_or(default_body),
                )
                .await?
        }
        AssistantRole::Researcher => coordinator.complete_research(issue).await?,
        AssistantRole::Marketer => {
            OperationResult::failed(format!("No completion workflow for {role}"))
        }
    };
    Ok(result)
}

pub fn default_pr_text(issue: u64) -> (String, String) {
    (
        format!("Implement issue #{issue}"),
        format!("This PR implements the changes for issue #{issue}."),
    )
}

async fn handle_status(coordinator: &Coordinator, list: bool) -> Result<bool> {
    let counts = coordinator.status_counts().await?;

    println!(
        "📊 Project Board Status: {}",
        coordinator.config().repo_full_name()
    );
    println!("{}", "=".repeat(50));
    for (status, count) in &counts {
        println!("{status}: {count} issues");
    }
    println!("📈 Total on board: {}", counts.values().sum::<usize>());

    if list {
        let queue = coordinator.unassigned_todo_items().await?;
        println!("\nUnassigned in {}:", BoardStatus::ToDo);
        print_items(&queue);

        for role in AssistantRole::ALL {
            let items = coordinator.issues_for_role(role, None).await?;
            println!("\n{} {role}:", role.emoji());
            print_items(&items);
        }
    }
    Ok(true)
}

fn print_items(items: &[WorkItem]) {
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        let status = item.board_status.map(|s| s.name()).unwrap_or("no status");
        println!("  • #{}: {} [{status}]", item.number, item.title);
    }
}

/// Runs start → review → testing → done, stopping at the first failure.
async fn handle_pipeline(coordinator: &Coordinator, issue: u64) -> Result<bool> {
    if !report_stage("ai-coder", &coordinator.start_coder(issue).await?) {
        return Ok(false);
    }
    let handed_to_reviewer = coordinator.complete_coder(issue).await?;
    if !report_stage("ai-coder → ai-reviewer", &handed_to_reviewer) {
        return Ok(false);
    }
    let handed_to_tester = coordinator.complete_reviewer(issue).await?;
    if !report_stage("ai-reviewer → ai-tester", &handed_to_tester) {
        return Ok(false);
    }

    let (title, body) = default_pr_text(issue);
    let done = coordinator.complete_tester(issue, &title, &body).await?;
    if !report_stage("ai-tester → Done", &done) {
        return Ok(false);
    }
    println!("🎉 Workflow completed for issue #{issue}");
    Ok(true)
}

fn report_stage(stage: &str, result: &OperationResult) -> bool {
    if result.success {
        println!("✅ {stage}: {}", result.message);
    } else {
        eprintln!("❌ {stage}: {}", result.message);
    }
    result.success
}

fn report(result: &OperationResult) -> bool {
    if result.success {
        println!("✅ {}", result.message);
        if let Some(output) = &result.output {
            println!("   {output}");
        }
    } else {
        eprintln!("❌ {}", result.message);
    }
    result.success
}

fn handle_init(owner: &str, name: &str, project: Option<u64>, base: &str) -> Result<bool> {
    let mut config = WorkflowConfig::new(owner, name).with_base_branch(base);
    if let Some(project) = project {
        config = config.with_project_number(project);
    }
    let path = config::project_config_path();
    config::save_config(&path, &config)?;
    println!("✅ Configuration saved to {}", path.display());
    Ok(true)
}

async fn handle_info(provider: &str) -> Result<bool> {
    println!("📋 AI Assistant Workflow - Repository Information");
    println!("{}", "=".repeat(50));
    println!("🔌 Provider: {provider}");

    match config::load_config().await? {
        Some((config, source)) => {
            println!("✅ Configured Repository: {}", config.repo_full_name());
            match config.project_number {
                Some(n) => println!("📊 Project Number: {n}"),
                None => println!("📊 Project Number: Not configured"),
            }
            println!("🌿 Default Branch: {}", config.default_base_branch);
            println!("⚙️  Source: {source}");
            if let ConfigSource::GitRemote(_) = source {
                println!("💡 Run `aia init` to pin this repository and add a project number");
            }
            Ok(true)
        }
        None => {
            eprintln!("❌ No AI workflow configuration found");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aia").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_trigger_accepts_tags_and_names() {
        let cli = parse(&["trigger", "ai-reviewer"]);
        assert!(matches!(
            cli.command,
            Command::Trigger {
                role: AssistantRole::Reviewer
            }
        ));
        let cli = parse(&["trigger", "coder"]);
        assert!(matches!(
            cli.command,
            Command::Trigger {
                role: AssistantRole::Coder
            }
        ));
    }

    #[test]
    fn parse_rejects_unknown_role() {
        let result = Cli::try_parse_from(["aia", "trigger", "ai-designer"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_complete_with_pr_text() {
        let cli = parse(&[
            "complete", "tester", "42", "--title", "Add login", "--body", "Closes #42",
        ]);
        match cli.command {
            Command::Complete {
                role,
                issue,
                title,
                body,
            } => {
                assert_eq!(role, AssistantRole::Tester);
                assert_eq!(issue, 42);
                assert_eq!(title.as_deref(), Some("Add login"));
                assert_eq!(body.as_deref(), Some("Closes #42"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = parse(&["status", "--list", "-vv", "--provider", "gitlab"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.provider, "gitlab");
        assert!(matches!(cli.command, Command::Status { list: true }));
    }

    #[test]
    fn parse_init_defaults_base_branch() {
        let cli = parse(&["init", "--owner", "acme", "--name", "widgets", "--project", "3"]);
        match cli.command {
            Command::Init {
                owner,
                name,
                project,
                base,
            } => {
                assert_eq!((owner.as_str(), name.as_str()), ("acme", "widgets"));
                assert_eq!(project, Some(3));
                assert_eq!(base, "main");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_issue_must_be_number() {
        assert!(Cli::try_parse_from(["aia", "start", "abc"]).is_err());
    }

    #[test]
    fn default_pr_text_mentions_issue() {
        let (title, body) = default_pr_text(7);
        assert_eq!(title, "Implement issue #7");
        assert_eq!(body, "This PR implements the changes for issue #7.");
    }
}
