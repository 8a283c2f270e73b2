use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use db::{models::applicant::ApplicantStatus, store::TaskStore};
use remote::{RemoteConfig, RemoteStore};
use services::services::{
    assignment::commit_assignments,
    capacity::{VolunteerSelection, pending_candidates, remaining_capacity},
    eligibility::{CounterpartRole, ReviewStatus, resolve_eligible_reviewees, with_review_status},
};

#[derive(Parser)]
#[command(name = "nab", version, about = "Assignment and review tooling for the neighborhood board")]
struct Cli {
    /// Base URL of the board API, e.g. https://board.example/api
    #[arg(long, env = "NAB_API_BASE")]
    api_base: String,

    /// Bearer token of the acting user
    #[arg(long, env = "NAB_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "NAB_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, env = "NAB_APPLICANT_PAGE_LIMIT", default_value_t = 100)]
    page_limit: u32,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show remaining capacity and the pending applicants of a task
    Capacity {
        task_id: i64,
    },

    /// Accept the given applicants, all at once
    Assign {
        task_id: i64,
        #[arg(required = true)]
        applicant_ids: Vec<i64>,
    },

    /// List who a user may review on a completed task
    Reviewees {
        task_id: i64,
        #[arg(long)]
        viewer: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_tracing();
    let cli = Cli::parse();

    let mut config = RemoteConfig::new(&cli.api_base)?
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_applicant_page_limit(cli.page_limit);
    if let Some(token) = cli.token.filter(|token| !token.is_empty()) {
        config = config.with_token(token);
    }
    let store = RemoteStore::new(config)?;

    match cli.cmd {
        Command::Capacity { task_id } => {
            let task = store.get_task(task_id).await?;
            let applicants = store.list_applicants(task_id, None).await?;
            let remaining = remaining_capacity(&task, &applicants);

            println!(
                "Task {} \"{}\": {} of {} volunteer slot(s) open",
                task.id,
                task.title,
                remaining,
                task.required_volunteers()
            );
            for applicant in pending_candidates(&applicants) {
                println!("- applicant {} (user {})", applicant.id, applicant.user_id);
            }
        }
        Command::Assign {
            task_id,
            applicant_ids,
        } => {
            let task = store.get_task(task_id).await?;
            let accepted = store
                .list_applicants(task_id, Some(ApplicantStatus::Accepted))
                .await?;

            let mut selection = VolunteerSelection::new(remaining_capacity(&task, &accepted));
            for applicant_id in &applicant_ids {
                if !selection.is_selected(*applicant_id) && !selection.toggle(*applicant_id) {
                    bail!(
                        "Task {task_id} has room for {} more volunteer(s); cannot select applicant {applicant_id}",
                        selection.remaining_capacity()
                    );
                }
            }

            let result = commit_assignments(&store, task_id, &selection.ids())
                .await
                .context("nothing to assign")?;
            println!("{}", result.summary_message());
            for (applicant_id, reason) in result.failures() {
                println!("- applicant {applicant_id}: {reason}");
            }
        }
        Command::Reviewees { task_id, viewer } => {
            let task = store.get_task(task_id).await?;
            let accepted = store
                .list_applicants(task_id, Some(ApplicantStatus::Accepted))
                .await?;
            let reviews = store.list_reviews(task_id).await?;

            let reviewees = resolve_eligible_reviewees(&task, viewer, &accepted);
            let annotated = with_review_status(task_id, &reviewees, &reviews, viewer);
            let status = ReviewStatus::from_annotated(&annotated);

            println!(
                "{} reviewed, {} pending",
                status.reviewed, status.pending
            );
            for (counterpart, reviewed) in annotated {
                let role = match counterpart.role {
                    CounterpartRole::Creator => "requester",
                    CounterpartRole::Volunteer => "volunteer",
                };
                let mark = if reviewed { "reviewed" } else { "pending" };
                println!("- user {} ({role}): {mark}", counterpart.user_id);
            }
        }
    }

    Ok(())
}
