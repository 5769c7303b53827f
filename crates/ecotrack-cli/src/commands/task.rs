use chrono::Utc;
use clap::Subcommand;
use ecotrack_core::CompleteOutcome;
use serde::Serialize;

use crate::common::build_tracker;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Show today's bonus tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Complete a bonus task by id
    Complete {
        /// Task id (e.g. "task-2026-08-30-0")
        id: String,
    },
    /// Request a new task set (tasks rotate on their own)
    Refresh,
}

#[derive(Serialize)]
struct TaskLine {
    id: String,
    text: String,
    category: String,
    points: u32,
    completed: bool,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TaskAction::List { json } => {
            let mut tracker = build_tracker()?;
            let tasks = tracker.ensure_todays_tasks(Utc::now());
            let lines: Vec<TaskLine> = tasks
                .into_iter()
                .map(|t| TaskLine {
                    id: t.id,
                    text: t.text,
                    category: t.category,
                    points: t.points,
                    completed: t.completed,
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
                return Ok(());
            }
            for line in &lines {
                let mark = if line.completed { "x" } else { " " };
                println!("[{mark}] {} {} ({} puan)", line.id, line.text, line.points);
            }
        }
        TaskAction::Complete { id } => {
            let mut tracker = build_tracker()?;
            let completion = tracker.complete_task(&id, Utc::now());
            match completion.outcome {
                CompleteOutcome::Completed => println!("completed: {id}"),
                CompleteOutcome::AlreadyCompleted => println!("already completed: {id}"),
                CompleteOutcome::DegradedLocal => {
                    println!("completed locally (backend unreachable): {id}");
                }
            }
            println!("points: {}", completion.points);
        }
        TaskAction::Refresh => {
            // The shared task set is read-only from the client side.
            println!("tasks rotate automatically at midnight (UTC+3); nothing to refresh");
        }
    }
    Ok(())
}
