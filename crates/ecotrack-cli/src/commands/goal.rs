use clap::Subcommand;
use ecotrack_core::ToggleResult;
use serde::Serialize;

use crate::common::build_tracker;

#[derive(Subcommand)]
pub enum GoalAction {
    /// List goals with completion state
    List {
        /// Limit to one category id
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a goal's completion
    Toggle {
        /// Category id (e.g. "water")
        category: String,
        /// Exact goal text
        text: String,
    },
}

#[derive(Serialize)]
struct GoalLine {
    category: String,
    text: String,
    points: u32,
    completed: bool,
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        GoalAction::List { category, json } => {
            let tracker = build_tracker()?;
            let lines: Vec<GoalLine> = tracker
                .catalog()
                .categories()
                .iter()
                .filter(|c| category.as_deref().map_or(true, |id| c.id == id))
                .flat_map(|c| {
                    c.goals.iter().map(|g| GoalLine {
                        category: c.id.clone(),
                        text: g.text.clone(),
                        points: g.points,
                        completed: tracker.is_completed(&c.id, &g.text),
                    })
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
                return Ok(());
            }
            for line in &lines {
                let mark = if line.completed { "x" } else { " " };
                println!("[{mark}] {} | {} ({} puan)", line.category, line.text, line.points);
            }
        }
        GoalAction::Toggle { category, text } => {
            let mut tracker = build_tracker()?;
            match tracker.toggle_goal(&category, &text) {
                ToggleResult::Applied {
                    completed, points, ..
                } => {
                    let state = if completed { "completed" } else { "reopened" };
                    println!("{state}: {category} | {text}");
                    println!("points: {points}");
                }
                ToggleResult::UnknownGoal => {
                    eprintln!("unknown goal: {category} | {text}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
