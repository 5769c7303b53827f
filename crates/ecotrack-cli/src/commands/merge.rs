use clap::Subcommand;
use ecotrack_core::{MergeDecision, SaveOutcome};

use crate::common::build_tracker;

#[derive(Subcommand)]
pub enum MergeAction {
    /// Show the pending merge, if any
    Status,
    /// Union the stashed anonymous progress into the account
    Apply,
    /// Drop the stashed anonymous progress
    Discard,
}

pub fn run(action: MergeAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        MergeAction::Status => {
            let tracker = build_tracker()?;
            match tracker.pending_merge() {
                Some(stash) => {
                    println!(
                        "pending merge: {} goals, {} points",
                        stash.completed_goals.len(),
                        stash.points
                    );
                    println!("run `ecotrack-cli merge apply` or `ecotrack-cli merge discard`");
                }
                None => println!("no merge pending"),
            }
        }
        MergeAction::Apply => resolve(MergeDecision::Merge)?,
        MergeAction::Discard => resolve(MergeDecision::Discard)?,
    }
    Ok(())
}

fn resolve(decision: MergeDecision) -> Result<(), Box<dyn std::error::Error>> {
    let mut tracker = build_tracker()?;
    if tracker.pending_merge().is_none() {
        println!("no merge pending");
        return Ok(());
    }

    let outcome = tracker.resolve_merge(decision);
    match decision {
        MergeDecision::Merge => println!("merged; points: {}", tracker.points()),
        MergeDecision::Discard => println!("discarded; points: {}", tracker.points()),
    }
    if outcome == SaveOutcome::DegradedLocalOnly {
        println!("backend unreachable, result saved locally");
    }
    if outcome == SaveOutcome::NotPersisted {
        println!("warning: the result could not be persisted anywhere");
    }
    Ok(())
}
