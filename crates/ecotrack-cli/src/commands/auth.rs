use chrono::Utc;
use clap::Subcommand;

use crate::common::build_tracker;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account
    Signup {
        email: String,
        password: String,
    },
    /// Sign in; anonymous progress becomes a pending merge
    Login {
        email: String,
        password: String,
    },
    /// Sign out and clear local progress
    Logout,
    /// Show the current identity
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Signup { email, password } => {
            let tracker = build_tracker()?;
            tracker.sign_up(&email, &password)?;
            println!("account created, now run `ecotrack-cli auth login`");
        }
        AuthAction::Login { email, password } => {
            let mut tracker = build_tracker()?;
            let pending = tracker.sign_in(&email, &password, Utc::now())?;
            println!("signed in as {}", tracker.identity().key());
            if pending {
                println!("anonymous progress found; run `ecotrack-cli merge status`");
            }
        }
        AuthAction::Logout => {
            let mut tracker = build_tracker()?;
            tracker.logout(Utc::now());
            println!("signed out");
        }
        AuthAction::Status => {
            let tracker = build_tracker()?;
            if tracker.identity().is_authenticated() {
                println!("signed in as {}", tracker.identity().key());
            } else {
                println!("not signed in (progress is stored locally)");
            }
        }
    }
    Ok(())
}
