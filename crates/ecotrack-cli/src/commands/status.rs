use serde::Serialize;

use crate::common::build_tracker;

#[derive(Serialize)]
struct CategoryStatus {
    id: String,
    name: String,
    completed: usize,
    total: usize,
}

#[derive(Serialize)]
struct StatusReport {
    identity: String,
    points: u32,
    percent: u8,
    categories: Vec<CategoryStatus>,
}

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = build_tracker()?;

    let categories: Vec<CategoryStatus> = tracker
        .catalog()
        .categories()
        .iter()
        .map(|c| CategoryStatus {
            id: c.id.clone(),
            name: c.name.clone(),
            completed: tracker.completed_in_category(&c.id),
            total: c.goals.len(),
        })
        .collect();

    let report = StatusReport {
        identity: tracker.identity().key().to_string(),
        points: tracker.points(),
        percent: tracker.progress_percent(),
        categories,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("signed in as: {}", report.identity);
    println!("points: {} ({}%)", report.points, report.percent);
    for cat in &report.categories {
        println!("  {}: {}/{}", cat.name, cat.completed, cat.total);
    }
    Ok(())
}
