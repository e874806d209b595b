//! Purchase history insight commands

use anyhow::Result;
use nimbly_core::db::Database;
use nimbly_core::{InsightEngine, InsightReport};

/// Generate and print insights for a user
pub fn cmd_insights(db: &Database, user_id: i64, json: bool) -> Result<InsightReport> {
    let report = InsightEngine::new().generate(user_id, db)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    if let Some(message) = &report.message {
        println!("{}", message);
        return Ok(report);
    }

    println!("\nInsights for user {} ({})", user_id, report.insights.len());
    println!("{}", "─".repeat(70));

    for insight in &report.insights {
        println!(
            "  [{}] {} ({} data points, {:.0}% confidence)",
            insight.insight_type,
            insight.title,
            insight.data_points,
            insight.confidence * 100.0
        );
        println!("      {}", insight.description);
    }

    println!();
    Ok(report)
}
