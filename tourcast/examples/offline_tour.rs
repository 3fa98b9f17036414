//! Runs the whole pipeline against a scripted provider, no network needed.
//!
//! ```bash
//! cargo run --example offline_tour
//! ```

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use serde_json::json;
use tourcast::llms::mock::MockChat;
use tourcast::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("tourcast=debug")
        .init();

    let chat = MockChat::new(|request| {
        let reply = match request.schema_name() {
            Some("time_allocation") => json!({
                "introduction": 1.0, "architecture": 0.0, "history": 0.0,
                "culture": 2.0, "culinary": 1.5, "conclusion": 0.5
            }),
            Some("final_tour") => json!({
                "output": "Welcome to Lyon. Silk weavers once filled these hills. \
                           Save room for a praline tart. Thanks for walking with us."
            }),
            Some(name) => json!({ "output": format!("Narration produced for {name}.") }),
            None => json!({}),
        };
        Ok(ChatResponse::from_text(reply.to_string()))
    });

    let config = TourConfig {
        budget_strategy: BudgetStrategy::Planned,
        ..TourConfig::default()
    };
    let pipeline = TourPipeline::new(config, Arc::new(chat));
    let request = TourRequest::from_labels("Lyon", ["Culture", "Food"], 5)?;

    let outcome = pipeline.run(&request).await?;

    for (interest, section) in &outcome.sections {
        println!("{interest}: {} words requested", section.word_limit);
    }
    println!("\n{}", outcome.text());

    Ok(())
}
