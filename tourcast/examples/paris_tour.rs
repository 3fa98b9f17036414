//! Ten-minute Paris tour through the OpenAI API.
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run --example paris_tour
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::sync::Arc;

use tourcast::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = TourConfig::default().with_env();
    let client = Arc::new(OpenAI::new(config.openai_config()?)?);
    let renderer = SpeechRenderer::from_config(&config, Arc::clone(&client) as SharedSpeechProvider);
    let pipeline = TourPipeline::new(config, client);

    let request = TourRequest::from_labels("Paris", ["History", "Architecture"], 10)?;
    let outcome = pipeline.run(&request).await?;

    println!("{}\n", outcome.text());
    println!(
        "Words: {} (target {}), tokens: {}",
        tourcast::tour::word_count(outcome.text()),
        outcome.budget.total_words,
        outcome.usage.total_tokens
    );

    match renderer.render(outcome.text()).await {
        Ok(audio) => {
            let path = suggested_file_name(request.location());
            audio.save(&path)?;
            println!("Audio saved: {path}");
        }
        Err(e) => eprintln!("Error: {e}"),
    }

    Ok(())
}
