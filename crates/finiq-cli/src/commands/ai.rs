//! AI backend commands

use anyhow::Result;
use chrono::NaiveDate;
use finiq_core::ai::AIBackend;
use finiq_core::coach::CoachingRequest;
use finiq_core::daily::evaluate_daily_insight;
use finiq_core::IncomeProfile;

use super::AppContext;

/// Categories outside the built-in table, with a description
const SAMPLE_CATEGORIES: &[(&str, &str)] = &[
    ("phone", "Jio prepaid recharge"),
    ("travel", "Petrol for bike"),
    ("entertainment", "Movie tickets"),
    ("gifts", "Birthday present for sister"),
];

/// Test the configured AI backend and run sample requests
pub async fn cmd_ai_test(ctx: &AppContext, category: Option<&str>) -> Result<()> {
    println!("🔍 Testing AI backend...\n");

    let Some(client) = ctx.ai_client(false) else {
        if !ctx.settings.classifier.use_ai {
            println!("  ⚠️  AI is disabled in settings ([classifier] use_ai = false)");
        } else {
            println!("  ⚠️  No AI backend configured");
            println!("\nTo use Ollama:");
            println!("  1. Install Ollama: https://ollama.ai/download");
            println!("  2. Start the server: ollama serve");
            println!("  3. Pull a model: ollama pull gemma3");
            println!("  4. Set environment variable: export OLLAMA_HOST=http://localhost:11434");
            println!("\nOr set AI_BACKEND=openai_compatible with OPENAI_COMPATIBLE_HOST.");
        }
        return Ok(());
    };

    println!("  Backend: {}", client.backend_name());
    println!("  Host:    {}", client.host());

    let info = client.router_info();
    println!("  Default model: {}", info.default_model);
    if let Some(fallback) = &info.fallback_model {
        println!("  Fallback model: {}", fallback);
    }
    for (task, model) in &info.task_models {
        println!("  {} → {}", task, model);
    }

    print!("\nChecking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach {}", client.host());
        return Ok(());
    }

    println!("\n📋 Testing bucket classification...\n");

    let samples: Vec<(&str, &str)> = match category {
        Some(c) => vec![(c, "")],
        None => SAMPLE_CATEGORIES.to_vec(),
    };

    for (category, description) in samples {
        print!("  \"{}\" ({}) → ", category, description);
        match client.classify_bucket(category, description).await {
            Ok(result) => match result.to_bucket() {
                Some(bucket) => println!("{}", bucket),
                None => println!("⚠️  unknown bucket \"{}\" (would use other)", result.bucket),
            },
            Err(e) => println!("❌ Error: {}", e),
        }
    }

    println!("\n💬 Testing coaching messages...\n");

    let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap_or_default();
    let insight = evaluate_daily_insight(1, date, &IncomeProfile::from_daily(1000.0), 700.0);
    let request = CoachingRequest::from_insight(
        &insight,
        &ctx.settings.coaching.name,
        ctx.settings.coaching.language,
    );

    match client.generate_coaching(&request).await {
        Ok(messages) => {
            println!("  Daily:   {}", messages.daily_message);
            println!("  Weekly:  {}", messages.weekly_message);
            println!("  Monthly: {}", messages.monthly_message);
        }
        Err(e) => println!("  ❌ Error: {}", e),
    }

    println!("\n✅ AI test complete!");
    Ok(())
}
