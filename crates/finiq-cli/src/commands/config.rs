//! Settings command

use anyhow::Result;
use finiq_core::budget::validate_policy;
use finiq_core::config::default_settings_path;
use finiq_core::model_router::{self, ModelRouter, TaskType};
use finiq_core::PolicyValidation;
use serde_json::json;

use super::AppContext;

/// Show effective settings and whether the policy passes validation
pub fn cmd_config(ctx: &AppContext) -> Result<()> {
    let settings = &ctx.settings;
    let policy = &settings.policy;

    // Always check strictly so a mismatch is reported whatever the strategy
    let policy_check = validate_policy(policy, PolicyValidation::Strict);
    let router = ModelRouter::default();

    if ctx.json {
        let tasks: serde_json::Map<String, serde_json::Value> = TaskType::all()
            .iter()
            .map(|task| {
                (
                    task.as_str().to_string(),
                    json!({
                        "model": router.model_for_task(*task),
                        "timeout_secs": router.timeout_for_task(*task).as_secs(),
                    }),
                )
            })
            .collect();

        return ctx.print_json(&json!({
            "source": settings.source.as_ref().map(|p| p.display().to_string()),
            "policy": policy,
            "policy_total": policy.total(),
            "policy_valid": policy_check.is_ok(),
            "validation": settings.validation,
            "coaching": {
                "language": settings.coaching.language,
                "name": settings.coaching.name,
            },
            "classifier": {
                "use_ai": settings.classifier.use_ai,
                "timeout_secs": settings.classifier.timeout.as_secs(),
            },
            "models": tasks,
            "profile": ctx.profile_path.as_ref().map(|p| p.display().to_string()),
        }));
    }

    println!();
    println!("⚙️  Finiq settings");
    println!("   ─────────────────────────────────────────");
    println!(
        "   Source: {}",
        settings
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string())
    );
    println!();
    println!("   Policy:");
    println!("     essentials {:.0}%", policy.essentials_pct * 100.0);
    println!("     bills      {:.0}%", policy.bills_pct * 100.0);
    println!("     savings    {:.0}%", policy.savings_pct * 100.0);
    println!("     fun        {:.0}%", policy.fun_pct * 100.0);
    match &policy_check {
        Ok(()) => println!("     total      {:.0}% ✅", policy.total() * 100.0),
        Err(e) => println!("     total      {:.0}% ⚠️  {}", policy.total() * 100.0, e),
    }
    println!("     validation {}", settings.validation);
    println!();
    println!(
        "   Coaching: {} ({})",
        settings.coaching.name, settings.coaching.language
    );
    println!(
        "   Classifier: AI {} (timeout {}s)",
        if settings.classifier.use_ai { "on" } else { "off" },
        settings.classifier.timeout.as_secs()
    );
    println!();
    println!("   Models:");
    for task in TaskType::all() {
        println!(
            "     {:<22} {} ({}s)",
            task.as_str(),
            router.model_for_task(*task),
            router.timeout_for_task(*task).as_secs()
        );
    }
    println!();
    println!("   Override files:");
    let show = |p: Option<std::path::PathBuf>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    };
    println!("     settings: {}", show(default_settings_path()));
    println!("     models:   {}", show(model_router::default_config_path()));
    println!("     profile:  {}", show(ctx.profile_path.clone()));
    println!();

    Ok(())
}
