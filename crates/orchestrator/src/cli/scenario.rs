use crate::cli::context::AppContext;
use anyhow::{Context, Result};
use domain::Feedback;
use orchestrator::{ScenarioKind, ScenarioRunner, UnsupportedScenarios};

pub async fn handle_scenario_command(ctx: &AppContext, scenario: String) -> Result<()> {
    let kind: ScenarioKind = scenario.parse()?;
    let network = ctx.load_network().await?;

    ctx.feedback
        .info(&format!("🎯 Running scenario {} ({})", kind.index(), kind));
    UnsupportedScenarios
        .run(kind, &network)
        .await
        .with_context(|| format!("Scenario {} could not run", kind))
}
