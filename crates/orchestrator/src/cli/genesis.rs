use crate::cli::context::AppContext;
use anyhow::Result;

pub async fn handle_genesis_command(ctx: &AppContext) -> Result<()> {
    println!("📜 Generating identities and genesis under {}", ctx.settings.base_dir.display());
    let (network, configs) = orchestrator::prepare(&ctx.settings)?;

    println!("✅ Genesis written to {}", ctx.settings.genesis_path().display());
    println!("   Chain id: {}", network.chain_id);
    println!(
        "   Signers:  {}",
        configs
            .iter()
            .filter(|c| c.is_validator)
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    for config in &configs {
        println!("   {:<10} {}", config.name, config.address().to_checksum(None));
    }
    Ok(())
}
