use anyhow::{Context, Result};
use ethereum::{Identity, persist_identity};
use std::path::PathBuf;

pub async fn handle_keypair_command(output: Option<PathBuf>, name: String) -> Result<()> {
    println!("🔑 Generating new secp256k1 node identity...\n");

    let identity = Identity::generate().context("Keypair generation failed")?;

    println!("✅ Identity Generated Successfully!\n");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🔐 PRIVATE KEY (Keep this secret!):");
    println!("   {}", identity.expose_private_key_hex());
    println!();
    println!("📍 ADDRESS:");
    println!("   {}", identity.address().to_checksum(None));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if let Some(dir) = output {
        persist_identity(&identity, &dir, &name)
            .with_context(|| format!("Failed to save identity under {}", dir.display()))?;
        println!();
        println!("💾 Saved as {}/{}-private.key", dir.display(), name);
    }
    Ok(())
}
