//! List available setup validators.

use anyhow::Result;
use tickflow_strategies::ValidatorRegistry;

pub async fn run() -> Result<()> {
    let registry = ValidatorRegistry::new();

    println!("Available validators:\n");
    for (key, info) in registry.list() {
        println!("  {} — {}", key, info.name);
        println!("      {}", info.description);
        println!(
            "      defaults: {}",
            serde_json::to_string(&info.default_config)?
        );
        println!();
    }

    Ok(())
}
