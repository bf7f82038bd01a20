//! `casewise onboard`: First-time setup.

use casewise_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Casewise — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load_from(&config_path)?;
    let transcript_dir = config.storage.transcript_dir();
    if !transcript_dir.exists() {
        std::fs::create_dir_all(&transcript_dir)?;
        println!("✅ Created transcript directory: {}", transcript_dir.display());
    }

    let pool = config.credential_pool(None);
    println!("\n📝 Next steps:");
    if pool.is_empty() {
        println!("   1. Set GEMINI_API_KEY (or add api_keys to config.toml)");
    } else {
        println!("   1. {} API key(s) found", pool.len());
    }
    println!("   2. Point [notify] at your team's webhook, or keep \"log\" to try things out");
    println!("   3. Run: casewise chat");
    println!();

    Ok(())
}
