use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the application data directory based on platform
pub fn get_app_data_dir() -> Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        // Try dirs::home_dir() first, then fall back to HOME environment variable
        let home = dirs::home_dir()
            .or_else(|| std::env::var("HOME").ok().map(PathBuf::from))
            .context("Failed to get home directory - neither dirs::home_dir() nor HOME env var worked")?;
        Ok(home.join("Library/Application Support/TrustLens"))
    }

    #[cfg(target_os = "windows")]
    {
        let app_data = std::env::var("APPDATA").context("APPDATA environment variable not set")?;
        Ok(PathBuf::from(app_data).join("TrustLens"))
    }

    #[cfg(target_os = "linux")]
    {
        // Try dirs::home_dir() first, then fall back to HOME environment variable
        let home = dirs::home_dir()
            .or_else(|| std::env::var("HOME").ok().map(PathBuf::from))
            .context("Failed to get home directory - neither dirs::home_dir() nor HOME env var worked")?;
        Ok(home.join(".config/trustlens"))
    }
}

/// Get the path to the logs directory
pub fn get_logs_dir() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join("logs"))
}

/// Get the path to the config file
pub fn get_config_file() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join("config.json"))
}

/// Ensure the application directories exist
pub fn ensure_directories() -> Result<()> {
    let app_data = get_app_data_dir()?;
    std::fs::create_dir_all(&app_data).context("Failed to create app data directory")?;

    let logs = get_logs_dir()?;
    std::fs::create_dir_all(&logs).context("Failed to create logs directory")?;

    Ok(())
}
