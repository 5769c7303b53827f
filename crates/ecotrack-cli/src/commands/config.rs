use clap::Subcommand;
use ecotrack_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Configure the remote backend
    SetBackend {
        /// Project base URL, e.g. https://xyz.supabase.co
        url: String,
        /// Publishable anon key
        anon_key: String,
    },
    /// Days to keep local daily-completion lists
    SetRetention { days: u32 },
    /// Reset config to defaults (local-only mode)
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetBackend { url, anon_key } => {
            let mut config = Config::load_or_default();
            config.backend.url = url;
            config.backend.anon_key = anon_key;
            config.save()?;
            println!("ok");
        }
        ConfigAction::SetRetention { days } => {
            let mut config = Config::load_or_default();
            config.retention.completion_retention_days = days;
            config.save()?;
            println!("ok");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
