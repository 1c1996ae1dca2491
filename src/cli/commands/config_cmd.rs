//! Configuration management commands.

use watchwarm::config::Settings;

/// Print the resolved settings as TOML.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}
