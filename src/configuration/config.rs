#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use strum::VariantNames;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ConfigFile,
    ProjectEndpoint,
    AgentId,
    AccessToken,
    ApiVersion,
    PollInterval,
    RunTimeout,
    RequestTimeout,
}

impl ConfigKey {
    fn is_required(&self) -> bool {
        return matches!(self, ConfigKey::ProjectEndpoint | ConfigKey::AgentId);
    }

    fn is_numeric(&self) -> bool {
        return matches!(
            self,
            ConfigKey::PollInterval | ConfigKey::RunTimeout | ConfigKey::RequestTimeout
        );
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return path::PathBuf::from("."))
            .join("agentchat/config.toml");

        let res = match key {
            ConfigKey::ProjectEndpoint => "",
            ConfigKey::AgentId => "",
            ConfigKey::AccessToken => "",
            ConfigKey::ApiVersion => "v1",
            ConfigKey::PollInterval => "500",
            ConfigKey::RunTimeout => "0",
            ConfigKey::RequestTimeout => "30000",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for (name, _) in doc.iter() {
                if !ConfigKey::VARIANTS.contains(&name) {
                    tracing::warn!(key = name, "Ignoring unknown key in config file");
                }
            }

            for key in ConfigKey::iter() {
                if key == ConfigKey::ConfigFile {
                    continue;
                }
                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        Config::set(key, val_str);
                    } else {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}', expected a string or a number"
                        ));
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            project_endpoint = Config::get(ConfigKey::ProjectEndpoint),
            agent_id = Config::get(ConfigKey::AgentId),
            api_version = Config::get(ConfigKey::ApiVersion),
            poll_interval = Config::get(ConfigKey::PollInterval),
            run_timeout = Config::get(ConfigKey::RunTimeout),
            request_timeout = Config::get(ConfigKey::RequestTimeout),
            "config"
        );

        return Ok(());
    }

    /// Checks the loaded values before anything talks to the agent service.
    pub fn validate() -> Result<()> {
        return validate_with(Config::get);
    }

    pub fn get_u64(key: ConfigKey) -> Result<u64> {
        return parse_u64(key, &Config::get(key));
    }

    pub fn poll_interval() -> Result<Duration> {
        return Ok(Duration::from_millis(Config::get_u64(
            ConfigKey::PollInterval,
        )?));
    }

    /// `None` when no ceiling is configured.
    pub fn run_timeout() -> Result<Option<Duration>> {
        let secs = Config::get_u64(ConfigKey::RunTimeout)?;
        if secs == 0 {
            return Ok(None);
        }

        return Ok(Some(Duration::from_secs(secs)));
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_id().as_str() == key.to_string())?;

                let description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if key.is_numeric() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}

fn parse_u64(key: ConfigKey, val: &str) -> Result<u64> {
    match val.trim().parse::<u64>() {
        Ok(res) => return Ok(res),
        Err(_) => bail!(format!(
            "Config value for '{key}' must be a whole number, got '{val}'"
        )),
    }
}

fn validate_with(get: impl Fn(ConfigKey) -> String) -> Result<()> {
    for key in ConfigKey::iter() {
        let val = get(key);
        if key.is_required() && val.trim().is_empty() {
            bail!(format!(
                "Missing required config value '{key}'. Set it with --{key}, the AGENTCHAT_{} environment variable, or in the config file.",
                key.to_string().to_uppercase().replace('-', "_")
            ));
        }
        if key.is_numeric() {
            parse_u64(key, &val)?;
        }
    }

    if get(ConfigKey::PollInterval).trim() == "0" {
        bail!("Config value for 'poll-interval' must be greater than zero");
    }

    let endpoint = get(ConfigKey::ProjectEndpoint);
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        bail!(format!(
            "Config value for 'project-endpoint' must be an http(s) URL, got '{endpoint}'"
        ));
    }

    return Ok(());
}
