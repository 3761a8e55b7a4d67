#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = std::env::var("AGENTCHAT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("agentchat");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for agentchat")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running agentchat with environment variable RUST_LOG=agentchat")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start a new chat session with the configured agent. This is the default when no subcommand is given.");
}

fn config_arg(key: ConfigKey, env: &'static str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    let after_help = [
        "CHAT COMMANDS:",
        "  <text>           Send a message to the agent.",
        "  upload <path>    Upload a local file and tell the agent about it.",
        "  quit             End the session.",
    ]
    .join("\n");

    return Command::new("agentchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(after_help)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            config_arg(
                ConfigKey::ConfigFile,
                "AGENTCHAT_CONFIG_FILE",
                format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)),
            )
            .short('c'),
        )
        .arg(
            config_arg(
                ConfigKey::ProjectEndpoint,
                "AGENTCHAT_PROJECT_ENDPOINT",
                "Azure AI Foundry project endpoint hosting the agent, e.g. https://<resource>.services.ai.azure.com/api/projects/<project>.".to_string(),
            )
            .short('p'),
        )
        .arg(
            config_arg(
                ConfigKey::AgentId,
                "AGENTCHAT_AGENT_ID",
                "ID of the agent to chat with.".to_string(),
            )
            .short('a'),
        )
        .arg(config_arg(
            ConfigKey::AccessToken,
            "AGENTCHAT_ACCESS_TOKEN",
            "Bearer token sent with every request. Requests are sent without an Authorization header when empty.".to_string(),
        ))
        .arg(config_arg(
            ConfigKey::ApiVersion,
            "AGENTCHAT_API_VERSION",
            format!("API version of the agent service. [default: {}]", Config::default(ConfigKey::ApiVersion)),
        ))
        .arg(config_arg(
            ConfigKey::PollInterval,
            "AGENTCHAT_POLL_INTERVAL",
            format!("Time to wait in milliseconds between run status checks. [default: {}]", Config::default(ConfigKey::PollInterval)),
        ))
        .arg(config_arg(
            ConfigKey::RunTimeout,
            "AGENTCHAT_RUN_TIMEOUT",
            format!("Seconds to wait for a run to finish before cancelling it, 0 waits forever. [default: {}]", Config::default(ConfigKey::RunTimeout)),
        ))
        .arg(config_arg(
            ConfigKey::RequestTimeout,
            "AGENTCHAT_REQUEST_TIMEOUT",
            format!("Time to wait in milliseconds for a single request to the agent service. [default: {}]", Config::default(ConfigKey::RequestTimeout)),
        ));
}

/// Handles every subcommand that does not start a chat. Returns true when a
/// chat session should start with the loaded config.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_dir().join("debug.log").to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(vec![&matches]).await?;
        }
    }

    return Ok(true);
}
