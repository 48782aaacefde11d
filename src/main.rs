use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use fk::{
    config::{Config, ConfigKey, Overrides},
    error::{FixError, EXIT_CONFIG, EXIT_OK},
    fix_router::{FixInputs, FixRouter},
    llm_generator::{GeminiGenerator, MockGenerator, TextGenerator, API_KEY_ENV},
    reporter::{emit, report},
    request::DEFAULT_SHELL,
};
use std::io;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn cli() -> Command {
    Command::new("fk")
        .about("Suggest a fix for the last failed shell command")
        .long_about("fk asks Gemini to correct a failed command and prints the suggestion as a single JSON record for the calling shell")
        .args_conflicts_with_subcommands(true)
        .arg(Arg::new("shell")
            .long("shell")
            .help("Target shell the fix is for")
            .value_name("SHELL")
            .default_value(DEFAULT_SHELL))
        .arg(Arg::new("cmd-b64")
            .long("cmd-b64")
            .help("Base64-encoded failed command")
            .value_name("BASE64"))
        .arg(Arg::new("err-b64")
            .long("err-b64")
            .help("Base64-encoded error output of the failed command")
            .value_name("BASE64"))
        .arg(Arg::new("model")
            .long("model")
            .help("Gemini model to use instead of the configured one")
            .value_name("MODEL"))
        .arg(Arg::new("temperature")
            .long("temperature")
            .help("Sampling temperature (0.0 to 2.0)")
            .value_name("T")
            .value_parser(value_parser!(f64)))
        .arg(Arg::new("max-tokens")
            .long("max-tokens")
            .help("Maximum output tokens (1 to 8192)")
            .value_name("N")
            .value_parser(value_parser!(u32)))
        .arg(Arg::new("auto-confirm")
            .long("auto-confirm")
            .help("Tell the calling shell it may run the fix without asking")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("timeout")
            .long("timeout")
            .help(format!("Seconds to wait for the model before giving up [default: {}]", DEFAULT_TIMEOUT_SECS))
            .value_name("SECS")
            .value_parser(value_parser!(u64).range(1..)))
        .subcommand(Command::new("config")
            .about("Show or change stored preferences")
            .long_about("With no arguments, print every preference. With KEY, print one. With KEY and VALUE, validate and store it.\nKeys: model, temperature, max_output_tokens, auto_confirm")
            .arg(Arg::new("key").help("Preference to read or write"))
            .arg(Arg::new("value").help("New value for KEY")))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let matches = match cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            let rendered = e.to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            let report = report(Err(FixError::InvalidInput(message)), false);
            emit(&mut io::stdout().lock(), &report.record)?;
            std::process::exit(report.exit_code);
        }
    };

    let code = match matches.subcommand() {
        Some(("config", sub)) => handle_config(sub)?,
        _ => handle_fix(&matches).await?,
    };

    if code != EXIT_OK {
        std::process::exit(code);
    }
    Ok(())
}

async fn handle_fix(matches: &ArgMatches) -> anyhow::Result<i32> {
    let (config, _) = Config::load();

    let inputs = FixInputs {
        shell: matches.get_one::<String>("shell").cloned(),
        cmd_b64: matches.get_one::<String>("cmd-b64").cloned(),
        err_b64: matches.get_one::<String>("err-b64").cloned(),
        overrides: Overrides {
            model: matches.get_one::<String>("model").cloned(),
            temperature: matches.get_one::<f64>("temperature").copied(),
            max_output_tokens: matches.get_one::<u32>("max-tokens").copied(),
            auto_confirm: matches.get_flag("auto-confirm").then_some(true),
        },
    };
    let timeout = Duration::from_secs(
        matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );
    let credential = std::env::var(API_KEY_ENV).ok();

    let report = FixRouter::new(config)
        .process(inputs, credential.as_deref(), |api_key| -> Box<dyn TextGenerator> {
            match MockGenerator::from_env() {
                Some(mock) => Box::new(mock),
                None => Box::new(GeminiGenerator::new(api_key, timeout)),
            }
        })
        .await;

    emit(&mut io::stdout().lock(), &report.record)?;
    Ok(report.exit_code)
}

fn handle_config(matches: &ArgMatches) -> anyhow::Result<i32> {
    let key = matches.get_one::<String>("key");
    let value = matches.get_one::<String>("value");
    let (mut config, _) = Config::load();

    match (key, value) {
        (None, _) => {
            for (key, value) in config.entries() {
                println!("{} = {}", key, value);
            }
            Ok(EXIT_OK)
        }
        (Some(key), None) => match key.parse::<ConfigKey>() {
            Ok(key) => {
                println!("{}", config.get(key));
                Ok(EXIT_OK)
            }
            Err(_) => {
                println!("{}: not found", key);
                Ok(EXIT_CONFIG)
            }
        },
        (Some(key), Some(value)) => {
            let key = match config.set(key, value) {
                Ok(key) => key,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(EXIT_CONFIG);
                }
            };
            if let Err(e) = config.save() {
                eprintln!("Error: could not save config: {:#}", e);
                return Ok(EXIT_CONFIG);
            }
            info!("Updated config key {}", key);
            println!("✅ {} = {}", key, config.get(key));
            Ok(EXIT_OK)
        }
    }
}
