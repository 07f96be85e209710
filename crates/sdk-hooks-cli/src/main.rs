mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use sdk_hooks::HookError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sdkhook",
    about = "Run a project's SDK hook scripts and print their responses",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory to start the hooks-file search from (default: auto-detect from .slack/)
    #[arg(long, global = true, env = "SDKHOOK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log hook commands and their streamed output
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one hook and print its response
    Run {
        /// Hook key from the hooks file, e.g. `get-manifest` or `start`
        hook: String,

        /// Extra flag passed to the hook as --KEY="VALUE" (repeatable)
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        args: Vec<(String, String)>,

        /// Environment variable set for the hook (repeatable)
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        env: Vec<(String, String)>,

        /// Connect this process's stdin to the hook
        #[arg(long)]
        stdin: bool,
    },

    /// List the hooks configured for the project
    Hooks,

    /// Show the protocol negotiated with the project's SDK
    Protocol,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Run {
            hook,
            args,
            env,
            stdin,
        } => cmd::run::run(
            &root,
            cmd::run::RunRequest {
                hook,
                args,
                env,
                stdin,
            },
            cli.json,
        ),
        Commands::Hooks => cmd::hooks::run(&root, cli.json),
        Commands::Protocol => cmd::protocol::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        if let Some(hook_err) = e.downcast_ref::<HookError>() {
            for detail in hook_err.details() {
                if !detail.message.is_empty() {
                    eprintln!("  {}", detail.message);
                }
            }
            if let Some(hint) = hook_err.remediation() {
                eprintln!("hint: {hint}");
            }
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("source=local=1").unwrap(),
            ("source".to_string(), "local=1".to_string())
        );
        assert_eq!(
            parse_key_val("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
