//! Clap derive structures for the `gatedeck` CLI.
//!
//! Global flags describe how to reach and authenticate against the managed
//! API; they override the active config profile field by field.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use gatedeck_core::Format;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gatedeck -- export API gateway configuration as declarative files
#[derive(Debug, Parser)]
#[command(
    name = "gatedeck",
    version,
    about = "Export gateway and managed control-plane configuration",
    long_about = "Reads every entity of a gateway control plane and writes it to a\n\
        declarative JSON or YAML file that can later be diffed or synced.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "GATEDECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Managed API address (overrides profile)
    #[arg(long, env = "GATEDECK_KONNECT_ADDR", global = true)]
    pub konnect_addr: Option<String>,

    /// Email used to log in to the managed API
    #[arg(long, env = "GATEDECK_KONNECT_EMAIL", global = true)]
    pub konnect_email: Option<String>,

    /// Password used to log in (or set GATEDECK_KONNECT_PASSWORD)
    #[arg(long, global = true)]
    pub konnect_password: Option<String>,

    /// Extra header sent with every request, as Key:Value (repeatable)
    #[arg(long = "headers", value_name = "KEY:VALUE", global = true)]
    pub headers: Vec<String>,

    /// Disable TLS certificate verification (unsafe outside test setups)
    #[arg(long, global = true)]
    pub tls_skip_verify: bool,

    /// Name to verify the server certificate against
    #[arg(long, global = true)]
    pub tls_server_name: Option<String>,

    /// CA certificate bundle (PEM string)
    #[arg(long, global = true, conflicts_with = "ca_cert_file")]
    pub ca_cert: Option<String>,

    /// CA certificate bundle (PEM file)
    #[arg(long, global = true)]
    pub ca_cert_file: Option<PathBuf>,

    /// Client certificate for mutual TLS (PEM string)
    #[arg(long, global = true, conflicts_with = "tls_client_cert_file")]
    pub tls_client_cert: Option<String>,

    /// Client certificate for mutual TLS (PEM file)
    #[arg(long, global = true)]
    pub tls_client_cert_file: Option<PathBuf>,

    /// Client key for mutual TLS (PEM string)
    #[arg(long, global = true, conflicts_with = "tls_client_key_file")]
    pub tls_client_key: Option<String>,

    /// Client key for mutual TLS (PEM file)
    #[arg(long, global = true)]
    pub tls_client_key_file: Option<PathBuf>,

    /// Netscape cookie file to load into the managed client
    #[arg(long, global = true)]
    pub cookie_jar_path: Option<PathBuf>,

    /// Request timeout in seconds [default: 10]
    #[arg(long, env = "GATEDECK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Trace every request and response to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Work with the managed control-plane API
    Konnect(KonnectArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct KonnectArgs {
    #[command(subcommand)]
    pub command: KonnectCommand,
}

#[derive(Debug, Subcommand)]
pub enum KonnectCommand {
    /// Export every entity of the control plane to a file
    #[command(long_about = "Reads all entities present in the managed control plane and \
        exports them to a file on disk. Consumers and their credentials are left out \
        unless --include-consumers is given.")]
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// File to write to; '-' writes to stdout
    #[arg(long, short = 'o', default_value = "kong")]
    pub output_file: String,

    /// Output format: json or yaml
    #[arg(long, default_value = "yaml", value_parser = parse_format)]
    pub format: Format,

    /// Keep entity IDs in the output
    #[arg(long)]
    pub with_id: bool,

    /// Export consumers, their credentials and consumer-bound plugins
    #[arg(long)]
    pub include_consumers: bool,

    /// Control plane to dump, when more than one exists
    #[arg(long)]
    pub control_plane: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

fn parse_format(value: &str) -> Result<Format, String> {
    value
        .parse()
        .map_err(|_| format!("unknown format '{value}' (expected json or yaml)"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dump_defaults() {
        let cli = Cli::try_parse_from(["gatedeck", "konnect", "dump"]).unwrap();
        let Command::Konnect(KonnectArgs {
            command: KonnectCommand::Dump(args),
        }) = cli.command
        else {
            panic!("expected konnect dump");
        };
        assert_eq!(args.output_file, "kong");
        assert_eq!(args.format, Format::Yaml);
        assert!(!args.with_id);
        assert!(!args.include_consumers);
    }

    #[test]
    fn format_is_case_insensitive() {
        let cli =
            Cli::try_parse_from(["gatedeck", "konnect", "dump", "--format", "JSON"]).unwrap();
        let Command::Konnect(KonnectArgs {
            command: KonnectCommand::Dump(args),
        }) = cli.command
        else {
            panic!("expected konnect dump");
        };
        assert_eq!(args.format, Format::Json);
    }

    #[test]
    fn headers_are_repeatable_and_global() {
        let cli = Cli::try_parse_from([
            "gatedeck",
            "konnect",
            "dump",
            "--headers",
            "A:1",
            "--headers",
            "B:2",
        ])
        .unwrap();
        assert_eq!(cli.global.headers, ["A:1", "B:2"]);
    }
}
