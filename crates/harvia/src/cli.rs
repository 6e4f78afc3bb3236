//! Clap derive structures for the `harvia` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// harvia -- control Harvia Xenio WiFi saunas from the command line
#[derive(Debug, Parser)]
#[command(
    name = "harvia",
    version,
    about = "Control Harvia saunas from the command line",
    long_about = "Read status and send commands to Harvia Xenio WiFi saunas\n\
        through the MyHarvia cloud. Uses the same account as the MyHarvia app.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "HARVIA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device id (defaults to the profile's device, then the first device)
    #[arg(long, short = 'd', env = "HARVIA_DEVICE", global = true)]
    pub device: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HARVIA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "HARVIA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List saunas on the account with their current status
    #[command(alias = "ls", alias = "list")]
    Devices(DevicesArgs),

    /// Show full status of one sauna
    #[command(alias = "st")]
    Status,

    /// Turn the heater on
    On,

    /// Turn the heater off
    Off,

    /// Set the target temperature (°F, 104-230)
    #[command(alias = "temperature")]
    Temp(TempArgs),

    /// Switch the lights
    Lights(SwitchArgs),

    /// Switch the steamer
    Steamer(SwitchArgs),

    /// Switch the fan
    Fan(SwitchArgs),

    /// Set the target relative humidity (%, 0-140)
    Humidity(HumidityArgs),

    /// Serve the sauna actions as MCP tools over stdio
    Mcp,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Sauna commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Leave out devices whose state cannot be read instead of failing
    #[arg(long)]
    pub skip_failed: bool,
}

#[derive(Debug, Args)]
#[command(allow_negative_numbers = true)]
pub struct TempArgs {
    /// Target temperature in degrees Fahrenheit
    #[arg(value_name = "FAHRENHEIT")]
    pub fahrenheit: f64,
}

#[derive(Debug, Args)]
#[command(allow_negative_numbers = true)]
pub struct HumidityArgs {
    /// Target relative humidity in percent
    #[arg(value_name = "PERCENT")]
    pub percent: i64,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Desired state
    pub state: SwitchState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (username, device, region, discovery_url, cognito_endpoint, timeout, listing_policy)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the account password in the system keyring (for --profile)
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
