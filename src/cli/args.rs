use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "company-directory",
    version,
    about = "categorized company directory with an Airtable data proxy",
    long_about = "Serves a directory of companies grouped by category, with search, and a proxy endpoint that forwards to Airtable.\n\nExamples:\n  company-directory serve\n  company-directory serve --port 9000 --bind 0.0.0.0\n  company-directory show --search iron\n  company-directory show --offline -o directory.html\n\nAirtable credentials come from AIRTABLE_API_KEY, AIRTABLE_BASE_ID and AIRTABLE_TABLE_NAME (environment or .env)."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.company-directory/config.yml)."
    )]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the directory page and the data proxy.
    Serve(ServeArgs),
    /// Print or export the directory once.
    Show(ShowArgs),
    /// Write a default config file if none exists.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(
        short = 'b',
        long = "bind",
        value_name = "ADDR",
        help_heading = "Server",
        help = "Address to listen on."
    )]
    pub bind: Option<String>,

    #[arg(
        short = 'p',
        long = "port",
        value_name = "PORT",
        help_heading = "Server",
        help = "Port to listen on."
    )]
    pub port: Option<u16>,

    #[arg(
        long = "proxy-url",
        value_name = "URL",
        help_heading = "Data",
        help = "Fetch live data from this proxy instead of the server's own route."
    )]
    pub proxy_url: Option<String>,

    #[arg(
        long = "api-root",
        value_name = "URL",
        help_heading = "Data",
        help = "Airtable API root (default https://api.airtable.com/v0)."
    )]
    pub api_root: Option<String>,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Data",
        help = "Timeout in seconds for Airtable calls and the live-data fetch."
    )]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    #[arg(
        short = 's',
        long = "search",
        value_name = "TERM",
        help_heading = "Filter",
        help = "Only list companies whose name contains TERM (case-insensitive)."
    )]
    pub search: Option<String>,

    #[arg(
        long = "proxy-url",
        value_name = "URL",
        help_heading = "Data",
        help = "Data proxy to fetch live records from."
    )]
    pub proxy_url: Option<String>,

    #[arg(
        long = "offline",
        help_heading = "Data",
        help = "Skip the live fetch and show placeholder data."
    )]
    pub offline: bool,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "Data",
        help = "Timeout in seconds for the live-data fetch."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the directory to FILE instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, html). Inferred from --output when omitted."
    )]
    pub format: Option<String>,
}
