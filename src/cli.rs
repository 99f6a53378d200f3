use clap::Parser;

/// Default target when no base URL is given
pub const DEFAULT_BASE_URL: &str = "http://localhost";

/// Conformance checks for the procurement delivery-request listing API
#[derive(Parser, Debug)]
#[command(name = "procurement-conformance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the service under test
    #[arg(default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Login username
    #[arg(long, default_value = "admin")]
    pub username: String,

    /// Login password
    #[arg(long, default_value = "admin123")]
    pub password: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout_secs: u64,

    /// Also assert that returned items satisfy the requested filter and sort
    #[arg(long)]
    pub strict: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
