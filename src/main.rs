mod api;
mod auth;
mod checks;
mod cli;
mod client;
mod config;
mod output;
mod query;
mod runner;
mod telemetry;
#[cfg(test)]
mod test_support;

use clap::Parser;
use cli::Cli;
use output::RunOutput;
use runner::Progress;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not failures
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    telemetry::init_tracing(if cli.verbose { "debug" } else { "warn" });

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every top-level check passed
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = config::Config::from_cli(cli)?;
    let json_output = cli.json;

    if !json_output {
        println!("Procurement delivery-request API conformance");
        println!("Base URL: {}", config.base_url);
        if config.strict {
            println!("Mode: strict (content-level assertions)");
        }
        println!();
    }

    let report = runner::run(&config, |event| {
        if json_output {
            return;
        }
        match event {
            Progress::LoggedIn { username } => println!("Logged in as {}\n", username),
            Progress::CheckFinished(check) => print!("{}", output::render_check(check)),
        }
    })
    .map_err(|e| format!("Login failed, aborting run: {}", e))?;

    if json_output {
        output::print_json(&RunOutput::from(&report));
    } else {
        println!(
            "\nStarted: {}",
            report.started_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!("{}", output::render_summary(&report));
    }

    Ok(report.all_passed())
}
