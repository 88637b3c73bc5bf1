use anyhow::Result;
use clap::Parser;
use routescan::{cli, scanner};
use serde_json::json;
use std::time::Duration;

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries exactly one JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();
    match args.command {
        cli::Command::Scan {
            project,
            no_ignore,
            timeout_ms,
            max_file_bytes,
            pretty,
        } => {
            let options = scanner::ScanOptions {
                no_ignore,
                max_file_bytes,
                timeout: timeout_ms.map(Duration::from_millis),
            };
            let scanner = scanner::Scanner::new(options);
            match scanner.scan(&project) {
                Ok(result) => {
                    let response = json!({
                        "success": true,
                        "routes": result.routes,
                        "stats": result.stats,
                    });
                    if pretty {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        println!("{response}");
                    }
                    Ok(())
                }
                Err(err) => {
                    println!("{}", json!({ "success": false, "error": err.to_string() }));
                    Err(err.into())
                }
            }
        }
    }
}
