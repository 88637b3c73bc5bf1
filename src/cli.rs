use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "routescan",
    version,
    about = "Static HTTP route discovery for web projects",
    after_help = r#"Examples:
  routescan scan --project .
  routescan scan --project ./examples/basic-app --pretty
  routescan scan --project /srv/api --timeout-ms 5000
  RUST_LOG=routescan=debug routescan scan --project .
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan a project once and print the route catalog as one JSON document.
    Scan {
        #[arg(long, default_value = ".")]
        project: PathBuf,
        /// Include files ignored by .gitignore.
        #[arg(long)]
        no_ignore: bool,
        /// Abort the scan after this many milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Skip files larger than this many bytes.
        #[arg(long, default_value_t = 10 * 1024 * 1024)]
        max_file_bytes: u64,
        /// Pretty-print the JSON response.
        #[arg(long)]
        pretty: bool,
    },
}
