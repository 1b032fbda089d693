use clap::Parser;

/// Command line arguments. On the platform everything arrives through the
/// environment; the flags exist for local runs.
#[derive(Debug, Parser)]
#[command(version, about = "Warm hand-off agent for scale-to-zero request servers")]
pub struct Cli {
    /// Overrides the `PORT` environment variable for the request listener.
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    pub fn init() -> Self {
        Self::parse()
    }
}
