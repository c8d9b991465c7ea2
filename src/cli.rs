use clap::{ArgAction, Parser, ValueEnum};

/// How traced chains are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Yaml,
}

/// Command line arguments
#[derive(Parser)]
#[command(name = "ray-optics")]
#[command(about = "Trace rays through a 2D scene of mirrors, lenses and prisms")]
#[command(version)]
pub struct Args {
    /// Scene description (YAML)
    pub scene: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: Format,

    /// Length drawn for rays that leave the scene
    #[arg(long, default_value = "1000.0")]
    pub far: f64,

    /// Also print where the first and last chain converge
    #[arg(long)]
    pub focal: bool,

    /// Log more of the tracing: -v for scene loading, -vv for recalculation, -vvv per segment
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Default log filter; `RUST_LOG` still takes precedence
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
