use crate::data::Source;
use clap::Parser;
use clap_verbosity_flag::{ErrorLevel, Verbosity};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Printable point-of-interest map for the terminal",
    long_about = None,
)]
pub struct Args {
    /// uMap JSON or KML file, as a path or http(s) URL
    pub source: String,

    /// Initial view as "NWlat,NWlng-SElat,SElng" (a leading '#' is allowed)
    #[arg(long, value_name = "BOUNDS", allow_hyphen_values = true)]
    pub view: Option<String>,

    /// Print the legend and numbered list instead of opening the map
    #[arg(long)]
    pub print: bool,

    /// Viewport width in Braille pixels for --print
    #[arg(long, default_value_t = 160, requires = "print")]
    pub width: usize,

    /// Viewport height in Braille pixels for --print
    #[arg(long, default_value_t = 96, requires = "print")]
    pub height: usize,

    #[command(flatten)]
    pub verbose: Verbosity<ErrorLevel>,
}

impl Args {
    pub fn source(&self) -> Source {
        Source::parse(&self.source)
    }
}
