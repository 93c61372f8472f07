//! [`Args`] definitions.

use clap::Parser;

/// GraphQL server of property statistics and ratings.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn defaults_config_path() {
        let args = Args::try_parse_from(["property-stats"]).unwrap();

        assert_eq!(args.config, "config.toml");
    }

    #[test]
    fn overrides_config_path() {
        let args =
            Args::try_parse_from(["property-stats", "-c", "/etc/stats.toml"])
                .unwrap();

        assert_eq!(args.config, "/etc/stats.toml");
    }
}
