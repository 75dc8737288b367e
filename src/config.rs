use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "terra-globe")]
#[command(about = "Interactive globe of climate stories, in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Explore the globe (default)
    Globe,

    /// Open a country's storybook straight away (e.g. USA, JPN, TERRA)
    Book { code: String },

    /// Open the Terra Earth explorer: five countries, 25 years of data
    Game,

    /// Run the contact endpoint (configured through CONTACT_ADDR,
    /// RESEND_API_KEY, FROM_EMAIL, TO_EMAIL, RESEND_URL)
    Serve,

    /// Build a storybook from NDVI yearly means and print it as JSON
    Ndvi { input: PathBuf },
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Directory holding coastline GeoJSON
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding storybook JSON files
    #[arg(long, global = true, default_value = "stories")]
    pub stories_dir: PathBuf,

    /// Number of background stars
    #[arg(long, global = true, default_value = "1000")]
    pub stars: usize,

    /// Starfield seed
    #[arg(long, global = true, default_value = "42")]
    pub seed: u64,

    /// Deep link to open on start, e.g. '#loc=Tokyo%2C%20Japan'
    #[arg(long, global = true)]
    pub link: Option<String>,

    /// Contact endpoint the form posts to
    #[arg(long, global = true, default_value = "http://127.0.0.1:8787/api/contact")]
    pub endpoint: String,

    /// Do not read storybook pages aloud
    #[arg(long, global = true)]
    pub no_narration: bool,

    /// Log file for the terminal UI (the service logs to stderr)
    #[arg(long, global = true, default_value = "terra-globe.log")]
    pub log_file: PathBuf,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Globe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_globe() {
        let cli = Cli::try_parse_from(["terra-globe"]).expect("parses");
        assert_eq!(cli.command(), Command::Globe);
        assert_eq!(cli.view.stars, 1000);
        assert_eq!(cli.view.stories_dir, PathBuf::from("stories"));
        assert!(cli.view.link.is_none());
    }

    #[test]
    fn test_book_with_global_flags() {
        let cli = Cli::try_parse_from(["terra-globe", "book", "jpn", "--stories-dir", "/tmp/s", "--no-narration"])
            .expect("parses");
        assert_eq!(cli.command(), Command::Book { code: "jpn".to_string() });
        assert_eq!(cli.view.stories_dir, PathBuf::from("/tmp/s"));
        assert!(cli.view.no_narration);
    }

    #[test]
    fn test_game_subcommand() {
        let cli = Cli::try_parse_from(["terra-globe", "game", "--seed", "9"]).expect("parses");
        assert_eq!(cli.command(), Command::Game);
        assert_eq!(cli.view.seed, 9);
    }

    #[test]
    fn test_link_flag() {
        let cli = Cli::try_parse_from(["terra-globe", "--link", "#loc=Cairo%2C%20Egypt"]).expect("parses");
        assert_eq!(cli.view.link.as_deref(), Some("#loc=Cairo%2C%20Egypt"));
    }
}
