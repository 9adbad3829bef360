use clap::Parser;
use renderer::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};
use shadersource::Locator;

#[derive(Parser, Debug)]
#[command(
    name = "triquad",
    author,
    version,
    about = "Animated full-window quad driven by a GLSL vertex/fragment pair"
)]
pub struct Cli {
    /// Surface width in physical pixels.
    #[arg(
        long,
        value_name = "PX",
        default_value_t = 800,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub width: u32,

    /// Surface height in physical pixels.
    #[arg(
        long,
        value_name = "PX",
        default_value_t = 600,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub height: u32,

    /// Vertex shader location: a file path, `file://` URL or http(s) URL.
    #[arg(
        long,
        value_name = "LOCATOR",
        default_value = DEFAULT_VERTEX_SHADER,
        value_parser = parse_locator
    )]
    pub vertex: String,

    /// Fragment shader location: a file path, `file://` URL or http(s) URL.
    #[arg(
        long,
        value_name = "LOCATOR",
        default_value = DEFAULT_FRAGMENT_SHADER,
        value_parser = parse_locator
    )]
    pub fragment: String,

    /// Exit instead of rendering when a shader fails to compile or link.
    #[arg(long)]
    pub strict: bool,

    /// Window title.
    #[arg(long, value_name = "TEXT", default_value = "triquad")]
    pub title: String,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Rejects locators that could never be fetched; the raw text is kept.
pub fn parse_locator(value: &str) -> Result<String, String> {
    Locator::parse(value)
        .map(|_| value.trim().to_string())
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_bundled_shaders() {
        let cli = Cli::try_parse_from(["triquad"]).unwrap();
        assert_eq!((cli.width, cli.height), (800, 600));
        assert_eq!(cli.vertex, DEFAULT_VERTEX_SHADER);
        assert_eq!(cli.fragment, DEFAULT_FRAGMENT_SHADER);
        assert!(!cli.strict);
        assert_eq!(cli.title, "triquad");
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "triquad",
            "--width",
            "1280",
            "--height",
            "720",
            "--vertex",
            "https://example.com/a.vert",
            "--fragment",
            " local/b.frag ",
            "--strict",
        ])
        .unwrap();
        assert_eq!((cli.width, cli.height), (1280, 720));
        assert_eq!(cli.vertex, "https://example.com/a.vert");
        assert_eq!(cli.fragment, "local/b.frag");
        assert!(cli.strict);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(Cli::try_parse_from(["triquad", "--width", "0"]).is_err());
        assert!(Cli::try_parse_from(["triquad", "--height", "0"]).is_err());
    }

    #[test]
    fn unusable_locators_are_rejected() {
        assert!(parse_locator("").is_err());
        assert!(parse_locator("http://").is_err());
        assert_eq!(parse_locator("shaders/x.frag").unwrap(), "shaders/x.frag");
    }
}
