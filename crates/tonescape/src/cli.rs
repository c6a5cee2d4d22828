use clap::Parser;
use std::path::PathBuf;
use tonescape_engine::ModeKind;

#[derive(Parser, Debug)]
#[command(name = "tonescape", about = "Audio-reactive visualizer for MP3 tracks")]
pub struct Cli {
    /// MP3 file to load at startup (defaults to the last loaded track)
    #[arg(short, long)]
    pub track: Option<PathBuf>,

    /// Mode to start in: mosaic, sphere, shader or tunnel
    #[arg(short, long)]
    pub mode: Option<ModeKind>,

    /// Seed for reproducible scenes
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run in a window instead of fullscreen
    #[arg(short, long)]
    pub windowed: bool,

    /// List audio output devices and exit
    #[arg(long)]
    pub audio_info: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["tonescape", "-w", "--mode", "tunnel", "--seed", "3"]);
        assert!(cli.windowed);
        assert_eq!(cli.mode, Some(ModeKind::Tunnel));
        assert_eq!(cli.seed, Some(3));
        assert!(cli.track.is_none());
    }

    #[test]
    fn test_bad_mode_is_rejected() {
        assert!(Cli::try_parse_from(["tonescape", "--mode", "plasma"]).is_err());
    }
}
