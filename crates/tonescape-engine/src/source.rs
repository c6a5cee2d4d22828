//! Audio source acceptance.

use crate::error::EngineError;

/// Substring a track name must contain to be accepted
pub const TRACK_MARKER: &str = ".mp3";

/// Accept or reject a replacement track by its file name.
///
/// Only names containing `.mp3` are accepted; anything else is reported
/// back without touching the engine.
pub fn check_track_name(name: &str) -> Result<(), EngineError> {
    if name.contains(TRACK_MARKER) {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!(
            "'{}' is not an MP3 file",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp3_names_accepted() {
        assert!(check_track_name("Still.mp3").is_ok());
        assert!(check_track_name("mix.mp3.part").is_ok());
    }

    #[test]
    fn test_other_names_rejected() {
        for name in ["song.wav", "song.MP3", "mp3", "notes.txt"] {
            assert!(matches!(
                check_track_name(name),
                Err(EngineError::InvalidInput(_))
            ));
        }
    }
}
