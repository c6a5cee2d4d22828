mod player;
mod track;

pub use player::Player;
pub use track::{decode_track, Track};
