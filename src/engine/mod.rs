pub mod box_score;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod lineup;
pub mod on_court;
pub mod playback;
pub mod quarter_break;
pub mod replay;
pub mod snapshot;
