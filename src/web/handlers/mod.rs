pub mod albums;
pub mod artists;
pub mod artwork;
pub mod downloadhistory;
pub mod genres;
pub mod helpers;
pub mod player;
pub mod playlists;
pub mod queue;
pub mod radio;
pub mod root;
pub mod scanner;
pub mod search;
pub mod tracks;
