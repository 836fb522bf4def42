pub mod api;
pub mod token;
pub mod voice;
