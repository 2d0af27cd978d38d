pub mod backends;
pub mod decoders;
pub mod stores;
