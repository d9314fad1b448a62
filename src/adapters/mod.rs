pub mod feed;
pub mod transport;
