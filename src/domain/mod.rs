pub mod batch;
pub mod feed;
pub mod recipient;
pub mod session;
