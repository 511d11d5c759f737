pub mod address;
pub mod time;
