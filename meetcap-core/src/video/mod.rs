pub mod capturer;
pub mod frame;
