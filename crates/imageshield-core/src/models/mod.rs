pub mod activity;
pub mod session;
pub mod tool;
