pub mod actions;
pub mod app;
pub mod data_frame;
pub mod toolbar;
