pub mod app;
pub mod audio;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod controls;
pub mod display;
pub mod engine;
pub mod feedback;
pub mod gpio;
pub mod keyboard;
pub mod loops;
pub mod menu;
pub mod session;
pub mod storage;
