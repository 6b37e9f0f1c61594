// Library surface shared by the binary and the headless integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod game;
pub mod line_feed;
pub mod metrics;
pub mod random;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod storage;
pub mod ui;
