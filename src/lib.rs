pub mod classpath;
pub mod cli;
pub mod config;
pub mod fonts;
pub mod layout;
pub mod logging;
pub mod manifest;
pub mod package;
pub mod project;
pub mod runner;
pub mod settings;
pub mod tasks;
pub mod util;
