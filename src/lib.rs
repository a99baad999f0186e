#[macro_use] pub mod core;
#[macro_use] pub mod types;

pub mod cli;
pub mod config;
pub mod formatting;
pub mod report;
pub mod taxes;
pub mod util;
