pub mod commands;
pub mod ui;
pub mod util;

pub use ui::Output;
pub use util::{ConfigOverrides, load_config, read_reports};
