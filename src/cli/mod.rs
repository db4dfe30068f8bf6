mod args;
mod commands;
mod input;
mod repl;
mod settings_panel;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub(crate) mod theme;
mod timeline;
mod view;

pub use args::CliArgs;
pub use repl::{App, AppDeps, Focus, run_tui};
pub use theme::Theme;
pub use view::{Regions, layout_regions};
