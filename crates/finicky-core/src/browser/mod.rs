//! Browser resolution and process launch.

mod directive;
mod launch;
mod resolve;

pub use directive::{AppType, BrowserDirective, DecodeError};
pub use launch::{Launcher, SystemLauncher};
pub use resolve::{launch_args, BrowserResolver, IdentifierKind, LaunchCommand};
