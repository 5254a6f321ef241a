// Syncrypt Desktop - Launch Options

use std::ffi::OsString;

use clap::Parser;

/// Command line accepted by the desktop shell
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "syncrypt-desktop", about = "Syncrypt desktop shell")]
pub struct LaunchOptions {
    /// Start in the tray without opening the main window
    #[arg(long)]
    pub hidden: bool,
}

impl LaunchOptions {
    pub fn from_env() -> Self {
        Self::from_args(std::env::args_os())
    }

    /// Parse launch arguments. The OS may inject arguments of its own
    /// (e.g. `-psn_*` on macOS); those never abort the launch.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        match Self::try_parse_from(&args) {
            Ok(options) => options,
            Err(_) => Self {
                hidden: args.iter().any(|arg| arg == "--hidden"),
            },
        }
    }
}
