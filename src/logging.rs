use std::io::Write;

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};

/// Log target rendered with a green SUCCESS label.
pub const SUCCESS_TARGET: &str = "success";

/// Log a final success line.
#[macro_export]
macro_rules! success {
    ($($arg:tt)+) => {
        log::info!(target: $crate::logging::SUCCESS_TARGET, $($arg)+)
    };
}

pub fn init_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info // CI logs should show progress by default
    };

    let mut builder = Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();

    builder.format(|buf, record| {
        let level_label = match record.level() {
            Level::Info if record.target() == SUCCESS_TARGET => "SUCCESS".green().bold(),
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow().bold(),
            Level::Info => "INFO ".purple().bold(),
            Level::Debug => "DEBUG".bright_black(),
            Level::Trace => "TRACE".bright_black(),
        };

        writeln!(buf, "{} {}", level_label, record.args())
    });

    builder.init();
}
