//! Logging infrastructure using `log` + `log4rs`.
//!
//! Console output goes to stderr; when a log directory is configured, a
//! rolling, gzip-archived file appender is added. Filtering is
//! whitelist-based: external crates are silent unless opted in.

use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            policy::compound::{roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy},
            RollingFileAppender,
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Config,
};
use std::path::PathBuf;

const CONSOLE_APPENDER: &str = "stderr";
const LOG_FILE_APPENDER: &str = "log_file";

const LOG_FILE_NAME: &str = "tala.log";
const LOG_FILE_MAX_SIZE: u64 = 10 * 1024 * 1024;
const LOG_FILE_MAX_ROLLS: u32 = 4;
const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t}: {m}{n}";

/// Crates whitelisted at the requested app level by default.
const WHITELISTED_CRATES: &[&str] = &["tala_core"];

/// Parsed form of a filter expression like `"info,tala_core=debug,root=warn"`.
struct FilterSpec {
    app_level: LevelFilter,
    root_level: LevelFilter,
    modules: Vec<(String, LevelFilter)>,
}

/// Initialize the global logger with optional file output.
///
/// `filters` follows the whitelist convention: a bare level sets the app
/// level for this crate, `<module>=<level>` opts in a specific module, and
/// `root=<level>` opts in everything else. The logger is global; repeated
/// calls are ignored.
pub fn init_logger(log_dir: Option<&str>, filters: &str) {
    let spec = parse_filters(filters);

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build();

    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut appenders: Vec<&str> = vec![CONSOLE_APPENDER];

    if let Some(dir) = log_dir.map(str::trim).filter(|s| !s.is_empty()) {
        let log_path = PathBuf::from(dir).join(LOG_FILE_NAME);
        let archive_pattern = PathBuf::from(dir).join(format!("{LOG_FILE_NAME}.{{}}.gz"));

        let roller_result = FixedWindowRoller::builder()
            .base(1)
            .build(archive_pattern.to_str().unwrap_or("tala.log.{}.gz"), LOG_FILE_MAX_ROLLS);
        let file_appender = roller_result.ok().and_then(|roller| {
            let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(LOG_FILE_MAX_SIZE)), Box::new(roller));
            RollingFileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
                .build(log_path, Box::new(policy))
                .ok()
        });
        if let Some(file_appender) = file_appender {
            builder = builder.appender(Appender::builder().build(LOG_FILE_APPENDER, Box::new(file_appender)));
            appenders.push(LOG_FILE_APPENDER);
        }
    }

    let appender_names: Vec<String> = appenders.iter().map(|name| (*name).to_string()).collect();

    for crate_name in WHITELISTED_CRATES {
        if !spec.modules.iter().any(|(m, _)| m == *crate_name) {
            builder = builder.logger(
                Logger::builder().appenders(appender_names.clone()).additive(false).build(*crate_name, spec.app_level),
            );
        }
    }
    for (module, level) in &spec.modules {
        builder =
            builder.logger(Logger::builder().appenders(appender_names.clone()).additive(false).build(module, *level));
    }

    if let Ok(config) = builder.build(Root::builder().appenders(appenders).build(spec.root_level)) {
        let _ = log4rs::init_config(config);
    }
}

fn parse_filters(filters: &str) -> FilterSpec {
    let mut app_level = LevelFilter::Info;
    let mut root_level = LevelFilter::Off;
    let mut modules = Vec::new();

    for part in filters.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            None => {
                if let Ok(level) = part.parse() {
                    app_level = level;
                }
            }
            Some((module, level_str)) => {
                let module = module.trim();
                let Ok(level) = level_str.trim().parse() else {
                    continue;
                };
                if module == "root" {
                    root_level = level;
                } else if !module.is_empty() {
                    modules.push((module.to_string(), level));
                }
            }
        }
    }

    FilterSpec { app_level, root_level, modules }
}
