//! Opt-in file logging scoped to a cache namespace. Kept out of the core so
//! library consumers can bring their own `log` backend instead.

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use once_cell::sync::OnceCell;
use std::path::Path;

static LOG_GUARD: OnceCell<()> = OnceCell::new();

const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
const ROLLED_FILES: u32 = 7;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// Routes `log` output to `{base_dir}/{namespace}_logs/{namespace}.log` with
/// size-based rotation. The process-wide `log` facade can only be claimed
/// once; later calls (other namespaces, reopened caches) are no-ops.
///
/// # Errors
/// Returns an error if the log directory cannot be created or another logger
/// is already installed.
pub fn init_in(base_dir: &Path, namespace: &str) -> Result<(), Box<dyn std::error::Error>> {
    LOG_GUARD.get_or_try_init(|| -> Result<(), Box<dyn std::error::Error>> {
        let dir = base_dir.join(format!("{namespace}_logs"));
        std::fs::create_dir_all(&dir)?;
        let roller = FixedWindowRoller::builder()
            .build(&format!("{}", dir.join(format!("{namespace}.{{}}.log")).display()), ROLLED_FILES)?;
        let policy =
            CompoundPolicy::new(Box::new(SizeTrigger::new(MAX_LOG_BYTES)), Box::new(roller));
        let appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(dir.join(format!("{namespace}.log")), Box::new(policy))?;
        let config = Config::builder()
            .appender(Appender::builder().build("file", Box::new(appender)))
            .build(Root::builder().appender("file").build(LevelFilter::Info))?;
        log4rs::init_config(config)?;
        Ok(())
    })?;
    Ok(())
}
