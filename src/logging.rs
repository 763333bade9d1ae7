//! Structured logging.
//!
//! Library code logs through the [`log`] facade. [`init()`] routes the facade
//! into a JSON [`slog`] logger installed as the global one.

use std::io;

use chrono::Local;
use slog::{
    o, Drain, Duplicate, FnValue, Fuse, Level, Logger, PushFnValue, Record,
};
use slog_async::Async;
use slog_json::Json;
use slog_scope::GlobalLoggerGuard;

use crate::conf;

/// Builds JSON [`Logger`] which prints its log records below WARN level to
/// `w_out` writer and WARN level (and higher) to `w_err` writer.
///
/// Records less severe than the provided `level` are dropped. [`Async`] drain
/// with channel size of 2048 entries is used.
///
/// Created [`Logger`] produces log records with `fqn`, `lvl`, `time` and
/// `msg` fields by default.
pub fn new_dual_logger<W1, W2>(w_out: W1, w_err: W2, level: Level) -> Logger
where
    W1: io::Write + Send + 'static,
    W2: io::Write + Send + 'static,
{
    let drain_out = Json::new(w_out).build();
    let drain_err = Json::new(w_err).build();
    let drain = Duplicate(
        drain_out.filter(|r| !r.level().is_at_least(Level::Warning)),
        drain_err.filter_level(Level::Warning),
    )
    .map(Fuse);
    let drain = drain.filter_level(level).fuse();
    let drain = Async::new(drain).chan_size(2048).build().fuse();
    add_default_keys(&Logger::root(drain, o!()))
}

/// Installs a stdout/stderr [`new_dual_logger()`] as the global logger and
/// redirects the [`log`] facade into it.
///
/// Returns [`None`] if logging is disabled by the provided [`conf::Log`].
/// Otherwise the returned [`GlobalLoggerGuard`] must be held for as long as
/// logging is required.
///
/// # Errors
///
/// If the [`log`] facade has been initialized already.
pub fn init(
    conf: &conf::Log,
) -> Result<Option<GlobalLoggerGuard>, log::SetLoggerError> {
    let (level, facade_level) = match (conf.level(), conf.facade_level()) {
        (Some(level), Some(facade)) => (level, facade),
        _ => return Ok(None),
    };
    let logger = new_dual_logger(io::stdout(), io::stderr(), level);
    let guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init_with_level(facade_level)?;
    Ok(Some(guard))
}

/// Adds default log record data (key-value pairs) to specified [`Logger`]:
/// - `msg`: log record message;
/// - `fqn`: path to code line that called log function;
/// - `time`: creation date and time of log record in [RFC 3339] format;
/// - `lvl`: logging level of log record.
///
/// [RFC 3339]: https://www.ietf.org/rfc/rfc3339.txt
fn add_default_keys(logger: &Logger) -> Logger {
    logger.new(o!(
        "msg" => PushFnValue(move |record : &Record, ser| {
            ser.emit(record.msg())
        }),
        "fqn" => PushFnValue(move |record : &Record, ser| {
            ser.emit(format_args!("{}:{}", record.module(), record.line()))
        }),
        "time" => PushFnValue(move |_ : &Record, ser| {
            ser.emit(Local::now().to_rfc3339())
        }),
        "lvl" => FnValue(move |record : &Record| {
            record.level().as_str()
        }),
    ))
}
