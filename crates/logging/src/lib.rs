//! A process-wide `tracing` subscriber rendering `DD.MM.YYYY HH:MM:SS
//! [LEVEL] message`, plus [`GroupedInt`]/[`GroupedBig`] for
//! underscore-grouped large integers in log messages.

use std::fmt;

use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// `DD.MM.YYYY HH:MM:SS`, local time.
struct WireTime;

impl FormatTime for WireTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%d.%m.%Y %H:%M:%S"))
    }
}

/// Renders one event as `<time> [<LEVEL>] <fields...>`, matching the wire
/// wire format this system's log output uses.
struct WireFormat;

impl<S, N> FormatEvent<S, N> for WireFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        WireTime.format_time(&mut writer)?;
        write!(writer, " [{}] ", level_label(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Installs the process-wide subscriber. DEBUG-level spans/events are
/// only emitted when `verbose` is set (the CLI's `-v`/`--verbose` flag);
/// everything else always logs at INFO and above.
pub fn install(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_timer(WireTime)
        .event_format(WireFormat)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

/// Wraps a `u64` so its `Display` groups digits with underscores every
/// three places (`1048577` -> `1_048_577`), matching this system's log
/// format.
pub struct GroupedInt(pub u64);

impl fmt::Display for GroupedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", group_digits(&self.0.to_string()))
    }
}

/// Same grouping as [`GroupedInt`], for any value whose `Display` renders
/// a plain decimal integer (in practice, `erdos_bigint::BigUint`).
pub struct GroupedBig<'a, T: fmt::Display>(pub &'a T);

impl<'a, T: fmt::Display> fmt::Display for GroupedBig<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", group_digits(&self.0.to_string()))
    }
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_small_numbers_unchanged() {
        assert_eq!(GroupedInt(0).to_string(), "0");
        assert_eq!(GroupedInt(7).to_string(), "7");
        assert_eq!(GroupedInt(999).to_string(), "999");
    }

    #[test]
    fn groups_large_numbers() {
        assert_eq!(GroupedInt(1000).to_string(), "1_000");
        assert_eq!(GroupedInt(1_048_577).to_string(), "1_048_577");
        assert_eq!(GroupedInt(5_000_000).to_string(), "5_000_000");
    }

    #[test]
    fn grouped_big_matches_grouped_int_for_same_value() {
        let n = 123_456_789u64;
        assert_eq!(GroupedInt(n).to_string(), GroupedBig(&n).to_string());
    }
}
