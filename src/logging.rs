//! Console logging as `<timestamp>, <LEVEL>, <message> key=value...` lines.
//!
//! `tracing` has no critical level; an ERROR event carrying `critical = true`
//! is labelled `CRITICAL` instead.
use chrono::Local;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";
const CRITICAL_FIELD: &str = "critical";

#[derive(Default)]
struct CriticalFlag(bool);

impl Visit for CriticalFlag {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == CRITICAL_FIELD {
            self.0 = value;
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
}

fn level_label(event: &Event<'_>) -> &'static str {
    let level = *event.metadata().level();
    if level == Level::ERROR {
        let mut flag = CriticalFlag::default();
        event.record(&mut flag);
        if flag.0 {
            return "CRITICAL";
        }
    }
    level.as_str()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{}, {}, ",
            Local::now().format(TIMESTAMP_FORMAT),
            level_label(event)
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber on stderr. `RUST_LOG` overrides the `info` default.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .event_format(LineFormat)
        .init();
}
