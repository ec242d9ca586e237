//! Tracing subscriber setup: console formatter and initialisation.

/// Target used for stage header events.
pub(super) const STAGE_TARGET: &str = "intpkg::stage";

/// Extracts the `message` field from a [`tracing::Event`], followed by any
/// structured fields as `key=value`.
#[derive(Default)]
struct MessageExtractor {
    message: String,
    fields: String,
}

impl MessageExtractor {
    fn line(&self) -> String {
        format!("{}{}", self.message, self.fields)
    }
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push_str(&format!(" {}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push_str(&format!(" {}={value}", field.name()));
        }
    }
}

/// Render one console line for an event.
fn render(level: tracing::Level, target: &str, msg: &str) -> String {
    match level {
        tracing::Level::ERROR => format!("\x1b[31mERROR\x1b[0m {msg}"),
        tracing::Level::WARN => format!("\x1b[33mWARN\x1b[0m  {msg}"),
        tracing::Level::INFO if target == STAGE_TARGET => {
            format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
        }
        tracing::Level::INFO => format!("  {msg}"),
        _ => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits intpkg-style
/// console output.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        writeln!(
            writer,
            "{}",
            render(*metadata.level(), metadata.target(), &extractor.line())
        )
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Console output follows the intpkg style: stage headers, indented
/// information, prefixed warnings and errors. `WARN` and above go to
/// stderr, everything else to stdout. `DEBUG` events are shown only when
/// `verbose` is set, unless `RUST_LOG` provides its own filter.
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .init();
}

/// A layer that records plain-text event lines, used by tests to observe
/// what the [`Logger`](super::Logger) emits.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(super) struct CaptureLayer {
    pub(super) lines: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(test)]
impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = extractor.line();
        let line = match (*metadata.level(), metadata.target()) {
            (tracing::Level::INFO, STAGE_TARGET) => format!("==> {msg}"),
            (tracing::Level::ERROR, _) => format!("[error] {msg}"),
            (tracing::Level::WARN, _) => format!("[warn] {msg}"),
            (tracing::Level::DEBUG, _) => format!("[debug] {msg}"),
            _ => msg,
        };
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}
