use tracing_subscriber::EnvFilter;

/// Filter directives for the wrapper's own diagnostics.
pub const ENV_LOG: &str = "MOCKEXEC_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber.
///
/// stdout belongs to the real tool (cargo parses rustc's JSON diagnostics from
/// it), so everything goes to stderr, uncolored. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
