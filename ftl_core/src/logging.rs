//! The injectable logging seam used for the translation trace lines in the distilled spec.
//!
//! The teacher crate ships a lock-free ring-buffer logger (`Logger`/`LogSink`) built for
//! interrupt handlers that cannot block. This simulator is single-threaded (see the
//! concurrency model), so that machinery is unneeded complexity; what's kept is the seam
//! itself — a small `LogSink` trait an embedder can supply instead of (or in addition to) the
//! global `log` crate dispatch.

/// A sink that accepts a formatted trace line.
///
/// Implementations may forward to the `log` crate, a file, an in-memory buffer (as tests do),
/// or anywhere else; the FTL façade does not care.
pub trait LogSink {
    /// Accept one already-formatted line (no trailing newline).
    fn accept(&mut self, line: &str);
}

/// The default sink: every line is forwarded to the `log` crate at [`log::Level::Info`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalLogSink;

impl LogSink for GlobalLogSink {
    fn accept(&mut self, line: &str) {
        log::info!("{line}");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::LogSink;

    /// An in-memory sink that records every line, for asserting on the trace in tests.
    #[derive(Debug, Default)]
    pub struct CollectingSink {
        pub lines: Vec<String>,
    }

    impl LogSink for CollectingSink {
        fn accept(&mut self, line: &str) {
            self.lines.push(line.to_owned());
        }
    }
}
