//! Request-scoped logging on top of `tracing`.

use std::fmt;

/// A request-scoped logger.
///
/// `CallLog` is obtained from [`CallContext::log`](crate::CallContext::log)
/// and borrows the context, so it cannot outlive the call it describes. Every
/// line carries the call's `request_id` field.
#[derive(Debug, Clone, Copy)]
pub struct CallLog<'a> {
    request_id: &'a str,
}

impl<'a> CallLog<'a> {
    pub(crate) fn new(request_id: &'a str) -> Self {
        Self { request_id }
    }

    /// Returns the request ID stamped on every line.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    ///
    /// ```no_run
    /// # use catalog_boundary::CallContext;
    /// let ctx = CallContext::new("req-1");
    /// ctx.log().info(format_args!("listing favorites, limit={}", 20));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, "{}", args);
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use crate::CallContext;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(emit: impl FnOnce()) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn logger_carries_request_id() {
        let ctx = CallContext::new("req-log-1");
        let log = ctx.log();
        assert_eq!(log.request_id(), "req-log-1");
    }

    #[test]
    fn every_level_stamps_the_request_id() {
        let ctx = CallContext::new("req-log-2");
        let out = capture(|| {
            let log = ctx.log();
            log.info(format_args!("listing favorites, limit={}", 20));
            log.warn(format_args!("deadline exceeded"));
            log.debug(format_args!("call failed"));
        });

        assert_eq!(out.lines().count(), 3);
        assert!(out.lines().all(|line| line.contains("request_id=req-log-2")));
        assert!(out.contains("listing favorites, limit=20"));
        assert!(out.contains("WARN"));
    }

    #[test]
    fn logging_without_subscriber_does_not_panic() {
        let ctx = CallContext::new("req-log-3");
        ctx.log().info(format_args!("info {}", 1));
    }
}
