//! Transport capability consumed by the monitor.

/// The transport the monitor watches over.
///
/// The monitor never awaits or verifies the outcome of [`reopen`]; a
/// transport that fails to reconnect simply stays stale and gets asked again
/// on a later poll.
///
/// [`reopen`]: Connection::reopen
pub trait Connection: Send + Sync {
    /// Ask the transport to tear down and re-establish itself.
    ///
    /// Called without any monitor lock held, so implementations may call
    /// back into the monitor (e.g. `record_disconnect`).
    fn reopen(&self);

    /// Whether the transport currently considers itself open.
    fn is_open(&self) -> bool;
}
