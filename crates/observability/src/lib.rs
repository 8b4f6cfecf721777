//! Process-wide logging setup shared by the binaries.

/// Tracing subscriber configuration (filters, formatting).
pub mod tracing;

/// Initialize structured JSON logging, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with_default("info");
}
