/// Emits the warning the trace-context package logs through the `log` crate
pub fn warn_missing_header() {
    log::warn!(target: "app::ctxtrace", "b3 injection failed: missing header");
}
