//! Tests for the error taxonomy.

use piggy_core::{Error, ErrorKind};

#[test]
fn context_keeps_kind() {
    let error = Error::new(ErrorKind::Quota, "quota exceeded").context("all models failed");
    assert_eq!(error.kind(), ErrorKind::Quota);
    assert_eq!(error.to_string(), "all models failed: quota exceeded");
}

#[test]
fn shorthands() {
    assert_eq!(Error::config("x").kind(), ErrorKind::Config);
    assert_eq!(Error::generation("x").kind(), ErrorKind::Generation);
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: Error = io.into();
    assert_eq!(error.kind(), ErrorKind::Io);
    assert_eq!(error.message(), "missing");
}
