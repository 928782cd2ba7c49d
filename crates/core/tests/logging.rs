// Scalar dispatch is visible in trace output
use std::io;
use std::sync::{Arc, Mutex};

use hamly_core::{Value, escape};
use tracing::Level;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, captured.text())
}

#[test]
fn test_scalars_skip_the_scan() {
    for (value, kind) in [
        (Value::from(42), "int"),
        (Value::from(2.5), "float"),
        (Value::from(false), "bool"),
        (Value::Absent, "absent"),
    ] {
        let (escaped, logs) = capture(|| escape(value).map(|text| text.into_owned()));
        assert!(escaped.is_ok());
        assert!(logs.contains("Scalar value, skipping scan"), "{logs}");
        assert!(logs.contains(&format!("kind=\"{kind}\"")), "{logs}");
    }
}

#[test]
fn test_text_is_scanned() {
    let (escaped, logs) = capture(|| escape("a<b").map(|text| text.into_owned()));
    assert_eq!(escaped.unwrap(), "a&lt;b");
    assert!(!logs.contains("Scalar value"), "{logs}");
}
