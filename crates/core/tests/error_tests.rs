// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use generation_tracker_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn invalid_format() {
        let err = CoreError::InvalidFormat("31-02-2024".into());
        assert_eq!(err.to_string(), "Invalid date format: '31-02-2024'");
    }

    #[test]
    fn invalid_value() {
        let err = CoreError::InvalidValue(-5.0);
        assert_eq!(
            err.to_string(),
            "Invalid value: -5 (expected a finite, non-negative number)"
        );
    }

    #[test]
    fn invalid_value_nan() {
        let err = CoreError::InvalidValue(f64::NAN);
        assert!(err.to_string().starts_with("Invalid value: NaN"));
    }

    #[test]
    fn no_data() {
        let err = CoreError::NoData("the store has no observations".into());
        assert_eq!(
            err.to_string(),
            "No data to aggregate: the store has no observations"
        );
    }

    #[test]
    fn storage() {
        let err = CoreError::Storage("quota exceeded".into());
        assert_eq!(err.to_string(), "Storage error: quota exceeded");
    }

    #[test]
    fn serialization() {
        let err = CoreError::Serialization("bad".into());
        assert_eq!(err.to_string(), "Serialization error: bad");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("bad".into());
        assert_eq!(err.to_string(), "Deserialization error: bad");
    }

    #[test]
    fn file_io() {
        let err = CoreError::FileIO("permission denied".into());
        assert_eq!(err.to_string(), "File I/O error: permission denied");
    }
}

// ── From conversions ────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::FileIO(ref m) if m.contains("no such file")));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn from_csv_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: CoreError = csv::Error::from(io).into();
        assert!(matches!(err, CoreError::Serialization(ref m) if m.contains("pipe closed")));
    }

    #[test]
    fn errors_are_std_errors() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CoreError>();
    }
}
