use thiserror::Error;

/// Errors raised while decoding a zsync control file.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ControlError {
    /// The control file contained no data at all.
    #[error("control file is empty")]
    Empty,

    /// The header never reached the blank line separating it from the
    /// checksum table.
    #[error("control header has no terminating blank line")]
    UnterminatedHeader,

    /// A header line did not follow the `Key: Value` form.
    #[error("control header line {line} is not a `Key: Value` pair")]
    MalformedLine {
        /// 1-based line number inside the header.
        line: usize,
    },

    /// A required header field was absent.
    #[error("control header is missing required field `{field}`")]
    MissingField {
        /// Lowercase field name as it appears in the file.
        field: &'static str,
    },

    /// A header field was present but failed validation.
    #[error("control header field `{field}` has invalid value `{value}`")]
    InvalidField {
        /// Lowercase field name as it appears in the file.
        field: &'static str,
        /// The offending value, trimmed.
        value: String,
    },

    /// The body was shorter than `block_count * (weak_bytes + strong_bytes)`.
    #[error("checksum table truncated: {got} bytes present, {want} required")]
    TableTruncated {
        /// Bytes actually present after the header.
        got: usize,
        /// Bytes the header implies the table must hold.
        want: usize,
    },
}
