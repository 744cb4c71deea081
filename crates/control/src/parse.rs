use tracing::debug;

use crate::error::ControlError;
use crate::header::{ControlHeader, HashLengths};

/// Splits a full zsync control file into its decoded header and the raw
/// checksum table.
///
/// Header lines are `Key: Value` pairs terminated by LF or CRLF; keys are
/// matched case-insensitively and values are trimmed. Unrecognised keys are
/// recorded on the header rather than rejected, so newer publishers stay
/// readable. The returned table slice is exactly
/// `block_count * (weak_bytes + strong_bytes)` bytes; trailing bytes beyond
/// that are ignored.
///
/// # Errors
///
/// Any structural defect in the header maps to a [`ControlError`] variant;
/// a body shorter than the header implies yields
/// [`ControlError::TableTruncated`].
pub fn parse(data: &[u8]) -> Result<(ControlHeader, &[u8]), ControlError> {
    if data.is_empty() {
        return Err(ControlError::Empty);
    }

    let mut version = None;
    let mut mtime = None;
    let mut filename = None;
    let mut block_size = None;
    let mut file_length = None;
    let mut hash_lengths = None;
    let mut url = None;
    let mut sha1 = None;
    let mut unknown = Vec::new();

    let mut rest = data;
    let mut line_no = 0usize;
    let mut body = None;

    while let Some(end) = rest.iter().position(|&b| b == b'\n') {
        let mut line = &rest[..end];
        rest = &rest[end + 1..];
        if let [head @ .., b'\r'] = line {
            line = head;
        }

        if line.is_empty() {
            body = Some(rest);
            break;
        }
        line_no += 1;

        let text = String::from_utf8_lossy(line);
        let Some((raw_key, raw_value)) = text.split_once(':') else {
            return Err(ControlError::MalformedLine { line: line_no });
        };
        let key = raw_key.trim().to_ascii_lowercase();
        let value = raw_value.trim();

        match key.as_str() {
            "zsync" => version = Some(value.to_owned()),
            "mtime" => mtime = Some(value.to_owned()),
            "filename" => filename = Some(value.to_owned()),
            "blocksize" => block_size = Some(parse_block_size(value)?),
            "length" => {
                file_length = Some(value.parse::<u64>().map_err(|_| {
                    ControlError::InvalidField {
                        field: "length",
                        value: value.to_owned(),
                    }
                })?);
            }
            "hash-lengths" => hash_lengths = Some(parse_hash_lengths(value)?),
            "url" => url = Some(value.to_owned()),
            "sha-1" => sha1 = Some(value.to_owned()),
            _ => unknown.push((key, value.to_owned())),
        }
    }

    let Some(table) = body else {
        return Err(ControlError::UnterminatedHeader);
    };

    let header = ControlHeader {
        version,
        mtime,
        filename: require(filename, "filename")?,
        block_size: require(block_size, "blocksize")?,
        file_length: require(file_length, "length")?,
        hash_lengths: require(hash_lengths, "hash-lengths")?,
        url: require(url, "url")?,
        sha1: require(sha1, "sha-1")?,
        unknown,
    };

    let want = header.table_len();
    if table.len() < want {
        return Err(ControlError::TableTruncated {
            got: table.len(),
            want,
        });
    }

    debug!(
        filename = %header.filename,
        block_size = header.block_size,
        file_length = header.file_length,
        block_count = header.block_count(),
        "parsed control header"
    );

    Ok((header, &table[..want]))
}

fn require<T>(field: Option<T>, name: &'static str) -> Result<T, ControlError> {
    field.ok_or(ControlError::MissingField { field: name })
}

fn parse_block_size(value: &str) -> Result<u32, ControlError> {
    match value.parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ControlError::InvalidField {
            field: "blocksize",
            value: value.to_owned(),
        }),
    }
}

fn parse_hash_lengths(value: &str) -> Result<HashLengths, ControlError> {
    let invalid = || ControlError::InvalidField {
        field: "hash-lengths",
        value: value.to_owned(),
    };

    let mut parts = value.split(',');
    let mut next = || -> Result<u8, ControlError> {
        parts
            .next()
            .and_then(|part| part.trim().parse::<u8>().ok())
            .ok_or_else(invalid)
    };

    let lengths = HashLengths {
        seq_matches: next()?,
        weak_bytes: next()?,
        strong_bytes: next()?,
    };
    if parts.next().is_some() {
        return Err(invalid());
    }

    let in_range = (1..=2).contains(&lengths.seq_matches)
        && (1..=4).contains(&lengths.weak_bytes)
        && (3..=16).contains(&lengths.strong_bytes);
    if !in_range {
        return Err(invalid());
    }

    Ok(lengths)
}
