//! HTTP Range request parsing module
//!
//! Single byte-range support (RFC 7233). Multi-range requests are answered
//! with the full representation.

/// Inclusive byte range resolved against a known file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` header
    pub fn content_range(&self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Outcome of inspecting a `Range` header
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Serve this slice with 206
    Partial(ByteRange),
    /// Syntactically valid but outside the file - 416
    NotSatisfiable,
    /// No header, other unit, multi-range or garbage - serve everything
    Full,
}

/// Parse HTTP Range header
///
/// Supported forms: `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
///
/// ```
/// use spa_serve::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// assert_eq!(
///     parse_range_header(Some("bytes=0-99"), 1000),
///     RangeParseResult::Partial(ByteRange { start: 0, end: 99 })
/// );
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::Full);
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(ranges) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::Full;
    };

    if ranges.contains(',') {
        return RangeParseResult::Full;
    }

    let Some((first, last)) = ranges.split_once('-') else {
        return RangeParseResult::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        suffix_range(last, file_size)
    } else {
        bounded_range(first, last, file_size)
    }
}

/// `bytes=-N`: the final N bytes
fn suffix_range(suffix: &str, file_size: usize) -> RangeParseResult {
    let Ok(suffix) = suffix.parse::<usize>() else {
        return RangeParseResult::Full;
    };

    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Partial(ByteRange {
        start: file_size.saturating_sub(suffix),
        end: file_size - 1,
    })
}

/// `bytes=A-` or `bytes=A-B`
fn bounded_range(first: &str, last: &str, file_size: usize) -> RangeParseResult {
    let Ok(start) = first.parse::<usize>() else {
        return RangeParseResult::Full;
    };

    let end = if last.is_empty() {
        None
    } else {
        match last.parse::<usize>() {
            Ok(end) if end < start => return RangeParseResult::Full,
            Ok(end) => Some(end),
            Err(_) => return RangeParseResult::Full,
        }
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let last_byte = file_size - 1;
    RangeParseResult::Partial(ByteRange {
        start,
        end: end.map_or(last_byte, |e| e.min(last_byte)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(start: usize, end: usize) -> RangeParseResult {
        RangeParseResult::Partial(ByteRange { start, end })
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeParseResult::Full);
        assert_eq!(parse_range_header(Some("items=0-9"), 100), RangeParseResult::Full);
    }

    #[test]
    fn test_bounded() {
        assert_eq!(parse_range_header(Some("bytes=0-9"), 100), partial(0, 9));
        assert_eq!(parse_range_header(Some("bytes=90-500"), 100), partial(90, 99));
        assert_eq!(parse_range_header(Some("bytes=50-"), 100), partial(50, 99));
    }

    #[test]
    fn test_suffix() {
        assert_eq!(parse_range_header(Some("bytes=-20"), 100), partial(80, 99));
        assert_eq!(parse_range_header(Some("bytes=-500"), 100), partial(0, 99));
        assert_eq!(
            parse_range_header(Some("bytes=-0"), 100),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=0-"), 0),
            RangeParseResult::NotSatisfiable
        );
        assert_eq!(
            parse_range_header(Some("bytes=-10"), 0),
            RangeParseResult::NotSatisfiable
        );
    }

    #[test]
    fn test_malformed_falls_back_to_full() {
        for header in ["bytes=a-b", "bytes=0-9,20-29", "bytes=9-0", "bytes=", "bytes=5"] {
            assert_eq!(
                parse_range_header(Some(header), 100),
                RangeParseResult::Full,
                "header {header}"
            );
        }
    }

    #[test]
    fn test_byte_range_helpers() {
        let range = ByteRange { start: 10, end: 19 };
        assert_eq!(range.len(), 10);
        assert_eq!(range.content_range(100), "bytes 10-19/100");
    }
}
