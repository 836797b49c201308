//! Parse HTTP response header lines into a ResponseHead.

use super::ResponseHead;

/// Parse the header lines of the final response (status line first).
///
/// Missing or unparsable values are left as `None`; a missing status line
/// yields status 0 and the caller falls back to the transport's own code.
pub fn parse_head(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head.status = line
                .split_whitespace()
                .nth(1)
                .and_then(|c| c.parse().ok())
                .unwrap_or(0);
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                head.content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("content-range") {
                let (span, total) = value.rsplit_once('/').unwrap_or((value, ""));
                head.range_total = total.trim().parse::<u64>().ok();
                head.range_start = span
                    .trim()
                    .strip_prefix("bytes")
                    .and_then(|s| s.trim().split_once('-'))
                    .and_then(|(start, _)| start.trim().parse::<u64>().ok());
            }
            if name.eq_ignore_ascii_case("content-type") {
                head.content_type = Some(value.to_string());
            }
        }
    }

    head
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_status_and_length() {
        let h = parse_head(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Content-Type: video/mp4",
        ]));
        assert_eq!(h.status, 200);
        assert_eq!(h.content_length, Some(12345));
        assert_eq!(h.content_type.as_deref(), Some("video/mp4"));
        assert!(h.range_total.is_none());
    }

    #[test]
    fn parse_partial_content_range() {
        let h = parse_head(&lines(&[
            "HTTP/2 206",
            "content-range: bytes 100-999/1000",
            "content-length: 900",
        ]));
        assert_eq!(h.status, 206);
        assert_eq!(h.content_length, Some(900));
        assert_eq!(h.range_start, Some(100));
        assert_eq!(h.range_total, Some(1000));
    }

    #[test]
    fn unknown_total_in_content_range() {
        let h = parse_head(&lines(&["HTTP/1.1 206 Partial Content", "Content-Range: bytes 0-9/*"]));
        assert_eq!(h.range_start, Some(0));
        assert!(h.range_total.is_none());
    }

    #[test]
    fn unsatisfied_range_has_no_start() {
        let h = parse_head(&lines(&["HTTP/1.1 416", "Content-Range: bytes */5000"]));
        assert!(h.range_start.is_none());
        assert_eq!(h.range_total, Some(5000));
    }

    #[test]
    fn missing_status_line() {
        let h = parse_head(&lines(&["Content-Length: 3"]));
        assert_eq!(h.status, 0);
        assert_eq!(h.content_length, Some(3));
    }
}
