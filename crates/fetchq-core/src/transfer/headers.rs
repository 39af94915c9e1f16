//! Incremental parsing of response header blocks as libcurl delivers them.
//!
//! With redirects followed, libcurl reports one header block per response
//! (e.g. `301` then `200`). Each block starts with a status line and ends
//! with an empty line.

/// Accumulates the header block currently being received.
#[derive(Debug, Default)]
pub(crate) struct ResponseHead {
    status: Option<u32>,
    content_length: Option<u64>,
}

/// A fully received header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeadBlock {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
}

impl HeadBlock {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

impl ResponseHead {
    /// Feed one raw header line. Returns the finished block when `line`
    /// terminates it.
    pub fn push_line(&mut self, raw: &[u8]) -> Option<HeadBlock> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            let block = HeadBlock {
                status: self.status,
                content_length: self.content_length,
            };
            *self = ResponseHead::default();
            return Some(block);
        }
        if line.len() >= 5 && line[..5].eq_ignore_ascii_case("HTTP/") {
            self.status = parse_status_line(line);
            self.content_length = None;
            return None;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                self.content_length = value.trim().parse::<u64>().ok();
            }
        }
        None
    }
}

/// `HTTP/1.1 404 Not Found` -> 404.
fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(head: &mut ResponseHead, lines: &[&str]) -> Vec<HeadBlock> {
        lines
            .iter()
            .filter_map(|l| head.push_line(format!("{l}\r\n").as_bytes()))
            .collect()
    }

    #[test]
    fn single_block_with_length() {
        let mut head = ResponseHead::default();
        let blocks = feed(
            &mut head,
            &["HTTP/1.1 200 OK", "Content-Length: 12345", "Accept-Ranges: bytes", ""],
        );
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].status, Some(200));
        assert_eq!(blocks[0].content_length, Some(12345));
        assert!(blocks[0].is_success());
    }

    #[test]
    fn redirect_then_final_response() {
        let mut head = ResponseHead::default();
        let blocks = feed(
            &mut head,
            &[
                "HTTP/1.1 302 Found",
                "Location: /real",
                "Content-Length: 0",
                "",
                "HTTP/2 200",
                "content-length: 99",
                "",
            ],
        );
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].is_success());
        assert!(blocks[1].is_success());
        assert_eq!(blocks[1].content_length, Some(99));
    }

    #[test]
    fn missing_or_bad_length_is_unknown() {
        let mut head = ResponseHead::default();
        let blocks = feed(
            &mut head,
            &["HTTP/1.1 200 OK", "Transfer-Encoding: chunked", ""],
        );
        assert_eq!(blocks[0].content_length, None);

        let blocks = feed(&mut head, &["HTTP/1.1 200 OK", "Content-Length: lots", ""]);
        assert_eq!(blocks[0].content_length, None);
    }

    #[test]
    fn error_status_is_not_success() {
        let mut head = ResponseHead::default();
        let blocks = feed(&mut head, &["HTTP/1.1 404 Not Found", "Content-Length: 9", ""]);
        assert_eq!(blocks[0].status, Some(404));
        assert!(!blocks[0].is_success());
    }
}
