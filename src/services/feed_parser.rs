use crate::domain::feed::{FeedRow, ParseStats};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::io::{BufRead, BufReader, Read};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to decode feed: {0}")]
    Read(#[from] csv::Error),
    #[error("failed to read feed: {0}")]
    Io(#[from] std::io::Error),
}

/// Pull-based reader that turns delimited text into [`FeedRow`]s.
///
/// The first physical line is skipped, whatever it holds, and the remaining fields are assigned
/// positionally (`recipient`, `body`). Rows where either trimmed field is empty are dropped silently.
/// Blank lines are not records and are not counted. The iterator ends for good after the first read
/// error.
pub struct FeedParser<R: Read> {
    records: StringRecordsIntoIter<BufReader<R>>,
    stats: ParseStats,
    header_skipped: bool,
    failed: bool,
}

impl<R: Read> FeedParser<R> {
    pub fn new(source: R) -> Self {
        let reader = ReaderBuilder::new().has_headers(false).flexible(true).from_reader(BufReader::new(source));
        Self { records: reader.into_records(), stats: ParseStats::default(), header_skipped: false, failed: false }
    }

    /// Consumes the header line straight from the source. The csv reader has not buffered anything
    /// yet at this point, so no bytes are lost.
    fn skip_header(&mut self) -> std::io::Result<()> {
        self.header_skipped = true;
        let mut header = Vec::new();
        self.records.reader_mut().get_mut().read_until(b'\n', &mut header)?;
        Ok(())
    }

    #[must_use]
    pub const fn stats(&self) -> ParseStats {
        self.stats
    }
}

impl<R: Read> std::fmt::Debug for FeedParser<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedParser").field("stats", &self.stats).field("failed", &self.failed).finish()
    }
}

impl<R: Read> Iterator for FeedParser<R> {
    type Item = Result<FeedRow, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if !self.header_skipped {
            if let Err(e) = self.skip_header() {
                self.failed = true;
                return Some(Err(e.into()));
            }
        }

        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            };
            self.stats.rows_read += 1;

            let recipient = record.get(0).unwrap_or_default();
            let body = record.get(1).unwrap_or_default();
            if recipient.trim().is_empty() || body.trim().is_empty() {
                self.stats.rows_dropped += 1;
                tracing::trace!(line = self.stats.rows_read, "Dropping incomplete feed row");
                continue;
            }

            return Some(Ok(FeedRow { recipient: recipient.to_string(), body: body.to_string() }));
        }
    }
}

/// A fully consumed feed.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub rows: Vec<FeedRow>,
    pub stats: ParseStats,
}

/// Drains `source` to completion.
///
/// # Errors
/// Returns `FeedError::Io` if the header line cannot be read and `FeedError::Read` on the first later
/// decode or I/O failure; rows read before it are discarded.
pub fn parse_feed<R: Read>(source: R) -> Result<ParsedFeed, FeedError> {
    let mut parser = FeedParser::new(source);
    let rows = parser.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok(ParsedFeed { rows, stats: parser.stats() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn row(recipient: &str, body: &str) -> FeedRow {
        FeedRow { recipient: recipient.to_string(), body: body.to_string() }
    }

    #[test]
    fn test_skips_header_and_assigns_fields_positionally() {
        let csv = "Telefone,Mensagem\n11 99999-0000,Olá\n21 98888-1111,Tudo bem?\n";
        let parsed = parse_feed(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows, vec![row("11 99999-0000", "Olá"), row("21 98888-1111", "Tudo bem?")]);
        assert_eq!(parsed.stats, ParseStats { rows_read: 2, rows_dropped: 0 });
    }

    #[test]
    fn test_drops_rows_with_blank_fields() {
        let csv = "number,message\n5511,hi\n   ,orphan body\n5522,   \n5533\n5544,bye\n";
        let parsed = parse_feed(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows, vec![row("5511", "hi"), row("5544", "bye")]);
        assert_eq!(parsed.stats.rows_dropped, 3);
        assert_eq!(parsed.stats.rows_accepted() + parsed.stats.rows_dropped, parsed.stats.rows_read);
        assert_eq!(parsed.stats.rows_read, 5);
    }

    #[test]
    fn test_quoted_fields_and_extra_columns() {
        let csv = "a,b,c\n\"5511\",\"line one, still one\nline two\",ignored\n";
        let parsed = parse_feed(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows, vec![row("5511", "line one, still one\nline two")]);
    }

    #[test]
    fn test_body_is_kept_verbatim() {
        let csv = "n,m\n5511,  padded  \n";
        let parsed = parse_feed(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows[0].body, "  padded  ");
    }

    #[test]
    fn test_leading_blank_line_is_the_skipped_header() {
        let parsed = parse_feed("\n5511,a\n5522,b\n".as_bytes()).unwrap();
        assert_eq!(parsed.rows, vec![row("5511", "a"), row("5522", "b")]);
        assert_eq!(parsed.stats, ParseStats { rows_read: 2, rows_dropped: 0 });
    }

    #[test]
    fn test_blank_lines_mid_feed_are_not_records() {
        let parsed = parse_feed("n,m\n5511,a\n\n\r\n5522,b\n".as_bytes()).unwrap();
        assert_eq!(parsed.rows, vec![row("5511", "a"), row("5522", "b")]);
        assert_eq!(parsed.stats, ParseStats { rows_read: 2, rows_dropped: 0 });
        assert_eq!(parsed.stats.rows_accepted() + parsed.stats.rows_dropped, parsed.stats.rows_read);
    }

    #[test]
    fn test_crlf_header_is_skipped() {
        let parsed = parse_feed("number,message\r\n5511,hi\r\n".as_bytes()).unwrap();
        assert_eq!(parsed.rows, vec![row("5511", "hi")]);
    }

    #[test]
    fn test_empty_source() {
        let parsed = parse_feed("".as_bytes()).unwrap();
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.stats, ParseStats::default());
    }

    #[test]
    fn test_header_only_feed_is_empty() {
        let parsed = parse_feed("number,message\n".as_bytes()).unwrap();
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.stats.rows_read, 0);
    }

    #[test]
    fn test_invalid_utf8_is_a_read_error() {
        let bytes: &[u8] = b"n,m\n5511,ok\n5522,\xff\xfe\n";
        assert!(matches!(parse_feed(bytes), Err(FeedError::Read(_))));
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
            }
            self.served = true;
            let chunk = b"n,m\n5511,first\n5522,sec";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_stream_error_terminates_iteration() {
        let mut parser = FeedParser::new(FailingReader { served: false });
        assert_eq!(parser.next().unwrap().unwrap(), row("5511", "first"));
        assert!(matches!(parser.next(), Some(Err(FeedError::Read(_)))));
        assert!(parser.next().is_none());
    }

    struct DeadReader;

    impl Read for DeadReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
        }
    }

    #[test]
    fn test_error_while_skipping_header() {
        let mut parser = FeedParser::new(DeadReader);
        assert!(matches!(parser.next(), Some(Err(FeedError::Io(_)))));
        assert!(parser.next().is_none());
        assert_eq!(parser.stats(), ParseStats::default());
    }
}
