// parse space-delimited access logs, e.g. squid native format:
// time elapsed remotehost code/status bytes method URL rfc931 peerstatus/peerhost type

use super::{LineParser, LogLine, MIN_FIELDS};
use crate::error::LineError;

pub struct SpaceDelimitedParser {
    min_fields: usize,
}

impl Default for SpaceDelimitedParser {
    fn default() -> Self {
        Self {
            min_fields: MIN_FIELDS,
        }
    }
}

impl SpaceDelimitedParser {
    /// `min_fields` is raised to 5 if lower, so that every field accessor stays in bounds.
    pub fn with_min_fields(min_fields: usize) -> Self {
        Self {
            min_fields: min_fields.max(super::RESPONSE_SIZE + 1),
        }
    }
}

impl LineParser for SpaceDelimitedParser {
    fn parse<'a>(&self, line: &'a str) -> Result<LogLine<'a>, LineError> {
        // Runs of whitespace (tabs, doubled spaces, the trailing newline) collapse into one separator
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < self.min_fields {
            return Err(LineError::MalformedLine {
                expected: self.min_fields,
                found: fields.len(),
            });
        }
        Ok(LogLine::new(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_space_parse() {
        let parser = SpaceDelimitedParser::default();
        let log = "1157689324.156   1372 10.105.21.199 TCP_MISS/200 399 GET http://www.google-analytics.com/__utm.gif? badeyek DIRECT/66.102.9.147 image/gif\n";
        let item = parser.parse(log).unwrap();
        assert_eq!(item.fields().len(), 10);
        assert_eq!(item.client_ip(), "10.105.21.199");
        assert_eq!(item.timestamp().unwrap(), 1157689324.156);
        assert_eq!(item.bytes_exchanged().unwrap(), 1771);
        assert_eq!(item.fields()[3], "TCP_MISS/200");
    }

    #[test]
    fn test_irregular_whitespace() {
        let parser = SpaceDelimitedParser::default();
        let item = parser.parse("  1\t2  3 4 5 6\t\t7 8 9 10  \r\n").unwrap();
        assert_eq!(
            item.fields(),
            &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]
        );
    }

    #[test]
    fn test_too_few_fields() {
        let parser = SpaceDelimitedParser::default();
        let err = parser.parse("1 2 3 4 5 6 7 8 9").unwrap_err();
        assert!(matches!(
            err,
            LineError::MalformedLine {
                expected: 10,
                found: 9
            }
        ));
        assert!(matches!(
            parser.parse("   \n").unwrap_err(),
            LineError::MalformedLine { found: 0, .. }
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let parser = SpaceDelimitedParser::default();
        let raw = b"1 2 3 4 5 6 7 8 9 \xff\xfe";
        assert!(matches!(
            parser.parse_bytes(raw).unwrap_err(),
            LineError::Encoding(_)
        ));
    }

    #[test]
    fn test_custom_min_fields() {
        let parser = SpaceDelimitedParser::with_min_fields(5);
        let item = parser.parse("0 100 1.2.3.4 x 50").unwrap();
        assert_eq!(item.bytes_exchanged().unwrap(), 150);
        // never below the highest field index we read
        let parser = SpaceDelimitedParser::with_min_fields(1);
        assert!(parser.parse("0 100 1.2.3.4").is_err());
    }
}
