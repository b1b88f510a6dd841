use crate::error::{FieldError, LineError};

pub mod space;

pub const TIMESTAMP: usize = 0;
pub const HEADER_SIZE: usize = 1;
pub const CLIENT_IP: usize = 2;
pub const RESPONSE_SIZE: usize = 4;

/// Minimum number of fields for a line to count as data.
pub const MIN_FIELDS: usize = 10;

/// One data line, split into its fields.
#[derive(Debug, PartialEq)]
pub struct LogLine<'a> {
    fields: Vec<&'a str>,
}

impl<'a> LogLine<'a> {
    /// Callers must make sure `fields` is long enough for every accessor below.
    pub(crate) fn new(fields: Vec<&'a str>) -> Self {
        debug_assert!(fields.len() > RESPONSE_SIZE);
        Self { fields }
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }

    pub fn client_ip(&self) -> &'a str {
        self.fields[CLIENT_IP]
    }

    pub fn timestamp(&self) -> Result<f64, FieldError> {
        let raw = self.fields[TIMESTAMP];
        match raw.parse::<f64>() {
            Ok(ts) if ts.is_finite() => Ok(ts),
            _ => Err(FieldError::TimestampParse(raw.to_string())),
        }
    }

    /// Header size plus response size.
    pub fn bytes_exchanged(&self) -> Result<u64, FieldError> {
        let header = self.fields[HEADER_SIZE];
        let response = self.fields[RESPONSE_SIZE];
        match (header.parse::<u64>(), response.parse::<u64>()) {
            (Ok(h), Ok(r)) => Ok(h.saturating_add(r)),
            _ => Err(FieldError::ByteParse {
                header: header.to_string(),
                response: response.to_string(),
            }),
        }
    }
}

pub trait LineParser {
    fn parse<'a>(&self, line: &'a str) -> Result<LogLine<'a>, LineError>;

    /// Decode raw bytes first, then parse.
    fn parse_bytes<'a>(&self, raw: &'a [u8]) -> Result<LogLine<'a>, LineError> {
        let line = std::str::from_utf8(raw)?;
        self.parse(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(fields: &[&'static str]) -> LogLine<'static> {
        LogLine::new(fields.to_vec())
    }

    #[test]
    fn test_bytes_exchanged() {
        let l = line(&["t", "100", "ip", "x", "50"]);
        assert_eq!(l.bytes_exchanged(), Ok(150));

        let l = line(&["t", "bad", "ip", "x", "50"]);
        assert_eq!(
            l.bytes_exchanged(),
            Err(FieldError::ByteParse {
                header: "bad".to_string(),
                response: "50".to_string()
            })
        );
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(line(&["1157689312.049", "0", "ip", "x", "0"]).timestamp(), Ok(1157689312.049));
        assert!(line(&["yesterday", "0", "ip", "x", "0"]).timestamp().is_err());
        assert!(line(&["inf", "0", "ip", "x", "0"]).timestamp().is_err());
    }
}
