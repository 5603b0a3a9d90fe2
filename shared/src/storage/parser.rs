//! Best-effort parser for the text log format using nom.
//!
//! Recognizes two kinds of lines:
//! - `[2024-01-01 12:00:00] Symbol: BTCUSDT`
//! - `  Exchange: binance, Funding Rate: 0.000100, Mark Price: 43000.50, Index Price: 42990.10`
//!
//! Anything else is malformed and skipped by [`decode_text_blocks`].

use chrono::{DateTime, NaiveDateTime, Utc};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, space1},
    combinator::{all_consuming, map, map_res, rest, verify},
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};
use thiserror::Error;

use crate::models::{LogBlock, RateLine};

/// Timestamp format of header lines.
pub const HEADER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single classified line of a text day-file.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LogLine {
    /// Opens a block and sets the timestamp context.
    Header {
        timestamp: DateTime<Utc>,
        instrument: String,
    },
    /// One provider's reading within the current block.
    Rate(RateLine),
}

/// A line that is neither a header nor a provider line.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Malformed log line: {0:?}")]
pub(crate) struct MalformedLogLine(pub(crate) String);

fn timestamp(input: &str) -> IResult<&str, DateTime<Utc>> {
    map_res(
        delimited(char('['), take_until("]"), char(']')),
        |raw: &str| NaiveDateTime::parse_from_str(raw, HEADER_TIME_FORMAT).map(|t| t.and_utc()),
    )
    .parse(input)
}

fn header(input: &str) -> IResult<&str, LogLine> {
    map(
        (
            timestamp,
            tag(" Symbol: "),
            verify(rest, |s: &str| !s.trim().is_empty()),
        ),
        |(timestamp, _, instrument): (DateTime<Utc>, &str, &str)| LogLine::Header {
            timestamp,
            instrument: instrument.trim().to_string(),
        },
    )
    .parse(input)
}

fn rate(input: &str) -> IResult<&str, LogLine> {
    map(
        (
            preceded(
                (space1, tag("Exchange: ")),
                verify(take_until(", Funding Rate: "), |s: &str| !s.is_empty()),
            ),
            preceded(tag(", Funding Rate: "), double),
            preceded(tag(", Mark Price: "), double),
            preceded(tag(", Index Price: "), double),
        ),
        |(exchange, funding_rate, mark_price, index_price): (&str, f64, f64, f64)| {
            LogLine::Rate(RateLine {
                exchange: exchange.to_string(),
                funding_rate,
                mark_price,
                index_price,
            })
        },
    )
    .parse(input)
}

/// Classifies one line of a text day-file.
pub(crate) fn parse_line(line: &str) -> Result<LogLine, MalformedLogLine> {
    let line = line.trim_end();
    all_consuming(alt((header, rate)))
        .parse(line)
        .map(|(_, parsed)| parsed)
        .map_err(|_| MalformedLogLine(line.to_string()))
}

/// Decodes a text day-file into blocks.
///
/// A header opens a new block; provider lines attach to the most recent
/// block in the same file. Provider lines before the first header, blank
/// lines and malformed lines are skipped.
#[must_use]
pub fn decode_text_blocks(content: &str) -> Vec<LogBlock> {
    let mut blocks: Vec<LogBlock> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(LogLine::Header {
                timestamp,
                instrument,
            }) => blocks.push(LogBlock {
                timestamp,
                instrument,
                rates: Vec::new(),
            }),
            Ok(LogLine::Rate(rate)) => {
                if let Some(block) = blocks.last_mut() {
                    block.rates.push(rate);
                }
            }
            Err(e) => tracing::trace!(error = %e, "Skipping line"),
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_header() {
        let line = parse_line("[2024-01-15 08:30:05] Symbol: BTCUSDT").unwrap();
        assert_eq!(
            line,
            LogLine::Header {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 5).unwrap(),
                instrument: "BTCUSDT".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rate_line() {
        let line = parse_line(
            "  Exchange: binance, Funding Rate: -0.000125, Mark Price: 43000.50, Index Price: 42990.10",
        )
        .unwrap();
        match line {
            LogLine::Rate(rate) => {
                assert_eq!(rate.exchange, "binance");
                assert_eq!(rate.funding_rate, -0.000_125);
                assert_eq!(rate.mark_price, 43000.5);
                assert_eq!(rate.index_price, 42990.1);
            }
            other => panic!("Expected rate line, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tolerates_carriage_return() {
        assert!(parse_line("[2024-01-15 08:30:05] Symbol: BTCUSDT\r").is_ok());
    }

    #[test]
    fn test_malformed_lines() {
        for line in [
            "garbage",
            "[2024-01-15] Symbol: BTCUSDT",
            "[2024-01-15 08:30:05] Symbol: ",
            "  Exchange: binance, Funding Rate: abc, Mark Price: 1.00, Index Price: 1.00",
            "  Exchange: binance, Funding Rate: 0.000100, Mark Price: 1.00",
            "  Exchange: , Funding Rate: 0.000100, Mark Price: 1.00, Index Price: 1.00",
            "Exchange: binance, Funding Rate: 0.000100, Mark Price: 1.00, Index Price: 1.00",
        ] {
            assert!(parse_line(line).is_err(), "expected {line:?} to be malformed");
        }
    }

    #[test]
    fn test_decode_blocks_skips_noise() {
        let content = "\
  Exchange: orphan, Funding Rate: 0.100000, Mark Price: 1.00, Index Price: 1.00
[2024-01-01 00:00:00] Symbol: BTCUSDT
  Exchange: alpha, Funding Rate: 0.000100, Mark Price: 10.00, Index Price: 9.00
this line is noise
  Exchange: beta, Funding Rate: 0.000200, Mark Price: 10.00, Index Price: 9.00

[2024-01-01 00:01:00] Symbol: BTCUSDT
  Exchange: alpha, Funding Rate: 0.000300, Mark Price: 11.00, Index Price: 10.00
  Exchange: alpha, Funding Rate: trunc";

        let blocks = decode_text_blocks(content);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rates.len(), 2);
        assert_eq!(blocks[0].rates[1].exchange, "beta");
        assert_eq!(blocks[1].rates.len(), 1);
        assert_eq!(blocks[1].rates[0].funding_rate, 0.0003);
    }

    #[test]
    fn test_rate_after_malformed_header_joins_previous_block() {
        let content = "\
[2024-01-01 00:00:00] Symbol: BTCUSDT
  Exchange: alpha, Funding Rate: 0.000100, Mark Price: 10.00, Index Price: 9.00
[not a time] Symbol: BTCUSDT
  Exchange: alpha, Funding Rate: 0.000200, Mark Price: 10.00, Index Price: 9.00
";

        let blocks = decode_text_blocks(content);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].rates.len(), 2);
    }
}
