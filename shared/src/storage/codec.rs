//! Encodings of log blocks into day-file content and back.

use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::LogBlock;

use super::parser::{decode_text_blocks, HEADER_TIME_FORMAT};

/// Encodes blocks for appending and decodes day-file content.
///
/// Decoding is best-effort: content that cannot be understood is skipped,
/// never reported.
pub trait LogCodec: Send + Sync {
    /// Short name of the encoding.
    fn name(&self) -> &'static str;

    /// Encodes one block, including its terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be serialized.
    fn encode_block(&self, block: &LogBlock) -> io::Result<String>;

    /// Decodes every recognizable block in `content`, in file order.
    fn decode_blocks(&self, content: &str) -> Vec<LogBlock>;
}

/// The human-readable line format.
///
/// ```text
/// [2024-01-01 12:00:00] Symbol: BTCUSDT
///   Exchange: binance, Funding Rate: 0.000100, Mark Price: 43000.50, Index Price: 42990.10
///
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl LogCodec for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn encode_block(&self, block: &LogBlock) -> io::Result<String> {
        let mut out = format!(
            "[{}] Symbol: {}\n",
            block.timestamp.format(HEADER_TIME_FORMAT),
            block.instrument
        );
        for rate in &block.rates {
            out.push_str(&format!(
                "  Exchange: {}, Funding Rate: {:.6}, Mark Price: {:.2}, Index Price: {:.2}\n",
                rate.exchange, rate.funding_rate, rate.mark_price, rate.index_price
            ));
        }
        out.push('\n');
        Ok(out)
    }

    fn decode_blocks(&self, content: &str) -> Vec<LogBlock> {
        decode_text_blocks(content)
    }
}

/// One JSON object per block, one block per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesCodec;

impl LogCodec for JsonLinesCodec {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn encode_block(&self, block: &LogBlock) -> io::Result<String> {
        let mut line = serde_json::to_string(block)?;
        line.push('\n');
        Ok(line)
    }

    fn decode_blocks(&self, content: &str) -> Vec<LogBlock> {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(block) => Some(block),
                Err(e) => {
                    tracing::trace!(error = %e, "Skipping undecodable line");
                    None
                }
            })
            .collect()
    }
}

/// Selectable day-file encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// [`TextCodec`].
    #[default]
    Text,
    /// [`JsonLinesCodec`].
    JsonLines,
}

impl LogFormat {
    /// Returns the codec for this format.
    #[must_use]
    pub fn codec(self) -> Arc<dyn LogCodec> {
        match self {
            Self::Text => Arc::new(TextCodec),
            Self::JsonLines => Arc::new(JsonLinesCodec),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "jsonl" | "json" | "jsonlines" => Ok(Self::JsonLines),
            other => Err(format!(
                "Unknown log format '{other}', expected 'text' or 'jsonl'"
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::JsonLines => write!(f, "jsonl"),
        }
    }
}
