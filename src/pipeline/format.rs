//! Output formatting collaborator

use anyhow::Result;
use async_trait::async_trait;

/// Formats the concatenated plugin output once per target
///
/// A best-effort contract: implementations should fall back to returning the
/// input unchanged rather than failing the run over cosmetics.
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn prettify(&self, filename: &str, text: &str) -> Result<String>;
}

/// Whitespace-normalizing formatter used when no other is configured
///
/// Strips trailing whitespace per line, collapses runs of blank lines, and
/// guarantees a single trailing newline.
pub struct DefaultFormatter;

#[async_trait]
impl Formatter for DefaultFormatter {
    async fn prettify(&self, _filename: &str, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut blank_run = 0usize;
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            out.push_str(line);
            out.push('\n');
        }
        while out.ends_with("\n\n") {
            out.pop();
        }
        if out.is_empty() {
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn normalizes_whitespace_and_trailing_newline() {
        let formatted = DefaultFormatter
            .prettify("out.ts", "line one  \n\n\n\nline two")
            .await
            .unwrap();
        assert_eq!(formatted, "line one\n\nline two\n");
    }

    #[tokio::test]
    async fn empty_input_becomes_a_single_newline() {
        let formatted = DefaultFormatter.prettify("out.ts", "").await.unwrap();
        assert_eq!(formatted, "\n");
    }
}
