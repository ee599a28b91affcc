//! Report document model: styled blocks in outcome order

use chrono::{DateTime, Local};

use crate::outcome::{Outcome, Status};

/// Space after the title/date header, in points.
pub const HEADER_SPACING: i64 = 12;

/// Space after every outcome block, in points.
pub const BLOCK_SPACING: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Title,
    Normal,
    Success,
    Failure,
}

impl From<Status> for BlockStyle {
    fn from(status: Status) -> Self {
        match status {
            Status::Passed => BlockStyle::Success,
            Status::Failed => BlockStyle::Failure,
            Status::Info => BlockStyle::Normal,
        }
    }
}

/// One paragraph of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub style: BlockStyle,
    pub text: String,
    pub space_after: i64,
}

/// Everything that goes into a report, before it is laid out on pages.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    blocks: Vec<Block>,
}

impl ReportDocument {
    /// Title, generation date, then one block per outcome in log order.
    pub fn build(title: &str, generated_at: DateTime<Local>, outcomes: &[Outcome]) -> Self {
        let mut blocks = Vec::with_capacity(outcomes.len() + 2);
        blocks.push(Block {
            style: BlockStyle::Title,
            text: title.to_string(),
            space_after: 0,
        });
        blocks.push(Block {
            style: BlockStyle::Normal,
            text: format!("Date: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
            space_after: HEADER_SPACING,
        });

        for outcome in outcomes {
            blocks.push(Block {
                style: outcome.status.into(),
                text: outcome.message.clone(),
                space_after: BLOCK_SPACING,
            });
        }

        Self {
            title: title.to_string(),
            blocks,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks that came from outcomes, i.e. everything after the header.
    pub fn outcome_blocks(&self) -> &[Block] {
        &self.blocks[2..]
    }
}

/// Replace characters the standard PDF fonts cannot draw.
///
/// Latin-1 passes through unchanged so accented text survives. The common
/// status emoji become short bracketed tags.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '✅' | '✔' | '✓' => out.push_str("[OK]"),
            '❌' | '✖' | '✗' => out.push_str("[FAIL]"),
            '⚠' => out.push_str("[WARN]"),
            '🗑' => out.push_str("[DEL]"),
            '📊' => out.push_str("[REPORT]"),
            // variation selectors and joiners trail the emoji above
            '\u{FE0E}' | '\u{FE0F}' | '\u{200D}' => {}
            '\t' => out.push_str("    "),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            c if c.is_control() => {}
            c if (c as u32) <= 0x7E || (0xA0..=0xFF).contains(&(c as u32)) => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap to at most `max_chars` characters per line.
///
/// Embedded newlines are kept as hard breaks, so a leading `\n` yields an
/// empty first line. Words longer than a line are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in raw_line.split(' ') {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Outcome> {
        vec![
            Outcome::classified("✅ step A: PASSED"),
            Outcome::classified("❌ step B: FAILED - timeout"),
            Outcome::classified("step C info"),
        ]
    }

    #[test]
    fn test_blocks_follow_outcome_order_and_status() {
        let doc = ReportDocument::build("Report", Local::now(), &sample());
        let blocks = doc.outcome_blocks();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].style, BlockStyle::Success);
        assert_eq!(blocks[1].style, BlockStyle::Failure);
        assert_eq!(blocks[2].style, BlockStyle::Normal);
        assert_eq!(blocks[1].text, "❌ step B: FAILED - timeout");
        assert!(blocks.iter().all(|b| b.space_after == BLOCK_SPACING));
    }

    #[test]
    fn test_header_has_title_and_date() {
        let doc = ReportDocument::build("Backend Report", Local::now(), &[]);
        let header = doc.blocks();

        assert_eq!(header.len(), 2);
        assert_eq!(header[0].style, BlockStyle::Title);
        assert_eq!(header[0].text, "Backend Report");
        assert!(header[1].text.starts_with("Date: "));
        assert_eq!(header[1].space_after, HEADER_SPACING);
        assert!(doc.outcome_blocks().is_empty());
    }

    #[test]
    fn test_pdf_safe_transliterates_emoji() {
        assert_eq!(pdf_safe("✅ ok"), "[OK] ok");
        assert_eq!(pdf_safe("⚠️ warn"), "[WARN] warn");
        assert_eq!(pdf_safe("🗑️ gone"), "[DEL] gone");
        assert_eq!(pdf_safe("Catálogo año"), "Catálogo año");
        assert_eq!(pdf_safe("日本"), "??");
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert_eq!(lines, ["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_wrap_keeps_hard_breaks() {
        let lines = wrap("\n--- Login ---", 40);
        assert_eq!(lines, ["", "--- Login ---"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghij xy", 4);
        assert_eq!(lines, ["abcd", "efgh", "ij", "xy"]);
    }
}
