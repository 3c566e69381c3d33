//! Locating the run that carries a piece of text.

use crate::layout::{StructuredText, TextRun};

/// First run, in reading order, whose text contains `target`.
///
/// Case-sensitive substring match on single runs; text split across runs is
/// not found. An empty target matches the first run.
pub fn find_span<'a>(layout: &'a StructuredText, target: &str) -> Option<&'a TextRun> {
    layout.runs().find(|run| run.text.contains(target))
}
