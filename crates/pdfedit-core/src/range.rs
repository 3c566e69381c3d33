//! Page range resolution
//!
//! Turns expressions like `"1-3, 5, 8-"` into an ordered list of 1-indexed,
//! inclusive page spans. Unlike a page *set*, the result keeps the order the
//! caller wrote and keeps duplicates, because reorder uses both.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::error::PdfEditError;

/// Expression used when the caller supplies none: the whole document.
pub const DEFAULT_RANGE: &str = "1-";

/// 1-indexed inclusive page span, `1 <= start <= end <= total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpan {
    pub start: u32,
    pub end: u32,
}

impl PageSpan {
    /// Number of pages covered by the span.
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// 1-indexed page numbers of the span, in order.
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    /// Whether a zero-based page index falls inside the span.
    pub fn contains_index(&self, index: usize) -> bool {
        let start = self.start as usize - 1;
        let end = self.end as usize - 1;
        start <= index && index <= end
    }
}

impl fmt::Display for PageSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Ordered spans as the caller specified them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeSet {
    spans: Vec<PageSpan>,
}

impl RangeSet {
    pub fn spans(&self) -> &[PageSpan] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageSpan> {
        self.spans.iter()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Page numbers of every span, flattened in span order (repeats kept).
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.spans.iter().flat_map(|span| span.pages())
    }

    /// Page-selection predicate for a zero-based page index.
    pub fn contains_index(&self, index: usize) -> bool {
        self.spans.iter().any(|span| span.contains_index(index))
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a PageSpan;
    type IntoIter = std::slice::Iter<'a, PageSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", span)?;
        }
        Ok(())
    }
}

/// Resolve a range expression against a document of `total_pages` pages.
///
/// Tokens are comma separated, whitespace is ignored. `N` selects one page,
/// `a-b` a span; an omitted start means 1 and an omitted end means the last
/// page. A start outside the document is rejected while an end past the last
/// page is clamped down to it.
pub fn resolve(expression: &str, total_pages: u32) -> Result<RangeSet, PdfEditError> {
    if total_pages == 0 {
        return Err(PdfEditError::Range("Document has no pages".into()));
    }

    let cleaned: String = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = if cleaned.is_empty() {
        DEFAULT_RANGE.to_string()
    } else {
        cleaned
    };

    let mut spans = Vec::new();
    for token in cleaned.split(',') {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => {
                let start = if start.is_empty() {
                    1
                } else {
                    parse_page(start, token)?
                };
                let end = if end.is_empty() {
                    i64::from(total_pages)
                } else {
                    parse_page(end, token)?
                };
                (start, end)
            }
            None => {
                let page = parse_page(token, token)?;
                (page, page)
            }
        };

        if start < 1 || end < 1 || start > i64::from(total_pages) {
            return Err(PdfEditError::Range(format!(
                "Invalid start in range '{}' for total {}",
                token, total_pages
            )));
        }
        let end = end.min(i64::from(total_pages));
        if start > end {
            return Err(PdfEditError::Range(format!(
                "Start > end in range '{}'",
                token
            )));
        }

        spans.push(PageSpan {
            start: start as u32,
            end: end as u32,
        });
    }

    Ok(RangeSet { spans })
}

fn parse_page(value: &str, token: &str) -> Result<i64, PdfEditError> {
    value.parse::<i64>().map_err(|_| {
        PdfEditError::Range(format!("Invalid page number '{}' in range '{}'", value, token))
    })
}
