//! Chapter-range and batch expression resolution.
//!
//! A range expression is a comma-separated list of terms; each term is a
//! single chapter number (integer or decimal extra like `16.5`) or an
//! inclusive integer span `low..high`. A batch expression chains
//! `vNN:range` groups with `-` and must list volumes in strictly increasing
//! order; possibly-unintended reorderings are rejected rather than guessed.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::{ChapterNumber, ChapterRange, VolumeSpec};

lazy_static! {
    /// One batch group: "v01:1..3" (case-insensitive, zeros tolerated).
    static ref BATCH_GROUP_REGEX: Regex =
        Regex::new(r"(?i)^v\s*0*([0-9]+):(.+)$").unwrap();
    /// One batch-file line: "v01:1..3" or the legacy "1,1..3" form.
    static ref BATCH_LINE_REGEX: Regex =
        Regex::new(r"(?i)^v?\s*0*([0-9]+)\s*[:,]\s*(.+)$").unwrap();
}

/// Resolves a range expression into an ordered, duplicate-free chapter set.
///
/// ```
/// use tankobon::range::resolve_range;
/// use tankobon::types::ChapterNumber;
///
/// let range = resolve_range("1,3,5..8").unwrap();
/// let bases: Vec<u32> = range.iter().map(|n| n.base).collect();
/// assert_eq!(bases, vec![1, 3, 5, 6, 7, 8]);
/// ```
///
/// Fails with [`Error::RangeSyntax`] on malformed terms, non-numeric tokens,
/// spans where `low > high`, and decimal span bounds. Duplicates across
/// terms collapse silently.
pub fn resolve_range(expression: &str) -> Result<ChapterRange> {
    let terms: Vec<&str> = expression
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Err(Error::RangeSyntax(format!(
            "empty range expression '{}'",
            expression
        )));
    }

    let mut numbers = Vec::new();
    for term in terms {
        match term.split_once("..") {
            Some((low, high)) => {
                let low = parse_span_bound(low, term)?;
                let high = parse_span_bound(high, term)?;
                if high < low {
                    return Err(Error::RangeSyntax(format!(
                        "invalid span '{}': end < start",
                        term
                    )));
                }
                numbers.extend((low..=high).map(ChapterNumber::main));
            }
            None => numbers.push(parse_term(term)?),
        }
    }
    Ok(numbers.into_iter().collect())
}

fn parse_span_bound(token: &str, term: &str) -> Result<u32> {
    let token = token.trim();
    if token.contains('.') {
        return Err(Error::RangeSyntax(format!(
            "span '{}' may only use integer bounds",
            term
        )));
    }
    token.parse::<u32>().map_err(|_| {
        Error::RangeSyntax(format!("non-numeric bound '{}' in span '{}'", token, term))
    })
}

fn parse_term(term: &str) -> Result<ChapterNumber> {
    match term.split_once('.') {
        Some((base, extra)) => {
            let base = base
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::RangeSyntax(format!("non-numeric term '{}'", term)))?;
            let extra = extra
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::RangeSyntax(format!("non-numeric term '{}'", term)))?;
            Ok(ChapterNumber::extra(base, extra))
        }
        None => term
            .parse::<u32>()
            .map(ChapterNumber::main)
            .map_err(|_| Error::RangeSyntax(format!("non-numeric term '{}'", term))),
    }
}

/// Resolves a `-`-separated batch expression like `"v01:1..3-v02:4..6"` into
/// an ordered sequence of [`VolumeSpec`]s for `series`.
///
/// Volume numbers must be strictly increasing across the batch; anything
/// else fails with [`Error::BatchOrder`] instead of silently reordering.
pub fn resolve_batch(series: &str, expression: &str) -> Result<Vec<VolumeSpec>> {
    let groups: Vec<&str> = expression
        .split('-')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .collect();
    if groups.is_empty() {
        return Err(Error::BatchOrder(format!(
            "empty batch expression '{}'",
            expression
        )));
    }

    let mut pairs = Vec::new();
    for group in groups {
        let caps = BATCH_GROUP_REGEX
            .captures(group)
            .ok_or_else(|| Error::BatchOrder(format!("invalid batch group '{}'", group)))?;
        let volume = caps[1]
            .parse::<u32>()
            .map_err(|_| Error::BatchOrder(format!("invalid volume number in '{}'", group)))?;
        pairs.push((volume, caps[2].to_string()));
    }
    specs_from_pairs(series, &pairs)
}

/// Builds the ordered batch from already-split `(volume, range)` pairs,
/// enforcing positive and strictly increasing volume numbers.
pub fn specs_from_pairs(series: &str, pairs: &[(u32, String)]) -> Result<Vec<VolumeSpec>> {
    let mut specs: Vec<VolumeSpec> = Vec::with_capacity(pairs.len());
    for (volume, expression) in pairs {
        if *volume == 0 {
            return Err(Error::BatchOrder(
                "volume numbers must be positive".to_string(),
            ));
        }
        if let Some(previous) = specs.last() {
            if *volume <= previous.volume {
                return Err(Error::BatchOrder(format!(
                    "volume {:02} listed after volume {:02}; batches must be strictly increasing",
                    volume, previous.volume
                )));
            }
        }
        specs.push(VolumeSpec {
            series: series.to_string(),
            volume: *volume,
            range: resolve_range(expression)?,
        });
    }
    Ok(specs)
}

/// Reads a batch file: one `volume:range` pair per line (`v01:1..3`; the
/// comma form `1,1..3` is accepted too). Blank lines and `#` comments are
/// skipped. Returns the pairs in file order; ordering rules are applied when
/// the pairs are resolved through [`specs_from_pairs`].
pub async fn read_batch_file(path: &Path) -> Result<Vec<(u32, String)>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let mut pairs = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let caps = BATCH_LINE_REGEX.captures(line).ok_or_else(|| {
            Error::BatchOrder(format!(
                "invalid batch line {} in {:?}: '{}'",
                index + 1,
                path,
                line
            ))
        })?;
        let volume = caps[1].parse::<u32>().map_err(|_| {
            Error::BatchOrder(format!("invalid volume number on line {}", index + 1))
        })?;
        pairs.push((volume, caps[2].to_string()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bases(range: &ChapterRange) -> Vec<u32> {
        range.iter().map(|n| n.base).collect()
    }

    #[test]
    fn resolves_commas_and_spans() {
        let range = resolve_range("1,3,5..8").unwrap();
        assert_eq!(bases(&range), vec![1, 3, 5, 6, 7, 8]);
        assert!(range.iter().all(|n| !n.is_extra()));
    }

    #[test]
    fn duplicates_collapse() {
        let range = resolve_range("2..4,3,2").unwrap();
        assert_eq!(bases(&range), vec![2, 3, 4]);
    }

    #[test]
    fn standalone_decimals_are_extras() {
        let range = resolve_range("4.5,4").unwrap();
        assert_eq!(
            range.numbers(),
            &[ChapterNumber::main(4), ChapterNumber::extra(4, 5)]
        );
    }

    #[test]
    fn malformed_expressions_fail() {
        for expression in ["5..2", "a..b", "1,,x", "1..2.5", "", "  "] {
            assert!(
                matches!(resolve_range(expression), Err(Error::RangeSyntax(_))),
                "{:?} should fail",
                expression
            );
        }
    }

    #[test]
    fn batch_resolves_in_order() {
        let specs = resolve_batch("Berserk", "v01:1..3-v02:4..6").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].volume, 1);
        assert_eq!(bases(&specs[0].range), vec![1, 2, 3]);
        assert_eq!(specs[1].volume, 2);
        assert_eq!(bases(&specs[1].range), vec![4, 5, 6]);
        assert!(specs.iter().all(|s| s.series == "Berserk"));
    }

    #[test]
    fn batch_rejects_reordered_volumes() {
        let err = resolve_batch("S", "v02:1..3-v01:4..6").unwrap_err();
        assert!(matches!(err, Error::BatchOrder(_)));

        let err = resolve_batch("S", "v01:1..3-v01:4..6").unwrap_err();
        assert!(matches!(err, Error::BatchOrder(_)));
    }

    #[test]
    fn batch_rejects_malformed_groups() {
        assert!(matches!(
            resolve_batch("S", "badspec"),
            Err(Error::BatchOrder(_))
        ));
        assert!(matches!(
            resolve_batch("S", "v00:1..3"),
            Err(Error::BatchOrder(_))
        ));
    }
}
