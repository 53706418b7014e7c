//! Named filename-matching rules for chapter archives.
//!
//! A [`NamingPattern`] pairs a main-chapter regex with an optional extra
//! regex recognizing fractional suffixes ("Ch.013.5"). Patterns are selected
//! by name from a closed registry, or overridden with explicit regex strings
//! supplied by the caller. A single matching routine parameterized by the
//! pattern value does all classification; there is no per-convention code.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::path_utils::get_file_name_lossy;
use crate::types::{ChapterIdentity, ChapterNumber};

lazy_static! {
    /// Default main-chapter rule: "Chapter 13", "Ch.013", "chapter_7 - Title".
    /// Leading zeros are consumed outside the capture so "013" parses as 13.
    static ref DEFAULT_CHAPTER_REGEX: Regex =
        Regex::new(r"(?i)ch(?:\.|apter)?[\s._-]*0*([0-9]+)").unwrap();
    /// Extra rule shared by conventions using the "Ch." prefix: "Ch.013.5".
    static ref CH_EXTRA_REGEX: Regex =
        Regex::new(r"(?i)ch(?:\.|apter)?[\s._-]*0*([0-9]+)\.([0-9]+)").unwrap();
    /// FMA-style main rule: "Chap 16".
    static ref CHAP_CHAPTER_REGEX: Regex =
        Regex::new(r"(?i)chap(?:\.|ter)?[\s._-]*0*([0-9]+)").unwrap();
    /// FMA-style extra rule: "Chap 16.1".
    static ref CHAP_EXTRA_REGEX: Regex =
        Regex::new(r"(?i)chap(?:\.|ter)?[\s._-]*0*([0-9]+)\.([0-9]+)").unwrap();
}

/// Name of the pattern used when the caller supplies nothing.
pub const DEFAULT_PATTERN_NAME: &str = "default";

/// Names the registry resolves, in registration order.
pub const KNOWN_PATTERN_NAMES: &[&str] = &["default", "mashle", "fma"];

/// A named filename-matching rule. Never mutated after resolution.
#[derive(Debug, Clone)]
pub struct NamingPattern {
    pub name: String,
    /// Must capture the main chapter number as group 1.
    pub chapter_regex: Regex,
    /// When present, must capture the base number as group 1 and the
    /// fractional suffix as group 2. Tried before `chapter_regex`.
    pub extra_regex: Option<Regex>,
}

impl NamingPattern {
    /// Extracts a chapter identity from an archive path, or `None` when the
    /// filename matches neither rule (the file is simply not of interest).
    ///
    /// The extra rule is tried first: a filename carrying a fractional
    /// suffix is an extra of its integer base, never also a main.
    pub fn classify(&self, path: &Path) -> Option<ChapterIdentity> {
        let file_name = get_file_name_lossy(path);

        if let Some(extra_regex) = &self.extra_regex {
            if let Some(caps) = extra_regex.captures(&file_name) {
                let base = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
                let extra = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
                if let (Some(base), Some(extra)) = (base, extra) {
                    return Some(ChapterIdentity {
                        number: ChapterNumber::extra(base, extra),
                        raw_label: caps.get(0).map(|m| m.as_str().to_string())?,
                        source_path: path.to_path_buf(),
                    });
                }
            }
        }

        let caps = self.chapter_regex.captures(&file_name)?;
        let base = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok())?;
        Some(ChapterIdentity {
            number: ChapterNumber::main(base),
            raw_label: caps.get(0).map(|m| m.as_str().to_string())?,
            source_path: path.to_path_buf(),
        })
    }
}

/// Resolves the active naming pattern for a run.
///
/// Explicit regex strings take precedence over the named selection and are
/// validated for capture arity: the chapter regex needs one capturing group
/// (the base number), the extra regex two (base, fractional suffix).
/// Invalid regex syntax fails with [`Error::Pattern`]; an unrecognized name
/// fails with [`Error::UnknownPattern`].
pub fn resolve_pattern(
    name: Option<&str>,
    chapter_regex: Option<&str>,
    extra_regex: Option<&str>,
) -> Result<NamingPattern> {
    if chapter_regex.is_some() || extra_regex.is_some() {
        let chapter = match chapter_regex {
            Some(source) => compile_with_groups(source, 1)?,
            None => DEFAULT_CHAPTER_REGEX.clone(),
        };
        let extra = extra_regex
            .map(|source| compile_with_groups(source, 2))
            .transpose()?;
        return Ok(NamingPattern {
            name: "custom".to_string(),
            chapter_regex: chapter,
            extra_regex: extra,
        });
    }

    let name = name.unwrap_or(DEFAULT_PATTERN_NAME);
    match name {
        "default" => Ok(NamingPattern {
            name: name.to_string(),
            chapter_regex: DEFAULT_CHAPTER_REGEX.clone(),
            extra_regex: None,
        }),
        "mashle" => Ok(NamingPattern {
            name: name.to_string(),
            chapter_regex: DEFAULT_CHAPTER_REGEX.clone(),
            extra_regex: Some(CH_EXTRA_REGEX.clone()),
        }),
        "fma" => Ok(NamingPattern {
            name: name.to_string(),
            chapter_regex: CHAP_CHAPTER_REGEX.clone(),
            extra_regex: Some(CHAP_EXTRA_REGEX.clone()),
        }),
        other => Err(Error::UnknownPattern(other.to_string())),
    }
}

fn compile_with_groups(source: &str, required_groups: usize) -> Result<Regex> {
    let regex =
        Regex::new(source).map_err(|e| Error::Pattern(format!("{}: {}", source, e)))?;
    // captures_len counts the implicit whole-match group 0
    if regex.captures_len() < required_groups + 1 {
        return Err(Error::Pattern(format!(
            "'{}' must contain {} capturing group(s)",
            source, required_groups
        )));
    }
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_pattern_matches_common_shapes() {
        let pattern = resolve_pattern(None, None, None).unwrap();
        for (file, base) in [
            ("Chapter 1.cbz", 1),
            ("Chapter 013.cbz", 13),
            ("Ch.7.cbz", 7),
            ("chapter_21 - The Title.cbz", 21),
        ] {
            let identity = pattern.classify(&PathBuf::from(file)).unwrap();
            assert_eq!(identity.number, ChapterNumber::main(base), "{}", file);
        }
        assert!(pattern.classify(&PathBuf::from("cover.cbz")).is_none());
    }

    #[test]
    fn fma_pattern_recognizes_extras() {
        let pattern = resolve_pattern(Some("fma"), None, None).unwrap();
        let main = pattern.classify(&PathBuf::from("Chap 16.cbz")).unwrap();
        assert_eq!(main.number, ChapterNumber::main(16));

        let extra = pattern.classify(&PathBuf::from("Chap 16.1.cbz")).unwrap();
        assert_eq!(extra.number, ChapterNumber::extra(16, 1));
        assert_eq!(extra.raw_label, "Chap 16.1");
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = resolve_pattern(Some("berserk"), None, None).unwrap_err();
        assert!(matches!(err, Error::UnknownPattern(name) if name == "berserk"));
    }

    #[test]
    fn explicit_regex_takes_precedence_and_is_validated() {
        let pattern =
            resolve_pattern(Some("fma"), Some(r"ep[\s_]*([0-9]+)"), None).unwrap();
        let identity = pattern.classify(&PathBuf::from("ep 12.cbz")).unwrap();
        assert_eq!(identity.number, ChapterNumber::main(12));

        assert!(matches!(
            resolve_pattern(None, Some("(unclosed"), None),
            Err(Error::Pattern(_))
        ));
        assert!(matches!(
            resolve_pattern(None, Some("no-groups"), None),
            Err(Error::Pattern(_))
        ));
        assert!(matches!(
            resolve_pattern(None, None, Some(r"only([0-9]+)one")),
            Err(Error::Pattern(_))
        ));
    }
}
