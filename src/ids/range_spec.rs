//! ID range specifications
//!
//! A range spec is a semicolon-separated list of single IDs and inclusive
//! `lo-hi` ranges, strictly ascending and non-overlapping, e.g. `1-3;37;48-50`.
//! The empty string is a valid spec for an empty pool. Named presets such as
//! `Avoid Special` expand to a canned spec for the category.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::tile::Category;

/// Preset that skips IDs with special engine behavior
pub const AVOID_SPECIAL: &str = "Avoid Special";

/// Preset covering the user-defined slots
pub const USER_SLOTS: &str = "User Slots";

const BLOCK_AVOID_SPECIAL: &str = "1;3;6-29;38-54;56-59;61-87;91-108;113-114;116-168;182-191;\
194-223;227-266;270-279;284-370;372-403;407-419;421-427;432-456;488-525;527-597;599-619;630;\
635-638;1001-1005;1008-1072;1076-1101;1106-1132;1138-1141;1156-1267;1269-1270";

const BGO_AVOID_SPECIAL: &str = "1-10;14-34;36-59;62-69;75-86;89-91;93-97;99;101-103;106;\
108-133;147-159;161-173;187-190;232-279;281-303";

const USER_SLOTS_SPEC: &str = "751-1000";

/// Names of the built-in presets
pub const PRESETS: &[&str] = &[AVOID_SPECIAL, USER_SLOTS];

/// Expand a preset name to its spec text, or return `text` unchanged
pub fn resolve_preset(text: &str, category: Category) -> &str {
    match (text, category) {
        (AVOID_SPECIAL, Category::Block) => BLOCK_AVOID_SPECIAL,
        (AVOID_SPECIAL, Category::Bgo) => BGO_AVOID_SPECIAL,
        (USER_SLOTS, _) => USER_SLOTS_SPEC,
        _ => text,
    }
}

/// How much work [`parse_id_list`] should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMode {
    /// Expand the spec into every covered ID
    Full,
    /// Only check the syntax and ordering
    ValidateOnly,
}

/// Error type for rejected range specs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("malformed ID token '{token}'")]
    Syntax { token: String },
    #[error("'{token}' must start above {previous}; ranges have to be ascending and non-overlapping")]
    Order { token: String, previous: u32 },
    #[error("range '{token}' must end above where it starts")]
    ReversedBounds { token: String },
    #[error("spec covers {count} IDs, more than the limit of {limit}")]
    TooManyIds { count: u64, limit: u64 },
}

/// Most IDs a single spec may cover
///
/// Well above any category's ID space; pools are materialized in memory.
pub const MAX_SPEC_IDS: u64 = 65_536;

/// A parsed, validated range spec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSpec {
    ranges: Vec<RangeInclusive<u32>>,
}

impl RangeSpec {
    /// Parse `text`, expanding presets for `category` first
    pub fn parse(text: &str, category: Category) -> Result<Self, RangeError> {
        let text = resolve_preset(text.trim(), category).trim();
        let mut ranges = Vec::new();
        if text.is_empty() {
            return Ok(Self { ranges });
        }

        let mut previous: Option<u32> = None;
        let mut count: u64 = 0;
        for token in text.split(';') {
            let token = token.trim();
            let range = parse_token(token)?;
            if let Some(prev) = previous {
                if *range.start() <= prev {
                    return Err(RangeError::Order {
                        token: token.to_string(),
                        previous: prev,
                    });
                }
            }
            count += u64::from(*range.end() - *range.start()) + 1;
            if count > MAX_SPEC_IDS {
                return Err(RangeError::TooManyIds {
                    count,
                    limit: MAX_SPEC_IDS,
                });
            }
            previous = Some(*range.end());
            ranges.push(range);
        }

        Ok(Self { ranges })
    }

    /// Inclusive sub-ranges in ascending order
    pub fn ranges(&self) -> &[RangeInclusive<u32>] {
        &self.ranges
    }

    /// Number of IDs covered
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|r| u64::from(*r.end() - *r.start()) + 1)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterate over every covered ID in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    /// Materialize every covered ID
    pub fn ids(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            if range.start() == range.end() {
                write!(f, "{}", range.start())?;
            } else {
                write!(f, "{}-{}", range.start(), range.end())?;
            }
        }
        Ok(())
    }
}

fn parse_number(text: &str, token: &str) -> Result<u32, RangeError> {
    let syntax = || RangeError::Syntax {
        token: token.to_string(),
    };
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(syntax());
    }
    text.parse().map_err(|_| syntax())
}

fn parse_token(token: &str) -> Result<RangeInclusive<u32>, RangeError> {
    match token.split_once('-') {
        None => {
            let id = parse_number(token, token)?;
            Ok(id..=id)
        }
        Some((lo, hi)) => {
            let lo = parse_number(lo, token)?;
            let hi = parse_number(hi, token)?;
            if hi <= lo {
                return Err(RangeError::ReversedBounds {
                    token: token.to_string(),
                });
            }
            Ok(lo..=hi)
        }
    }
}

/// Parse a range spec
///
/// Returns `Ok(Some(ids))` in [`ParseMode::Full`] and `Ok(None)` in
/// [`ParseMode::ValidateOnly`].
pub fn parse_id_list(
    text: &str,
    category: Category,
    mode: ParseMode,
) -> Result<Option<Vec<u32>>, RangeError> {
    let spec = RangeSpec::parse(text, category)?;
    Ok(match mode {
        ParseMode::Full => Some(spec.ids()),
        ParseMode::ValidateOnly => None,
    })
}

/// Memo of recently parsed specs
///
/// Parsing is referentially transparent, so a cached result is always the
/// result a fresh parse would give.
#[derive(Debug, Clone, Default)]
pub struct RangeCache {
    entries: HashMap<(String, Category), Result<RangeSpec, RangeError>>,
}

impl RangeCache {
    /// Entries kept before the cache starts over
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text`, reusing an earlier result when there is one
    pub fn get(&mut self, text: &str, category: Category) -> Result<&RangeSpec, RangeError> {
        let key = (text.to_string(), category);
        if !self.entries.contains_key(&key) && self.entries.len() >= Self::CAPACITY {
            self.entries.clear();
        }
        self.entries
            .entry(key)
            .or_insert_with(|| RangeSpec::parse(text, category))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Same contract as [`parse_id_list`]
    pub fn parse(
        &mut self,
        text: &str,
        category: Category,
        mode: ParseMode,
    ) -> Result<Option<Vec<u32>>, RangeError> {
        let spec = self.get(text, category)?;
        Ok(match mode {
            ParseMode::Full => Some(spec.ids()),
            ParseMode::ValidateOnly => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(text: &str) -> Result<Option<Vec<u32>>, RangeError> {
        parse_id_list(text, Category::Block, ParseMode::Full)
    }

    #[test]
    fn test_mixed_tokens() {
        assert_eq!(full("1-3;37;48-50"), Ok(Some(vec![1, 2, 3, 37, 48, 49, 50])));
    }

    #[test]
    fn test_empty_spec_is_empty_pool() {
        assert_eq!(full(""), Ok(Some(vec![])));
        assert_eq!(
            parse_id_list("", Category::Bgo, ParseMode::ValidateOnly),
            Ok(None)
        );
    }

    #[test]
    fn test_reversed_range_fails() {
        assert!(matches!(full("5-3"), Err(RangeError::ReversedBounds { .. })));
        assert!(matches!(full("5-5"), Err(RangeError::ReversedBounds { .. })));
    }

    #[test]
    fn test_order_violations_fail() {
        assert!(matches!(full("10;5"), Err(RangeError::Order { previous: 10, .. })));
        assert!(matches!(full("1-10;10-12"), Err(RangeError::Order { .. })));
        assert!(matches!(full("1-10;4"), Err(RangeError::Order { .. })));
        assert!(matches!(full("3;3"), Err(RangeError::Order { .. })));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["1;;2", "1;", "a", "1-", "-3", "1-2-3", "+4", "1.5", "99999999999"] {
            assert!(
                matches!(full(bad), Err(RangeError::Syntax { .. })),
                "expected syntax error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_union_of_ranges() {
        let cases: &[(&str, &[RangeInclusive<u32>])] = &[
            ("0", &[0..=0]),
            ("4-9;11;20-21", &[4..=9, 11..=11, 20..=21]),
            (" 7 ; 9-10 ", &[7..=7, 9..=10]),
        ];
        for (text, ranges) in cases {
            let expected: Vec<u32> = ranges.iter().flat_map(|r| r.clone()).collect();
            let ids = full(text).unwrap().unwrap();
            assert_eq!(ids, expected);
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_presets_resolve_per_category() {
        let block = RangeSpec::parse(AVOID_SPECIAL, Category::Block).unwrap();
        let bgo = RangeSpec::parse(AVOID_SPECIAL, Category::Bgo).unwrap();
        assert_eq!(block.ranges().first(), Some(&(1..=1)));
        assert_eq!(block.ranges().last(), Some(&(1269..=1270)));
        assert_eq!(bgo.ranges().last(), Some(&(281..=303)));
        assert_ne!(block, bgo);

        let slots = RangeSpec::parse(USER_SLOTS, Category::Bgo).unwrap();
        assert_eq!(slots.len(), 250);
        assert_eq!(slots.to_string(), "751-1000");
    }

    #[test]
    fn test_validate_only_does_not_expand() {
        assert_eq!(
            parse_id_list("1-60000", Category::Block, ParseMode::ValidateOnly),
            Ok(None)
        );
        let spec = RangeSpec::parse("0-65535", Category::Block).unwrap();
        assert_eq!(spec.len(), MAX_SPEC_IDS);
    }

    #[test]
    fn test_oversized_spec_rejected() {
        for mode in [ParseMode::Full, ParseMode::ValidateOnly] {
            assert_eq!(
                parse_id_list("0-4000000000", Category::Block, mode),
                Err(RangeError::TooManyIds {
                    count: 4_000_000_001,
                    limit: MAX_SPEC_IDS,
                })
            );
        }
        // The limit applies to the total, not to each range
        assert!(matches!(
            RangeSpec::parse("1-40000;50000-90000", Category::Bgo),
            Err(RangeError::TooManyIds { limit: MAX_SPEC_IDS, .. })
        ));
    }

    #[test]
    fn test_display_is_canonical() {
        let spec = RangeSpec::parse("1 - 3", Category::Block);
        assert!(spec.is_err());
        let spec = RangeSpec::parse("1-3; 37 ;48-50", Category::Block).unwrap();
        assert_eq!(spec.to_string(), "1-3;37;48-50");
    }

    #[test]
    fn test_cache_matches_fresh_parse() {
        let mut cache = RangeCache::new();
        for text in ["1-3;37", "5-3", "", AVOID_SPECIAL] {
            for category in Category::ALL {
                for mode in [ParseMode::Full, ParseMode::ValidateOnly] {
                    assert_eq!(
                        cache.parse(text, *category, mode),
                        parse_id_list(text, *category, mode)
                    );
                    // Second lookup comes from the cache
                    assert_eq!(
                        cache.parse(text, *category, mode),
                        parse_id_list(text, *category, mode)
                    );
                }
            }
        }
        assert_eq!(cache.len(), 8);
    }
}
