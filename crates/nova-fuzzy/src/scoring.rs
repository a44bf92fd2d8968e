use std::cmp::Ordering;

/// The kind of match that was produced, from strongest to weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// `candidate` equals the pattern (ASCII case-insensitive).
    Exact,
    /// `candidate` starts with the pattern (ASCII case-insensitive).
    Prefix,
    /// The pattern occurs inside `candidate`, starting at a word boundary.
    Substring,
    /// Pattern chunks are prefixes of successive camel-case humps (`tc` → `TestCase`).
    CamelCase,
    /// Whole-name match within a small edit distance.
    EditDistance,
}

/// Score returned by [`pattern_match`] and [`PatternMatcher::score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
    pub kind: MatchKind,
    pub score: i32,
}

/// A key that defines stable ordering for matches.
///
/// This is returned by [`MatchScore::rank_key`] and can be used as a sort key;
/// a greater key is a better match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    kind_rank: i32,
    score: i32,
}

impl MatchScore {
    pub fn rank_key(self) -> RankKey {
        let kind_rank = match self.kind {
            MatchKind::Exact => 5,
            MatchKind::Prefix => 4,
            MatchKind::Substring => 3,
            MatchKind::CamelCase => 2,
            MatchKind::EditDistance => 1,
        };
        RankKey {
            kind_rank,
            score: self.score,
        }
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.kind_rank, self.score).cmp(&(other.kind_rank, other.score))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline]
fn fold_byte(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

#[inline]
fn is_separator(b: u8) -> bool {
    matches!(
        b,
        b'_' | b'-' | b' ' | b'/' | b'\\' | b'.' | b':' | b'<' | b'>' | b'(' | b')' | b'['
            | b']'
    )
}

/// Word starts of an identifier, in the camel-case sense.
///
/// `XMLReader` splits as `XML` + `Reader`; `Test123` as `Test` + `123`.
fn compute_word_starts(candidate: &[u8], out: &mut Vec<usize>) {
    out.clear();
    for (i, &b) in candidate.iter().enumerate() {
        if is_separator(b) {
            continue;
        }
        if i == 0 {
            out.push(i);
            continue;
        }

        let prev = candidate[i - 1];
        let next_is_lower = candidate.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
        let boundary = is_separator(prev)
            || (prev.is_ascii_lowercase() && b.is_ascii_uppercase())
            || (prev.is_ascii_uppercase() && b.is_ascii_uppercase() && next_is_lower)
            || (prev.is_ascii_alphabetic() && b.is_ascii_digit())
            || (prev.is_ascii_digit() && b.is_ascii_alphabetic());
        if boundary {
            out.push(i);
        }
    }
}

fn case_bonus(pattern: &[u8], candidate: &[u8]) -> i32 {
    pattern
        .iter()
        .zip(candidate)
        .filter(|(p, c)| p == c)
        .count() as i32
}

/// Largest edit distance tolerated for a pattern of `len` bytes, or `None`
/// when the pattern is too short for edit-distance matching to be useful.
pub fn edit_distance_threshold(len: usize) -> Option<usize> {
    match len {
        0..=2 => None,
        3..=5 => Some(1),
        _ => Some(2),
    }
}

const MIN_SCORE: i32 = i32::MIN / 4;

/// Reusable pattern matcher that avoids per-candidate allocations.
///
/// Matching is ASCII case-insensitive. Every pattern byte is literal: `*`, `?`
/// and brackets have no wildcard meaning.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: String,
    folded: Vec<u8>,
    word_starts: Vec<usize>,
    dp: Vec<i32>,
}

impl PatternMatcher {
    /// Returns `None` for an empty or whitespace-only pattern; such patterns
    /// never match anything.
    pub fn new(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        Some(Self {
            pattern: pattern.to_string(),
            folded: pattern.bytes().map(fold_byte).collect(),
            word_starts: Vec::new(),
            dp: Vec::new(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether [`PatternMatcher::score_edit_distance`] can ever match.
    ///
    /// Only purely alphabetic ASCII patterns of at least three characters take
    /// part in edit-distance matching; anything else would turn punctuation
    /// typos into spurious hits.
    pub fn supports_edit_distance(&self) -> bool {
        edit_distance_threshold(self.folded.len()).is_some()
            && self.folded.iter().all(u8::is_ascii_alphabetic)
    }

    /// Scores `candidate` against the pattern, excluding edit-distance matches.
    pub fn score(&mut self, candidate: &str) -> Option<MatchScore> {
        let c = candidate.as_bytes();
        let p = self.pattern.as_bytes();
        if self.folded.len() > c.len() {
            return None;
        }

        let len_penalty = c.len() as i32;
        if starts_with_folded(c, &self.folded) {
            let bonus = case_bonus(p, c);
            if c.len() == self.folded.len() {
                return Some(MatchScore {
                    kind: MatchKind::Exact,
                    score: bonus,
                });
            }
            // Prefix matches prefer shorter identifiers for the same pattern.
            return Some(MatchScore {
                kind: MatchKind::Prefix,
                score: 1_000_000 - len_penalty + bonus,
            });
        }

        compute_word_starts(c, &mut self.word_starts);

        for &start in self.word_starts.iter().skip(1) {
            if starts_with_folded(&c[start..], &self.folded) {
                let bonus = case_bonus(p, &c[start..]);
                return Some(MatchScore {
                    kind: MatchKind::Substring,
                    score: 1_000_000 - len_penalty - start as i32 + bonus,
                });
            }
        }

        self.camel_case_score(c).map(|score| MatchScore {
            kind: MatchKind::CamelCase,
            score,
        })
    }

    /// Scores `candidate` by whole-name edit distance.
    ///
    /// Intended as a second pass when [`PatternMatcher::score`] found nothing
    /// in a candidate set.
    pub fn score_edit_distance(&self, candidate: &str) -> Option<MatchScore> {
        if !self.supports_edit_distance() {
            return None;
        }
        let threshold = edit_distance_threshold(self.folded.len())?;
        if candidate.len().abs_diff(self.folded.len()) > threshold {
            return None;
        }
        let candidate_folded = candidate.to_ascii_lowercase();
        let pattern_folded = self.pattern.to_ascii_lowercase();
        let distance = strsim::damerau_levenshtein(&pattern_folded, &candidate_folded);
        if distance == 0 || distance > threshold {
            return None;
        }
        Some(MatchScore {
            kind: MatchKind::EditDistance,
            score: -(distance as i32),
        })
    }

    /// Camel-case hump matching.
    ///
    /// Each step consumes a non-empty prefix of one hump. Humps may be
    /// skipped, at a cost; so may the leading humps.
    fn camel_case_score(&mut self, candidate: &[u8]) -> Option<i32> {
        const PER_CHAR: i32 = 10;
        const CONTIGUOUS_HUMP: i32 = 5;
        const SKIPPED_HUMP: i32 = 3;
        const LEADING_HUMP: i32 = 8;

        let humps = &self.word_starts;
        let h = humps.len();
        let p = self.folded.len();
        if h < 2 {
            return None;
        }

        // dp[pi * (h + 1) + hi]: best score for pattern[pi..] using humps[hi..].
        let width = h + 1;
        self.dp.clear();
        self.dp.resize((p + 1) * width, MIN_SCORE);
        for hi in 0..=h {
            self.dp[p * width + hi] = 0;
        }

        for pi in (0..p).rev() {
            for hi in (0..h).rev() {
                let mut best = MIN_SCORE;
                for hj in hi..h {
                    let start = humps[hj];
                    let end = humps.get(hj + 1).copied().unwrap_or(candidate.len());
                    let hump = &candidate[start..end];
                    let max_k = common_folded_prefix(hump, &self.folded[pi..]);
                    for k in 1..=max_k {
                        let rest = self.dp[(pi + k) * width + hj + 1];
                        if rest <= MIN_SCORE / 2 {
                            continue;
                        }
                        let skipped = (hj - hi) as i32;
                        let skip_cost = if pi == 0 {
                            LEADING_HUMP * skipped
                        } else {
                            SKIPPED_HUMP * skipped
                        };
                        let mut score = rest + PER_CHAR * k as i32 - skip_cost;
                        if skipped == 0 && pi > 0 {
                            score += CONTIGUOUS_HUMP;
                        }
                        best = best.max(score);
                    }
                }
                self.dp[pi * width + hi] = best;
            }
        }

        let best = self.dp[0];
        if best <= MIN_SCORE / 2 {
            None
        } else {
            Some(best - candidate.len() as i32)
        }
    }
}

fn starts_with_folded(candidate: &[u8], pattern_folded: &[u8]) -> bool {
    if pattern_folded.len() > candidate.len() {
        return false;
    }
    candidate
        .iter()
        .zip(pattern_folded)
        .all(|(&c, &p)| fold_byte(c) == p)
}

fn common_folded_prefix(hump: &[u8], pattern_folded: &[u8]) -> usize {
    hump.iter()
        .zip(pattern_folded)
        .take_while(|&(&c, &p)| fold_byte(c) == p)
        .count()
}

/// Match `pattern` against `candidate`, including the edit-distance tier.
///
/// Convenience wrapper for one-off checks; use [`PatternMatcher`] when
/// scoring many candidates.
pub fn pattern_match(pattern: &str, candidate: &str) -> Option<MatchScore> {
    let mut matcher = PatternMatcher::new(pattern)?;
    matcher
        .score(candidate)
        .or_else(|| matcher.score_edit_distance(candidate))
}
