//! Glob matching for KEYS, SCAN, HSCAN and pattern subscriptions.
//!
//! Patterns follow the server's dialect: `*` matches any run of characters
//! (including none), `?` exactly one, `[abc]`, `[a-z]` and `[^abc]` a
//! character class, and `\x` the literal `x`. Braces and commas have no
//! special meaning. Patterns are rewritten into `globset` syntax, which
//! compiles them to a finite automaton, so matching time is linear in the
//! input whatever the pattern looks like.

use globset::{GlobBuilder, GlobMatcher};

#[derive(Debug, Clone)]
enum Matcher {
    Glob(GlobMatcher),
    Literal(String),
    Never,
}

#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    matcher: Matcher,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Self {
        let matcher = match normalize(pattern) {
            None => Matcher::Never,
            Some(normalized) => match GlobBuilder::new(&normalized)
                .literal_separator(false)
                .backslash_escape(true)
                .build()
            {
                Ok(glob) => Matcher::Glob(glob.compile_matcher()),
                Err(e) => {
                    tracing::debug!(pattern, error = %e, "falling back to literal match");
                    Matcher::Literal(pattern.to_string())
                }
            },
        };

        Self {
            source: pattern.to_string(),
            matcher,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        match &self.matcher {
            Matcher::Glob(glob) => glob.is_match(candidate),
            Matcher::Literal(literal) => literal == candidate,
            Matcher::Never => false,
        }
    }
}

/// Rewrites a pattern into globset syntax. `None` means nothing can match.
fn normalize(pattern: &str) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                out.push('\\');
                match chars.get(i + 1) {
                    Some(&next) => {
                        out.push(next);
                        i += 2;
                    }
                    None => {
                        out.push('\\');
                        i += 1;
                    }
                }
            }
            '*' => {
                // globset gives `**` a recursive meaning, the server does not
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end])?;
                    i = end + 1;
                }
                None => {
                    out.push_str("\\[");
                    i += 1;
                }
            },
            c @ ('{' | '}' | ']' | ',') => {
                out.push('\\');
                out.push(c);
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Some(out)
}

fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;

    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            ']' => return Some(j),
            _ => j += 1,
        }
    }

    None
}

/// Emits a character class. Returns `None` for an empty class, which can
/// never match a character.
fn push_class(out: &mut String, body: &[char]) -> Option<()> {
    let (negate, body) = match body.first() {
        Some('^') => (true, &body[1..]),
        _ => (false, body),
    };

    let mut singles: Vec<char> = Vec::new();
    let mut ranges: Vec<(char, char)> = Vec::new();
    let mut j = 0;

    while j < body.len() {
        let c = if body[j] == '\\' && j + 1 < body.len() {
            j += 1;
            body[j]
        } else {
            body[j]
        };

        if body.get(j + 1) == Some(&'-') && j + 2 < body.len() {
            let end = body[j + 2];
            let (lo, hi) = if c <= end { (c, end) } else { (end, c) };
            ranges.push((lo, hi));
            j += 3;
        } else {
            singles.push(c);
            j += 1;
        }
    }

    if singles.is_empty() && ranges.is_empty() {
        if negate {
            out.push('?');
            return Some(());
        }
        return None;
    }

    if !negate && ranges.is_empty() && singles.len() == 1 {
        out.push('\\');
        out.push(singles[0]);
        return Some(());
    }

    out.push('[');
    if negate {
        out.push('!');
    }
    if singles.contains(&']') {
        out.push(']');
    }
    for (lo, hi) in &ranges {
        out.push(*lo);
        out.push('-');
        out.push(*hi);
    }
    for c in singles.iter().filter(|c| !matches!(c, ']' | '-' | '!')) {
        out.push(*c);
    }
    if singles.contains(&'!') {
        out.push('!');
    }
    if singles.contains(&'-') {
        out.push('-');
    }
    out.push(']');

    Some(())
}
