//! Glob pattern matching.
//!
//! Supports `*` (any run of characters, including empty) plus `\*` and
//! `\\` escapes, matching the pattern syntax accepted by the compiler.
//! Iterative with single-star backtracking, no allocation beyond the
//! decoded pattern.

/// One element of a decoded pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pat {
    Star,
    Char(char),
}

fn decode(pattern: &str) -> Vec<Pat> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                // Compiled patterns only escape '*' and '\'.
                if let Some(esc) = chars.next() {
                    out.push(Pat::Char(esc));
                }
            }
            '*' => out.push(Pat::Star),
            other => out.push(Pat::Char(other)),
        }
    }
    out
}

/// Match `subject` against a glob `pattern`.
pub fn glob_match(pattern: &str, subject: &str) -> bool {
    let pat = decode(pattern);
    let subject: Vec<char> = subject.chars().collect();

    let mut p = 0;
    let mut s = 0;
    // Position of the most recent star and the subject index it
    // matched up to, for backtracking.
    let mut star: Option<(usize, usize)> = None;

    while s < subject.len() {
        match pat.get(p) {
            Some(Pat::Char(c)) if *c == subject[s] => {
                p += 1;
                s += 1;
            }
            Some(Pat::Star) => {
                star = Some((p, s));
                p += 1;
            }
            _ => match star {
                // Let the last star swallow one more character.
                Some((star_p, star_s)) => {
                    p = star_p + 1;
                    s = star_s + 1;
                    star = Some((star_p, star_s + 1));
                }
                None => return false,
            },
        }
    }
    // Only trailing stars may remain.
    while let Some(Pat::Star) = pat.get(p) {
        p += 1;
    }
    p == pat.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_without_wildcard() {
        assert!(glob_match("abc", "abc"));
        assert!(!glob_match("abc", "abd"));
    }

    #[test]
    fn star_matches_any_run() {
        assert!(glob_match("app.*", "app.server"));
        assert!(glob_match("app.*", "app."));
        assert!(!glob_match("app.*", "ap"));
    }

    #[test]
    fn star_in_the_middle_backtracks() {
        assert!(glob_match("a*c", "abbbc"));
        assert!(glob_match("a*b*c", "aXbYbZc"));
        assert!(!glob_match("a*b*c", "ac"));
    }

    #[test]
    fn escaped_star_is_literal() {
        assert!(glob_match(r"a\*b", "a*b"));
        assert!(!glob_match(r"a\*b", "axb"));
    }

    #[test]
    fn escaped_backslash_is_literal() {
        assert!(glob_match(r"a\\b", r"a\b"));
    }

    #[test]
    fn lone_star_matches_everything() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
    }
}
