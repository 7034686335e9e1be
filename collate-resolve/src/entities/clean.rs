//! Mention cleaning: the deterministic text form every later stage
//! keys on.

/// Honorifics stripped from the front of a mention. Stripping never
/// leaves the name empty; a bare "Dr" stays "dr".
const TITLE_PREFIXES: &[&str] = &[
    "mr ", "mrs ", "ms ", "dr ", "hon ", "prof ", "judge ", "rev ", "sir ", "dame ",
];

/// Suffixes that carry no identity. Generational suffixes (jr, sr,
/// ii) are deliberately kept: they distinguish people.
const NOISE_SUFFIXES: &[&str] = &[" esq"];

/// Clean a raw mention: lowercase, strip punctuation, collapse
/// whitespace, drop honorifics. Total and deterministic; never fails.
pub fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        let mapped = match ch {
            '\'' | '\u{2019}' => continue,
            c if c.is_alphanumeric() => Some(c),
            _ => None,
        };
        match mapped {
            Some(c) => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                for lower in c.to_lowercase() {
                    out.push(lower);
                }
            }
            None => pending_space = true,
        }
    }

    for prefix in TITLE_PREFIXES {
        if let Some(rest) = out.strip_prefix(prefix) {
            if !rest.is_empty() {
                out = rest.to_string();
            }
            break;
        }
    }
    for suffix in NOISE_SUFFIXES {
        if let Some(rest) = out.strip_suffix(suffix) {
            if !rest.is_empty() {
                out = rest.to_string();
            }
            break;
        }
    }
    out
}

/// Collapse a duplicated leading token, the classic OCR stutter:
/// "je je epstein" becomes "je epstein". Returns `None` when there is
/// nothing to collapse.
pub fn collapse_leading_stutter(cleaned: &str) -> Option<String> {
    let mut tokens = cleaned.split(' ');
    let first = tokens.next()?;
    let second = tokens.next()?;
    if first != second {
        return None;
    }
    let mut out = String::with_capacity(cleaned.len());
    out.push_str(first);
    for token in tokens {
        out.push(' ');
        out.push_str(token);
    }
    Some(out)
}

/// Last token of a cleaned name; the fuzzy bucket key.
pub fn surname(cleaned: &str) -> Option<&str> {
    cleaned.rsplit(' ').next().filter(|s| !s.is_empty())
}

/// Tokens of a cleaned name.
pub fn tokens(cleaned: &str) -> impl Iterator<Item = &str> {
    cleaned.split(' ').filter(|t| !t.is_empty())
}
