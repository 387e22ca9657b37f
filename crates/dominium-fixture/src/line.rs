// SPDX-License-Identifier: Apache-2.0
//! Line-level lexing shared by every fixture kind: comment stripping,
//! blank-line skipping, `key=value` splitting, and the `<kind><index>_<field>`
//! indexed-key grammar (spec.md §6 "indexed keys such as
//! `record17_side3_id=alpha_side`").
//!
//! Our domains keep one flat arena per entity kind rather than the nested
//! per-record sub-lists the example key above illustrates, so every key
//! this parser accepts carries exactly one index: `<kind><index>_<field>`.

/// Strips a `#`-to-end-of-line comment.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    line.find('#').map_or(line, |i| &line[..i])
}

/// Every non-blank, non-comment-only line of `text`, paired with its
/// 1-based line number, comment-stripped and trimmed.
pub fn body_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| (i + 1, strip_comment(raw).trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Splits `line` on its first `=` into `(key, value)`, both trimmed.
#[must_use]
pub fn split_kv(line: &str) -> Option<(&str, &str)> {
    let at = line.find('=')?;
    Some((line[..at].trim(), line[at + 1..].trim()))
}

/// Splits an indexed key like `side3_readiness` into `("side", 3,
/// "readiness")`. Returns `None` for keys with no digit run right after
/// an all-lowercase prefix (e.g. `policy_cost_full`, which callers handle
/// separately before falling back to this parser).
#[must_use]
pub fn parse_indexed_key(key: &str) -> Option<(&str, u32, &str)> {
    let digit_start = key.find(|c: char| c.is_ascii_digit())?;
    if digit_start == 0 {
        return None;
    }
    let prefix = &key[..digit_start];
    if !prefix.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    let rest = &key[digit_start..];
    let digit_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digit_end == 0 {
        return None;
    }
    let index: u32 = rest[..digit_end].parse().ok()?;
    let field = rest[digit_end..].strip_prefix('_')?;
    if field.is_empty() {
        return None;
    }
    Some((prefix, index, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment() {
        assert_eq!(strip_comment("side1_id=alpha # a comment"), "side1_id=alpha ");
    }

    #[test]
    fn full_line_comments_and_blanks_are_skipped() {
        let text = "# header comment\n\nside1_id=alpha\n   \n";
        let lines: Vec<_> = body_lines(text).collect();
        assert_eq!(lines, vec![(3, "side1_id=alpha")]);
    }

    #[test]
    fn splits_key_and_value() {
        assert_eq!(split_kv("side1_id = alpha_side"), Some(("side1_id", "alpha_side")));
    }

    #[test]
    fn indexed_key_grammar() {
        assert_eq!(parse_indexed_key("side3_readiness"), Some(("side", 3, "readiness")));
        assert_eq!(parse_indexed_key("record0_id"), Some(("record", 0, "id")));
        assert_eq!(
            parse_indexed_key("morale17_decay_rate"),
            Some(("morale", 17, "decay_rate"))
        );
    }

    #[test]
    fn non_indexed_keys_return_none() {
        assert_eq!(parse_indexed_key("policy_cost_full"), None);
        assert_eq!(parse_indexed_key("side_id"), None);
        assert_eq!(parse_indexed_key("3side_id"), None);
    }
}
