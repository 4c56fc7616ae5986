//! Neutral placeholder tokens.
//!
//! Builders emit `#{n}`, zero-based, in the same order as their bound values.
//! The closing brace keeps every index boundary explicit, so `#{1}` never
//! matches inside `#{10}`.

use crate::dialect::PlaceholderStyle;

pub(crate) fn push_token(out: &mut String, index: usize) {
    out.push_str("#{");
    out.push_str(&index.to_string());
    out.push('}');
}

pub(crate) fn token(index: usize) -> String {
    format!("#{{{index}}}")
}

/// Renumber the tokens `#{0}..#{count-1}` of `sql` to continue at `*next`.
///
/// Tokens are replaced left to right. The scan resumes after each replaced
/// token, so a freshly written index is never matched again. `*next` advances
/// by `count`.
pub(crate) fn renumber(sql: &str, count: usize, next: &mut usize) -> String {
    if count == 0 {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len() + count * 2);
    let mut rest = sql;
    for i in 0..count {
        let from = token(i);
        if let Some(pos) = rest.find(&from) {
            out.push_str(&rest[..pos]);
            push_token(&mut out, *next);
            rest = &rest[pos + from.len()..];
        }
        *next += 1;
    }
    out.push_str(rest);
    out
}

/// Replace every `#{n}` token with the driver's placeholder syntax.
pub(crate) fn render(sql: &str, style: PlaceholderStyle) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(start) = rest.find("#{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && after[digits..].starts_with('}') {
            // Digit runs are ASCII, the parse only fails on overflow.
            match after[..digits].parse::<usize>() {
                Ok(index) => style.write(&mut out, index),
                Err(_) => out.push_str(&rest[start..start + 3 + digits]),
            }
            rest = &after[digits + 1..];
        } else {
            out.push_str("#{");
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Collapse whitespace runs to single spaces and trim.
pub(crate) fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renumber_continues_parent_index() {
        let mut next = 3;
        let sql = renumber("a = #{0} AND b IN (#{1})", 2, &mut next);
        assert_eq!(sql, "a = #{3} AND b IN (#{4})");
        assert_eq!(next, 5);
    }

    #[test]
    fn renumber_never_rematches_written_tokens() {
        // #{0} -> #{1} must not be picked up again when looking for #{1}.
        let mut next = 1;
        let sql = renumber("x = #{0} OR y = #{1}", 2, &mut next);
        assert_eq!(sql, "x = #{1} OR y = #{2}");
    }

    #[test]
    fn renumber_respects_index_boundaries() {
        let text: Vec<String> = (0..12).map(|i| format!("c{i} = #{{{i}}}")).collect();
        let mut next = 100;
        let sql = renumber(&text.join(" AND "), 12, &mut next);
        assert!(sql.starts_with("c0 = #{100} AND c1 = #{101}"));
        assert!(sql.ends_with("c10 = #{110} AND c11 = #{111}"));
    }

    #[test]
    fn render_styles() {
        let sql = "a = #{0} AND b = #{1}";
        assert_eq!(render(sql, PlaceholderStyle::Question), "a = ? AND b = ?");
        assert_eq!(render(sql, PlaceholderStyle::Dollar), "a = $1 AND b = $2");
        assert_eq!(render(sql, PlaceholderStyle::AtP), "a = @p1 AND b = @p2");
        assert_eq!(render(sql, PlaceholderStyle::Colon), "a = :1 AND b = :2");
        assert_eq!(render(sql, PlaceholderStyle::Indexed), "a = ?0 AND b = ?1");
    }

    #[test]
    fn render_leaves_other_braces() {
        assert_eq!(render("x = '#{a}'", PlaceholderStyle::Dollar), "x = '#{a}'");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  SELECT *\n  FROM t  "), "SELECT * FROM t");
    }
}
