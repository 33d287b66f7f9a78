use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```(?:sql)?[ \t]*\r?\n?").unwrap());

static FENCE_CLOSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```\s*$").unwrap());

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:sql)?\s*(.*?)```").unwrap());

/// Recovers a bare SQL statement from a model reply that may be wrapped in
/// markdown code fences.
///
/// Steps run in a fixed order: leading fence opener, trailing fence closer,
/// stray edge backticks, then extraction of the first fenced block if a fence
/// survived somewhere in the middle. Remaining backticks are removed. If all of
/// that leaves nothing, the trimmed raw text (minus backticks) is returned
/// instead. The result never contains a backtick, and applying this twice gives
/// the same string as applying it once.
pub fn sanitize_sql_response(raw: &str) -> String {
    let trimmed = raw.trim();

    let mut sql = FENCE_OPENER.replace(trimmed, "").into_owned();
    sql = FENCE_CLOSER.replace(&sql, "").into_owned();
    sql = sql.trim().trim_matches('`').trim().to_string();

    if sql.contains("```") {
        if let Some(inner) = FENCED_BLOCK.captures(&sql).and_then(|c| c.get(1)) {
            sql = inner.as_str().to_string();
        }
    }

    let sql = sql.replace('`', "").trim().to_string();

    if sql.is_empty() {
        return trimmed.replace('`', "").trim().to_string();
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_sql_fence() {
        let input = "```sql\nSELECT * FROM t\n```";
        assert_eq!(sanitize_sql_response(input), "SELECT * FROM t");
    }

    #[test]
    fn test_sanitize_untagged_fence() {
        let input = "```\nSELECT COUNT(*) FROM \"t\"\n```";
        assert_eq!(sanitize_sql_response(input), "SELECT COUNT(*) FROM \"t\"");
    }

    #[test]
    fn test_sanitize_uppercase_tag() {
        let input = "```SQL\nSELECT 1\n```";
        assert_eq!(sanitize_sql_response(input), "SELECT 1");
    }

    #[test]
    fn test_sanitize_single_line_fence() {
        assert_eq!(sanitize_sql_response("```SELECT 1```"), "SELECT 1");
    }

    #[test]
    fn test_sanitize_fence_mid_text() {
        let input = "Here is the query:\n```sql\nSELECT name FROM t\n```\nIt lists names.";
        assert_eq!(sanitize_sql_response(input), "SELECT name FROM t");
    }

    #[test]
    fn test_sanitize_inline_backticks() {
        assert_eq!(
            sanitize_sql_response("`SELECT * FROM t`"),
            "SELECT * FROM t"
        );
        assert_eq!(
            sanitize_sql_response("SELECT `name` FROM t"),
            "SELECT name FROM t"
        );
    }

    #[test]
    fn test_sanitize_plain_sql_untouched() {
        let input = "  SELECT * FROM \"people\" WHERE \"age\" > 30  ";
        assert_eq!(
            sanitize_sql_response(input),
            "SELECT * FROM \"people\" WHERE \"age\" > 30"
        );
    }

    #[test]
    fn test_sanitize_over_trim_falls_back_to_raw() {
        assert_eq!(sanitize_sql_response("```sql```"), "sql");
        assert_eq!(sanitize_sql_response("```"), "");
        assert_eq!(sanitize_sql_response(""), "");
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(raw in ".*") {
            let once = sanitize_sql_response(&raw);
            prop_assert_eq!(sanitize_sql_response(&once), once);
        }

        #[test]
        fn prop_sanitize_never_edges_with_backtick(raw in "[`a-zA-Z *\n]{0,40}") {
            let out = sanitize_sql_response(&raw);
            prop_assert!(!out.starts_with('`'));
            prop_assert!(!out.ends_with('`'));
        }

        #[test]
        fn prop_sanitize_fenced_statement(body in "[A-Z][A-Za-z0-9 *=\"']{0,30}[A-Za-z0-9*\"']") {
            let raw = format!("```sql\n{}\n```", body);
            prop_assert_eq!(sanitize_sql_response(&raw), body.trim().to_string());
        }
    }
}
