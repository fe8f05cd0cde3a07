// Undo the JavaScript string escaping applied to streamed page payloads

/// Reverses one level of JavaScript string escaping.
///
/// Only `\\` and `\"` are rewritten. A single left-to-right pass consumes each
/// escape pair as a unit, so an escaped backslash is never mistaken for the
/// start of an escaped quote (`\\\"` becomes `\"`). Any other backslash
/// sequence, such as `\n` or `\u00e9`, is passed through untouched for the
/// JSON parser to deal with.
pub fn normalize(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next) if next == '\\' || next == '"' => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(normalize("chartData"), "chartData");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_unescapes_quotes() {
        assert_eq!(normalize(r#"{\"a\":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_escaped_backslash_before_escaped_quote() {
        // \\\" is an escaped backslash followed by an escaped quote
        assert_eq!(normalize(r#"\\\""#), r#"\""#);
        // \\" is an escaped backslash followed by a bare quote
        assert_eq!(normalize(r#"\\""#), r#"\""#);
    }

    #[test]
    fn test_other_escapes_pass_through() {
        assert_eq!(normalize(r"line\nbreak"), r"line\nbreak");
        assert_eq!(normalize(r"caf\u00e9"), r"caf\u00e9");
        assert_eq!(normalize("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_round_trip_with_backslashes_and_quotes() {
        let samples = [
            r#"{"name":"Promenade \"des Anglais\""}"#,
            r#"C:\path\"quoted\"\\share"#,
            r#"\"\\\""#,
            r#"{"path":"a\\b","q":"\""}"#,
            "no escapes at all",
        ];
        for original in samples {
            assert_eq!(normalize(&escape(original)), original, "round trip of {original:?}");
        }
    }
}
