//! `Key=[v1,v2];Key2=[...]` 子句语法
//! 主题模板与备用名称共用，`\,` `\;` `\\` `\[` `\]` 为转义字符

use crate::error::ConfigError;

const ESCAPE: char = '\\';
const ESCAPABLE: [char; 5] = [',', ';', '\\', '[', ']'];

/// 一个子句: 键与有序值列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Clause {
    pub key: String,
    pub values: Vec<String>,
}

/// 解析全部子句，空白子句被忽略
pub(crate) fn parse_clauses(input: &str) -> Result<Vec<Clause>, ConfigError> {
    split_unescaped(input, ';')
        .into_iter()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_clause)
        .collect()
}

fn parse_clause(raw: &str) -> Result<Clause, ConfigError> {
    let malformed = || ConfigError::MalformedClause(raw.trim().to_string());

    let (key, body) = raw.split_once('=').ok_or_else(malformed)?;
    let key = key.trim();
    let body = body
        .trim()
        .strip_prefix('[')
        .ok_or_else(malformed)?;
    if key.is_empty() {
        return Err(malformed());
    }

    let inner = strip_closing_bracket(body).ok_or_else(malformed)?;

    let values = split_unescaped(inner, ',')
        .into_iter()
        .map(|value| {
            if value.is_empty() {
                Err(ConfigError::EmptyValue(key.to_string()))
            } else {
                Ok(unescape(value))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Clause {
        key: key.to_string(),
        values,
    })
}

/// 返回第一个未转义 `]` 之前的内容；其后只允许空白
fn strip_closing_bracket(body: &str) -> Option<&str> {
    let mut escaped = false;
    for (idx, ch) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if ch == ']' {
            let rest = &body[idx + ch.len_utf8()..];
            return rest.trim().is_empty().then_some(&body[..idx]);
        }
    }
    None
}

/// 按未转义的分隔符切分，保留转义序列原样
fn split_unescaped(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == ESCAPE {
            escaped = true;
        } else if ch == separator {
            parts.push(&input[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            (ESCAPE, Some(next)) if ESCAPABLE.contains(next) => {
                out.push(*next);
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    out
}

/// 将值重新转义，使其可以放回子句文本
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ESCAPABLE.contains(&ch) {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out
}

/// 将键与值列表格式化为子句文本
pub(crate) fn format_clause(key: &str, values: &[String]) -> String {
    let values: Vec<String> = values.iter().map(|v| escape(v)).collect();
    format!("{}=[{}]", key, values.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_clause() {
        let clauses = parse_clauses("CN=[YDL0001]").unwrap();
        assert_eq!(
            clauses,
            vec![Clause {
                key: "CN".into(),
                values: vec!["YDL0001".into()]
            }]
        );
    }

    #[test]
    fn test_escaped_comma_is_literal() {
        let clauses = parse_clauses(r"O=[TrustAsia Technologies\, Inc.]").unwrap();
        assert_eq!(clauses[0].values, vec!["TrustAsia Technologies, Inc."]);
    }

    #[test]
    fn test_multiple_clauses_and_values() {
        let clauses = parse_clauses(" CN = [a];OU=[x,y\\;z, w]; ").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].key, "CN");
        assert_eq!(clauses[1].values, vec!["x", "y;z", " w"]);
    }

    #[test]
    fn test_unknown_escape_kept() {
        let clauses = parse_clauses(r"O=[a\b]").unwrap();
        assert_eq!(clauses[0].values, vec![r"a\b"]);
    }

    #[test]
    fn test_escaped_bracket() {
        let clauses = parse_clauses(r"O=[a\]b]").unwrap();
        assert_eq!(clauses[0].values, vec!["a]b"]);
    }

    #[test]
    fn test_malformed_clauses() {
        for input in ["CN", "CN=YDL", "CN=[YDL", "=[x]", "CN=[a]b"] {
            assert!(
                matches!(parse_clauses(input), Err(ConfigError::MalformedClause(_))),
                "{input} 应当解析失败"
            );
        }
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(
            parse_clauses("OU=[a,,b]"),
            Err(ConfigError::EmptyValue("OU".into()))
        );
        assert_eq!(
            parse_clauses("OU=[]"),
            Err(ConfigError::EmptyValue("OU".into()))
        );
    }

    #[test]
    fn test_escape_round_trip() {
        let values = vec!["a,b".to_string(), r"c\d;[e]".to_string()];
        let text = format_clause("O", &values);
        let clauses = parse_clauses(&text).unwrap();
        assert_eq!(clauses[0].values, values);
    }

    #[test]
    fn test_blank_input() {
        assert!(parse_clauses("  ; ;").unwrap().is_empty());
    }
}
