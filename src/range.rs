//! 通用名称范围解析
//! 支持格式: PREFIX0001-PREFIX0010 或单个 PREFIX0001

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;

/// 单批通用名称数量上限
pub const MAX_RANGE_LEN: usize = 1_000_000;

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z]*)(\d+)\s*(?:-\s*([A-Za-z]*)(\d+))?\s*$")
        .expect("通用名称范围正则表达式无效")
});

/// 解析后的通用名称范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnRange {
    /// 字母前缀
    pub prefix: String,
    /// 数字部分补零宽度，取自起始值的字面位数
    pub width: usize,
    pub start: u64,
    pub end: u64,
}

impl CnRange {
    /// 解析范围字符串
    pub fn parse(range: &str) -> Result<Self, ConfigError> {
        let caps = RANGE_RE
            .captures(range)
            .ok_or_else(|| ConfigError::MalformedRange(range.to_string()))?;

        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let start_digits = caps
            .get(2)
            .ok_or_else(|| ConfigError::MalformedRange(range.to_string()))?
            .as_str();
        let start = parse_number(start_digits, range)?;

        let end = match (caps.get(3), caps.get(4)) {
            (Some(end_prefix), Some(end_digits)) => {
                let end = parse_number(end_digits.as_str(), range)?;
                if end_prefix.as_str() != prefix {
                    return Err(ConfigError::PrefixMismatch {
                        start: prefix.to_string(),
                        end: end_prefix.as_str().to_string(),
                    });
                }
                end
            }
            _ => start,
        };

        if end < start {
            return Err(ConfigError::ReversedRange { start, end });
        }

        let parsed = Self {
            prefix: prefix.to_string(),
            width: start_digits.len(),
            start,
            end,
        };
        if parsed.len() > MAX_RANGE_LEN {
            return Err(ConfigError::RangeTooLarge {
                range: range.trim().to_string(),
                max: MAX_RANGE_LEN,
            });
        }
        Ok(parsed)
    }

    /// 范围内通用名称数量，超出 `usize` 时饱和
    pub fn len(&self) -> usize {
        usize::try_from(self.end.saturating_sub(self.start))
            .ok()
            .and_then(|span| span.checked_add(1))
            .unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        // start <= end，范围至少包含一个名称
        false
    }

    /// 按升序依次产出通用名称
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        (self.start..=self.end)
            .map(move |i| format!("{}{:0width$}", self.prefix, i, width = self.width))
    }
}

fn parse_number(digits: &str, range: &str) -> Result<u64, ConfigError> {
    digits
        .parse()
        .map_err(|_| ConfigError::MalformedRange(range.to_string()))
}

/// 展开通用名称范围为有序列表
pub fn expand(range: &str) -> Result<Vec<String>, ConfigError> {
    Ok(CnRange::parse(range)?.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_range() {
        let result = expand("YDL0001-YDL0010").unwrap();
        assert_eq!(result.len(), 10);
        assert_eq!(result[0], "YDL0001");
        assert_eq!(result[9], "YDL0010");
        assert!(result.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_expand_single_element_range() {
        assert_eq!(expand("YDL0005-YDL0005").unwrap(), vec!["YDL0005"]);
    }

    #[test]
    fn test_expand_without_dash() {
        assert_eq!(expand(" YDL0042 ").unwrap(), vec!["YDL0042"]);
    }

    #[test]
    fn test_end_padded_to_start_width() {
        let result = expand("A008-A10").unwrap();
        assert_eq!(result, vec!["A008", "A009", "A010"]);
    }

    #[test]
    fn test_end_wider_than_start() {
        let result = expand("A98-A100").unwrap();
        assert_eq!(result, vec!["A98", "A99", "A100"]);
    }

    #[test]
    fn test_reversed_range() {
        assert_eq!(
            expand("YDL0010-YDL0001"),
            Err(ConfigError::ReversedRange { start: 10, end: 1 })
        );
    }

    #[test]
    fn test_prefix_mismatch() {
        assert!(matches!(
            expand("ABC0001-XYZ0009"),
            Err(ConfigError::PrefixMismatch { .. })
        ));
        // 前缀大小写敏感
        assert!(matches!(
            expand("abc1-ABC2"),
            Err(ConfigError::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_range() {
        for input in ["", "YDL", "YDL0001-", "YDL0001-YDL", "YD-L0001", "0001x"] {
            assert!(
                matches!(expand(input), Err(ConfigError::MalformedRange(_))),
                "{input} 应当解析失败"
            );
        }
    }

    #[test]
    fn test_range_too_large() {
        for input in ["A0-A18446744073709551615", "A1-A1000001"] {
            assert!(
                matches!(
                    expand(input),
                    Err(ConfigError::RangeTooLarge { max: MAX_RANGE_LEN, .. })
                ),
                "{input} 应当超过上限"
            );
        }
        assert_eq!(CnRange::parse("A1-A1000000").unwrap().len(), MAX_RANGE_LEN);
    }

    #[test]
    fn test_range_len() {
        let range = CnRange::parse("X1-X25").unwrap();
        assert_eq!(range.len(), 25);
        assert_eq!(range.width, 1);
        assert_eq!(range.iter().last().unwrap(), "X25");
    }
}
