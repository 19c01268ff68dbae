//! 备用名称 (SAN) 解析
//! 语法与主题模板一致: `DNS=[a.example.com,b.example.com];IP=[10.0.0.1]`

use std::fmt;
use std::net::IpAddr;

use crate::clause::{format_clause, parse_clauses};
use crate::error::ConfigError;

/// 备用名称类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SanType {
    Dns,
    Ip,
    Email,
    Uri,
}

impl SanType {
    /// 从类型名解析，忽略大小写与空格
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "DNS" | "DNSNAME" => Ok(SanType::Dns),
            "IP" | "IPADDRESS" => Ok(SanType::Ip),
            "EMAIL" | "RFC822NAME" => Ok(SanType::Email),
            "URI" => Ok(SanType::Uri),
            _ => Err(ConfigError::UnknownSanType(name.trim().to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SanType::Dns => "DNS",
            SanType::Ip => "IP",
            SanType::Email => "EMAIL",
            SanType::Uri => "URI",
        }
    }

    fn validate(&self, value: &str) -> Result<(), ConfigError> {
        match self {
            SanType::Ip if value.trim().parse::<IpAddr>().is_err() => {
                Err(ConfigError::InvalidSanValue {
                    kind: self.name(),
                    value: value.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// 解析后的备用名称，保持输入顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanSpec {
    entries: Vec<(SanType, Vec<String>)>,
}

impl SanSpec {
    pub fn entries(&self) -> &[(SanType, Vec<String>)] {
        &self.entries
    }

    /// 逐个展开 (类型, 值)
    pub fn names(&self) -> impl Iterator<Item = (SanType, &str)> {
        self.entries
            .iter()
            .flat_map(|(kind, values)| values.iter().map(move |v| (*kind, v.as_str())))
    }
}

impl fmt::Display for SanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self
            .entries
            .iter()
            .map(|(kind, values)| format_clause(kind.name(), values))
            .collect();
        f.write_str(&clauses.join(";"))
    }
}

/// 解析备用名称；输入为空时返回 `None`
pub fn parse(spec: Option<&str>) -> Result<Option<SanSpec>, ConfigError> {
    let spec = match spec {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(None),
    };

    let mut entries = Vec::new();
    for clause in parse_clauses(spec)? {
        let kind = SanType::from_name(&clause.key)?;
        for value in &clause.values {
            kind.validate(value)?;
        }
        entries.push((kind, clause.values));
    }

    if entries.is_empty() {
        return Ok(None);
    }
    Ok(Some(SanSpec { entries }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_or_blank() {
        assert_eq!(parse(None), Ok(None));
        assert_eq!(parse(Some("")), Ok(None));
        assert_eq!(parse(Some("   ")), Ok(None));
    }

    #[test]
    fn test_parse_dns_and_ip() {
        let spec = parse(Some("DNS=[a.example.com,b.example.com];IP Address=[10.0.0.1,::1]"))
            .unwrap()
            .unwrap();
        let names: Vec<(SanType, &str)> = spec.names().collect();
        assert_eq!(
            names,
            vec![
                (SanType::Dns, "a.example.com"),
                (SanType::Dns, "b.example.com"),
                (SanType::Ip, "10.0.0.1"),
                (SanType::Ip, "::1"),
            ]
        );
    }

    #[test]
    fn test_type_aliases() {
        assert_eq!(SanType::from_name("dnsName"), Ok(SanType::Dns));
        assert_eq!(SanType::from_name("iPAddress"), Ok(SanType::Ip));
        assert_eq!(SanType::from_name("rfc822Name"), Ok(SanType::Email));
        assert_eq!(SanType::from_name(" uri "), Ok(SanType::Uri));
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            parse(Some("DNS=[a.com];X400=[foo]")),
            Err(ConfigError::UnknownSanType("X400".into()))
        );
    }

    #[test]
    fn test_invalid_ip() {
        assert!(matches!(
            parse(Some("IP=[999.1.1.1]")),
            Err(ConfigError::InvalidSanValue { kind: "IP", .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let text = r"DNS=[a.com];EMAIL=[x\,y@example.com]";
        let spec = parse(Some(text)).unwrap().unwrap();
        assert_eq!(spec.to_string(), text);
        assert_eq!(parse(Some(&spec.to_string())).unwrap().unwrap(), spec);
    }
}
