//! Subject主题模板渲染
//! 先将 `{CN}` 替换为通用名称，再按子句语法解析为有序的属性列表

use std::fmt;

use openssl::nid::Nid;

use crate::clause::{format_clause, parse_clauses};
use crate::error::ConfigError;

/// 通用名称占位符
pub const CN_PLACEHOLDER: &str = "{CN}";

/// 主题属性类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    CommonName,
    Country,
    StateOrProvince,
    Locality,
    Street,
    Organization,
    OrganizationalUnit,
    EmailAddress,
    SerialNumber,
    DomainComponent,
    UserId,
    Title,
    GivenName,
    Surname,
    PostalCode,
}

impl AttributeType {
    /// 从模板中的键名解析 (大小写不敏感)
    pub fn from_key(key: &str) -> Result<Self, ConfigError> {
        let attr = match key.to_ascii_uppercase().as_str() {
            "CN" | "COMMONNAME" => AttributeType::CommonName,
            "C" | "COUNTRY" | "COUNTRYNAME" => AttributeType::Country,
            "ST" | "S" | "STATE" | "STATEORPROVINCENAME" => AttributeType::StateOrProvince,
            "L" | "LOCALITY" | "LOCALITYNAME" => AttributeType::Locality,
            "STREET" | "STREETADDRESS" => AttributeType::Street,
            "O" | "ORGANIZATION" | "ORGANIZATIONNAME" => AttributeType::Organization,
            "OU" | "ORGANIZATIONALUNIT" | "ORGANIZATIONALUNITNAME" => {
                AttributeType::OrganizationalUnit
            }
            "E" | "EMAIL" | "EMAILADDRESS" => AttributeType::EmailAddress,
            "SERIALNUMBER" => AttributeType::SerialNumber,
            "DC" | "DOMAINCOMPONENT" => AttributeType::DomainComponent,
            "UID" | "USERID" => AttributeType::UserId,
            "T" | "TITLE" => AttributeType::Title,
            "GN" | "GIVENNAME" => AttributeType::GivenName,
            "SN" | "SURNAME" => AttributeType::Surname,
            "POSTALCODE" => AttributeType::PostalCode,
            _ => return Err(ConfigError::UnknownAttributeType(key.to_string())),
        };
        Ok(attr)
    }

    /// DN字符串中使用的短名称
    pub fn short_name(&self) -> &'static str {
        match self {
            AttributeType::CommonName => "CN",
            AttributeType::Country => "C",
            AttributeType::StateOrProvince => "ST",
            AttributeType::Locality => "L",
            AttributeType::Street => "STREET",
            AttributeType::Organization => "O",
            AttributeType::OrganizationalUnit => "OU",
            AttributeType::EmailAddress => "emailAddress",
            AttributeType::SerialNumber => "serialNumber",
            AttributeType::DomainComponent => "DC",
            AttributeType::UserId => "UID",
            AttributeType::Title => "title",
            AttributeType::GivenName => "GN",
            AttributeType::Surname => "SN",
            AttributeType::PostalCode => "postalCode",
        }
    }

    /// 对应的OpenSSL对象标识
    pub fn nid(&self) -> Nid {
        match self {
            AttributeType::CommonName => Nid::COMMONNAME,
            AttributeType::Country => Nid::COUNTRYNAME,
            AttributeType::StateOrProvince => Nid::STATEORPROVINCENAME,
            AttributeType::Locality => Nid::LOCALITYNAME,
            AttributeType::Street => Nid::STREETADDRESS,
            AttributeType::Organization => Nid::ORGANIZATIONNAME,
            AttributeType::OrganizationalUnit => Nid::ORGANIZATIONALUNITNAME,
            AttributeType::EmailAddress => Nid::PKCS9_EMAILADDRESS,
            AttributeType::SerialNumber => Nid::SERIALNUMBER,
            AttributeType::DomainComponent => Nid::DOMAINCOMPONENT,
            AttributeType::UserId => Nid::USERID,
            AttributeType::Title => Nid::TITLE,
            AttributeType::GivenName => Nid::GIVENNAME,
            AttributeType::Surname => Nid::SURNAME,
            AttributeType::PostalCode => Nid::POSTALCODE,
        }
    }
}

/// 渲染后的主题: 属性顺序即CSR中RDN的顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSubject {
    attributes: Vec<(AttributeType, Vec<String>)>,
}

impl RenderedSubject {
    pub fn attributes(&self) -> &[(AttributeType, Vec<String>)] {
        &self.attributes
    }

    /// 逐个RDN展开 (多值属性每个值对应一个RDN)
    pub fn entries(&self) -> impl Iterator<Item = (AttributeType, &str)> {
        self.attributes
            .iter()
            .flat_map(|(attr, values)| values.iter().map(move |v| (*attr, v.as_str())))
    }

    /// 第一个CN值
    pub fn common_name(&self) -> Option<&str> {
        self.entries()
            .find(|(attr, _)| *attr == AttributeType::CommonName)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for RenderedSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self
            .attributes
            .iter()
            .map(|(attr, values)| format_clause(attr.short_name(), values))
            .collect();
        f.write_str(&clauses.join(";"))
    }
}

/// 替换模板中的 `{CN}` 占位符
pub fn substitute(template: &str, cn: &str) -> String {
    template.replace(CN_PLACEHOLDER, cn)
}

/// 渲染主题模板
pub fn render(template: &str, cn: &str) -> Result<RenderedSubject, ConfigError> {
    let text = substitute(template, cn);
    let clauses = parse_clauses(&text)?;
    if clauses.is_empty() {
        return Err(ConfigError::EmptySubject);
    }

    let attributes = clauses
        .into_iter()
        .map(|clause| Ok((AttributeType::from_key(&clause.key)?, clause.values)))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(RenderedSubject { attributes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_cn_only() {
        let subject = render("CN=[{CN}]", "YDL0001").unwrap();
        assert_eq!(
            subject.attributes(),
            &[(AttributeType::CommonName, vec!["YDL0001".to_string()])]
        );
        assert_eq!(subject.common_name(), Some("YDL0001"));
    }

    #[test]
    fn test_render_preserves_clause_order() {
        let template = r"OU=[Ops,{CN}-team];CN=[{CN}];O=[TrustAsia Technologies\, Inc.];C=[CN]";
        let subject = render(template, "YDL0002").unwrap();
        let order: Vec<AttributeType> = subject.attributes().iter().map(|(a, _)| *a).collect();
        assert_eq!(
            order,
            vec![
                AttributeType::OrganizationalUnit,
                AttributeType::CommonName,
                AttributeType::Organization,
                AttributeType::Country,
            ]
        );
        let entries: Vec<(AttributeType, &str)> = subject.entries().collect();
        assert_eq!(entries[0], (AttributeType::OrganizationalUnit, "Ops"));
        assert_eq!(entries[1], (AttributeType::OrganizationalUnit, "YDL0002-team"));
        assert_eq!(
            entries[3],
            (AttributeType::Organization, "TrustAsia Technologies, Inc.")
        );
    }

    #[test]
    fn test_keys_are_trimmed_and_case_insensitive() {
        let subject = render(" cn =[{CN}]; emailAddress=[a@b.c]", "X1").unwrap();
        assert_eq!(subject.attributes()[0].0, AttributeType::CommonName);
        assert_eq!(subject.attributes()[1].0, AttributeType::EmailAddress);
    }

    #[test]
    fn test_only_cn_placeholder_substituted() {
        let subject = render("CN=[{CN}];OU=[{cn}]", "X1").unwrap();
        assert_eq!(subject.attributes()[1].1, vec!["{cn}"]);
    }

    #[test]
    fn test_unknown_attribute() {
        assert_eq!(
            render("CN=[{CN}];FOO=[bar]", "X1"),
            Err(ConfigError::UnknownAttributeType("FOO".into()))
        );
    }

    #[test]
    fn test_empty_subject() {
        assert_eq!(render("", "X1"), Err(ConfigError::EmptySubject));
        assert_eq!(render(" ; ", "X1"), Err(ConfigError::EmptySubject));
    }

    #[test]
    fn test_display_escapes_values() {
        let subject = render(r"CN=[{CN}];O=[A\, B]", "X1").unwrap();
        assert_eq!(subject.to_string(), r"CN=[X1];O=[A\, B]");
    }
}
