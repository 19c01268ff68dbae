//! 错误类型
//! 分为配置错误、密码学错误、编码错误三类

use std::fmt;

use openssl::error::ErrorStack;
use thiserror::Error;

/// 配置错误：在生成开始前的预校验阶段检出，不产生任何副作用
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 通用名称范围格式错误
    #[error("无法解析通用名称范围 `{0}`，正确格式示例: YDL0001-YDL0010")]
    MalformedRange(String),

    /// 起止前缀不一致
    #[error("通用名称范围的起止前缀不一致: `{start}` 与 `{end}`")]
    PrefixMismatch { start: String, end: String },

    /// 结束值小于起始值
    #[error("通用名称范围结束值 {end} 小于起始值 {start}")]
    ReversedRange { start: u64, end: u64 },

    /// 范围包含的名称数量超过上限
    #[error("通用名称范围 `{range}` 超过单批上限 {max} 个")]
    RangeTooLarge { range: String, max: usize },

    /// 主题模板为空
    #[error("Subject主题模板为空")]
    EmptySubject,

    /// 子句不符合 `Key=[...]` 格式
    #[error("无法解析子句 `{0}`，正确格式示例: CN=[{{CN}}]")]
    MalformedClause(String),

    /// 子句中出现空值
    #[error("`{0}` 包含空值")]
    EmptyValue(String),

    /// 未知的主题属性类型
    #[error("未知的主题属性类型: {0}")]
    UnknownAttributeType(String),

    /// 未知的备用名称类型
    #[error("未知的备用名称类型: {0}")]
    UnknownSanType(String),

    /// 备用名称的值无效
    #[error("备用名称 {kind} 的值无效: {value}")]
    InvalidSanValue { kind: &'static str, value: String },

    /// 时间格式错误
    #[error("{field} 不是合法的ISO8601时间: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// 有效期开始时间晚于结束时间
    #[error("有效期开始时间 {not_before} 晚于结束时间 {not_after}")]
    InvalidValidity { not_before: String, not_after: String },

    /// 不支持的密钥类型
    #[error("不支持的密钥类型: {0}")]
    UnsupportedKeyType(String),

    /// 不支持的签名哈希算法
    #[error("不支持的签名哈希算法: {0}")]
    UnsupportedHashAlgorithm(String),

    /// 当前OpenSSL运行时不支持该组合
    #[error("当前环境不支持 {key_type} + {hash}")]
    UnsupportedCombination { key_type: String, hash: String },
}

/// 密码学错误
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("生成密钥对失败: {0}")]
    KeyGenerationFailure(#[source] ErrorStack),

    #[error("CSR签名失败: {0}")]
    SigningFailure(#[source] ErrorStack),
}

/// 编码错误 (ASN.1 / PEM / CSV)
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("ASN.1编码失败: {0}")]
    Asn1(#[source] ErrorStack),

    /// 主题属性值无法编码为X509名称
    #[error("Subject编码失败: {0}")]
    Subject(#[source] ErrorStack),

    /// 私钥无法输出为PKCS#8 PEM
    #[error("私钥PEM编码失败: {0}")]
    PrivateKey(#[source] ErrorStack),

    #[error("PEM输出不是合法的UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("CSV序列化失败: {0}")]
    Csv(#[from] csv::Error),
}

/// 批量生成过程中的统一错误类型
#[derive(Debug, Error)]
pub enum CsrError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// 出错的输入字段，名称与CSV列名一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CnRange,
    Subject,
    SignHashAlg,
    NotBefore,
    NotAfter,
    Sans,
    Csr,
    KeyPairType,
    PrivateKey,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::CnRange => "cnRange",
            Field::Subject => "subject",
            Field::SignHashAlg => "signHashAlg",
            Field::NotBefore => "notBefore",
            Field::NotAfter => "notAfter",
            Field::Sans => "sans",
            Field::Csr => "csr",
            Field::KeyPairType => "keyPairType",
            Field::PrivateKey => "privateKey",
        };
        f.write_str(name)
    }
}

/// 批量失败的详细信息
#[derive(Debug, Error)]
#[error("{field} 错误{}: {error} (已完成 {completed} 个)", cn_suffix(.cn))]
pub struct ErrorDetail {
    /// 具体错误
    #[source]
    pub error: CsrError,
    /// 出错的通用名称，预校验阶段的错误可能没有
    pub cn: Option<String>,
    /// 出错的字段
    pub field: Field,
    /// 出错前已成功生成的数量
    pub completed: usize,
}

fn cn_suffix(cn: &Option<String>) -> String {
    cn.as_ref().map(|cn| format!(" [{cn}]")).unwrap_or_default()
}

impl ErrorDetail {
    pub(crate) fn config(error: ConfigError, field: Field) -> Self {
        Self {
            error: CsrError::Config(error),
            cn: None,
            field,
            completed: 0,
        }
    }
}

impl CsrError {
    /// 根据错误类型推断出错字段
    pub(crate) fn field(&self) -> Field {
        match self {
            CsrError::Crypto(CryptoError::KeyGenerationFailure(_))
            | CsrError::Config(ConfigError::UnsupportedKeyType(_)) => Field::KeyPairType,
            CsrError::Crypto(CryptoError::SigningFailure(_)) => Field::SignHashAlg,
            CsrError::Config(ConfigError::UnknownAttributeType(_))
            | CsrError::Config(ConfigError::EmptySubject)
            | CsrError::Config(ConfigError::EmptyValue(_))
            | CsrError::Config(ConfigError::MalformedClause(_))
            | CsrError::Encoding(EncodingError::Subject(_)) => Field::Subject,
            CsrError::Encoding(EncodingError::PrivateKey(_)) => Field::PrivateKey,
            CsrError::Config(_) | CsrError::Encoding(_) => Field::Csr,
        }
    }
}
