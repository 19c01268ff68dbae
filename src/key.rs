//! 密钥类型、签名哈希算法与密钥对生成

use std::fmt;
use std::str::FromStr;

use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;

use crate::error::{ConfigError, CryptoError, EncodingError};

/// 椭圆曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    pub fn nid(&self) -> Nid {
        match self {
            EcCurve::P256 => Nid::X9_62_PRIME256V1,
            EcCurve::P384 => Nid::SECP384R1,
            EcCurve::P521 => Nid::SECP521R1,
        }
    }

    /// 曲线阶的位数
    pub fn bits(&self) -> u32 {
        match self {
            EcCurve::P256 => 256,
            EcCurve::P384 => 384,
            EcCurve::P521 => 521,
        }
    }
}

/// 密钥类型: RSA_2048/3072/4096, EC_P256/384/521
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySpec {
    Rsa { bits: u32 },
    Ec { curve: EcCurve },
}

impl KeySpec {
    pub const RSA_2048: KeySpec = KeySpec::Rsa { bits: 2048 };
    pub const RSA_3072: KeySpec = KeySpec::Rsa { bits: 3072 };
    pub const RSA_4096: KeySpec = KeySpec::Rsa { bits: 4096 };
    pub const EC_P256: KeySpec = KeySpec::Ec { curve: EcCurve::P256 };
    pub const EC_P384: KeySpec = KeySpec::Ec { curve: EcCurve::P384 };
    pub const EC_P521: KeySpec = KeySpec::Ec { curve: EcCurve::P521 };

    /// 全部支持的密钥类型
    pub const ALL: [KeySpec; 6] = [
        KeySpec::RSA_2048,
        KeySpec::RSA_3072,
        KeySpec::RSA_4096,
        KeySpec::EC_P256,
        KeySpec::EC_P384,
        KeySpec::EC_P521,
    ];

    /// 获取显示名称 (写入CSV的 keyPairType 列)
    pub fn display_name(&self) -> &'static str {
        match self {
            KeySpec::Rsa { bits: 2048 } => "RSA_2048",
            KeySpec::Rsa { bits: 3072 } => "RSA_3072",
            KeySpec::Rsa { bits: 4096 } => "RSA_4096",
            KeySpec::Rsa { .. } => "RSA",
            KeySpec::Ec { curve: EcCurve::P256 } => "EC_P-256",
            KeySpec::Ec { curve: EcCurve::P384 } => "EC_P-384",
            KeySpec::Ec { curve: EcCurve::P521 } => "EC_P-521",
        }
    }

    /// 检查当前OpenSSL运行时是否支持该密钥类型，不生成密钥
    pub fn check_runtime(&self) -> bool {
        match self {
            KeySpec::Rsa { bits } => matches!(bits, 2048 | 3072 | 4096),
            KeySpec::Ec { curve } => EcGroup::from_curve_name(curve.nid()).is_ok(),
        }
    }
}

impl FromStr for KeySpec {
    type Err = ConfigError;

    /// 从字符串解析密钥类型
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RSA_2048" => Ok(KeySpec::RSA_2048),
            "RSA_3072" => Ok(KeySpec::RSA_3072),
            "RSA_4096" => Ok(KeySpec::RSA_4096),
            "EC_P256" | "EC_P-256" => Ok(KeySpec::EC_P256),
            "EC_P384" | "EC_P-384" => Ok(KeySpec::EC_P384),
            "EC_P521" | "EC_P-521" => Ok(KeySpec::EC_P521),
            _ => Err(ConfigError::UnsupportedKeyType(s.to_string())),
        }
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 签名哈希算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureHashSpec {
    Sha256,
    Sha384,
    Sha512,
    Sha1,
    /// 与签发者一致；生成CSR时无法确定，仅作为标记记录，实际使用SHA256签名
    MatchIssuer,
}

impl SignatureHashSpec {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureHashSpec::Sha256 => "SHA256",
            SignatureHashSpec::Sha384 => "SHA384",
            SignatureHashSpec::Sha512 => "SHA512",
            SignatureHashSpec::Sha1 => "SHA1",
            SignatureHashSpec::MatchIssuer => "MatchIssuer",
        }
    }

    /// 实际用于CSR自签名的摘要算法
    pub fn digest(&self) -> MessageDigest {
        match self {
            SignatureHashSpec::Sha384 => MessageDigest::sha384(),
            SignatureHashSpec::Sha512 => MessageDigest::sha512(),
            SignatureHashSpec::Sha1 => MessageDigest::sha1(),
            SignatureHashSpec::Sha256 | SignatureHashSpec::MatchIssuer => MessageDigest::sha256(),
        }
    }

    /// 摘要算法在当前运行时中是否可用
    pub fn check_runtime(&self) -> bool {
        let name = match self {
            SignatureHashSpec::Sha256 | SignatureHashSpec::MatchIssuer => "SHA256",
            other => other.name(),
        };
        MessageDigest::from_name(name).is_some()
    }
}

impl FromStr for SignatureHashSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SHA256" => Ok(SignatureHashSpec::Sha256),
            "SHA384" => Ok(SignatureHashSpec::Sha384),
            "SHA512" => Ok(SignatureHashSpec::Sha512),
            "SHA1" => Ok(SignatureHashSpec::Sha1),
            "MatchIssuer" => Ok(SignatureHashSpec::MatchIssuer),
            _ => Err(ConfigError::UnsupportedHashAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for SignatureHashSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 新生成的密钥对
pub struct KeyPair {
    spec: KeySpec,
    pkey: PKey<Private>,
}

impl KeyPair {
    pub fn spec(&self) -> KeySpec {
        self.spec
    }

    pub fn pkey(&self) -> &PKey<Private> {
        &self.pkey
    }

    /// 公钥 (SubjectPublicKeyInfo DER)
    pub fn public_key_der(&self) -> Result<Vec<u8>, EncodingError> {
        self.pkey.public_key_to_der().map_err(EncodingError::Asn1)
    }

    /// 私钥PEM (PKCS#8)
    pub fn private_key_pem(&self) -> Result<String, EncodingError> {
        let pem = self
            .pkey
            .private_key_to_pem_pkcs8()
            .map_err(EncodingError::PrivateKey)?;
        Ok(String::from_utf8(pem)?)
    }
}

/// 根据密钥类型生成新的密钥对，每次调用都使用新的随机数
pub fn generate(spec: KeySpec) -> Result<KeyPair, CryptoError> {
    let pkey = match spec {
        KeySpec::Rsa { bits } => {
            let rsa = Rsa::generate(bits).map_err(CryptoError::KeyGenerationFailure)?;
            PKey::from_rsa(rsa)
        }
        KeySpec::Ec { curve } => {
            let group =
                EcGroup::from_curve_name(curve.nid()).map_err(CryptoError::KeyGenerationFailure)?;
            let ec_key = EcKey::generate(&group).map_err(CryptoError::KeyGenerationFailure)?;
            PKey::from_ec_key(ec_key)
        }
    }
    .map_err(CryptoError::KeyGenerationFailure)?;

    Ok(KeyPair { spec, pkey })
}
