//! 生成参数与配置文件
//! 配置文件支持 TOML 与 JSON，按扩展名选择

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::record::ColumnLayout;

/// 生成参数结构体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateParams {
    /// 通用名称范围，格式如: YDL0001-YDL0010
    #[serde(alias = "cnRange")]
    pub cn_range: String,
    /// Subject主题模板，使用{CN}作为占位符
    #[serde(alias = "subjectTemplate")]
    pub subject_template: String,
    /// 密钥类型: RSA_2048, RSA_3072, RSA_4096, EC_P256, EC_P384, EC_P521
    #[serde(alias = "keyType")]
    pub key_type: String,
    /// 签名哈希算法: SHA256, SHA384, SHA512, SHA1, MatchIssuer
    #[serde(alias = "signHashAlg")]
    pub sign_hash_alg: String,
    /// 有效期开始时间 (ISO8601格式)
    #[serde(alias = "notBefore")]
    pub not_before: String,
    /// 有效期结束时间 (ISO8601格式)
    #[serde(alias = "notAfter")]
    pub not_after: String,
    /// 唯一ID (可选)
    #[serde(alias = "uniqueId")]
    pub unique_id: Option<String>,
    /// 备用名称 (可选)
    pub sans: Option<String>,
    /// 输出文件路径
    #[serde(alias = "outputPath")]
    pub output_path: Option<PathBuf>,
}

/// 批量执行选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// 并发生成的线程数，1 表示顺序生成
    pub workers: usize,
    /// CSV列布局
    pub layout: ColumnLayout,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            layout: ColumnLayout::Full,
        }
    }
}

/// 配置文件
///
/// ```toml
/// [batch]
/// cn_range = "YDL0001-YDL0010"
/// subject_template = "CN=[{CN}];O=[TrustAsia Technologies\\, Inc.]"
/// key_type = "EC_P256"
/// sign_hash_alg = "SHA256"
/// not_before = "2025-01-01T00:00:00+08:00"
/// not_after = "2026-01-01T00:00:00+08:00"
///
/// [options]
/// workers = 4
/// layout = "full"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub batch: GenerateParams,
    pub options: BatchOptions,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("无法解析TOML配置: {}", path.display())),
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("无法解析JSON配置: {}", path.display())),
            _ => bail!("不支持的配置文件格式: {}", path.display()),
        }
    }
}
