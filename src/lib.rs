//! 批量CSR生成器
//! 功能：根据通用名称范围批量生成密钥对与CSR，输出结构化记录，可序列化为CSV
//! 支持多种密钥类型：RSA_2048/3072/4096, EC_P-256/384/521
//!
//! ```no_run
//! use batch_csr_generator_lib::{
//!     generate_csr_batch, BatchOptions, CancelToken, GenerateParams, RecordSerializer,
//! };
//!
//! let params = GenerateParams {
//!     cn_range: "YDL0001-YDL0010".into(),
//!     subject_template: r"CN=[{CN}];O=[TrustAsia Technologies\, Inc.]".into(),
//!     key_type: "EC_P256".into(),
//!     sign_hash_alg: "SHA256".into(),
//!     not_before: "2025-01-01T00:00:00+08:00".into(),
//!     not_after: "2026-01-01T00:00:00+08:00".into(),
//!     ..Default::default()
//! };
//! let options = BatchOptions::default();
//! let result = generate_csr_batch(&params, &options, |done, total| {
//!     println!("{done}/{total}");
//! }, &CancelToken::new());
//! if result.success() {
//!     let csv = RecordSerializer::new(options.layout).serialize(&result.records)?;
//!     println!("{csv}");
//! }
//! # Ok::<(), batch_csr_generator_lib::error::EncodingError>(())
//! ```

pub mod batch;
mod clause;
pub mod config;
pub mod csr;
pub mod error;
pub mod key;
pub mod range;
pub mod record;
pub mod san;
pub mod subject;

use serde::Serialize;

pub use batch::{
    BatchOrchestrator, BatchOutcome, BatchPlan, BatchResult, CancelToken, CsrRecord,
    ValidityWindow,
};
pub use config::{AppConfig, BatchOptions, GenerateParams};
pub use error::{ConfigError, CryptoError, CsrError, EncodingError, ErrorDetail};
pub use key::{EcCurve, KeySpec, SignatureHashSpec};
pub use record::{ColumnLayout, CsvRow, RecordSerializer};

/// 生成结果结构体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    /// 是否成功
    pub success: bool,
    /// 消息
    pub message: String,
    /// 生成的CSR总数
    pub total: usize,
    /// 输出文件路径
    pub output_path: Option<String>,
}

impl GenerateResult {
    /// 根据批量结果生成完成摘要
    pub fn from_batch(result: &BatchResult, output_path: Option<String>) -> Self {
        let message = match &result.outcome {
            BatchOutcome::Completed => format!("成功生成 {} 个CSR", result.records.len()),
            BatchOutcome::Cancelled { completed } => {
                format!("已取消，完成 {}/{} 个", completed, result.total)
            }
            BatchOutcome::Failed(detail) => format!("生成失败: {detail}"),
        };
        Self {
            success: result.success(),
            message,
            total: result.records.len(),
            output_path: output_path.filter(|_| result.success()),
        }
    }
}

/// 批量生成CSR
pub fn generate_csr_batch<F>(
    params: &GenerateParams,
    options: &BatchOptions,
    progress: F,
    cancel: &CancelToken,
) -> BatchResult
where
    F: Fn(usize, usize) + Sync,
{
    BatchOrchestrator::new(options.clone()).run(params, progress, cancel)
}
