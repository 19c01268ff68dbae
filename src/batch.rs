//! 批量生成调度
//! 预校验全部输入后，按通用名称顺序逐个生成密钥对与CSR，任一失败即终止整批

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, FixedOffset, SecondsFormat};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{BatchOptions, GenerateParams};
use crate::csr::{self, CsrBuilder};
use crate::error::{ConfigError, CsrError, ErrorDetail, Field};
use crate::key::{KeySpec, SignatureHashSpec};
use crate::range::CnRange;
use crate::san::{self, SanSpec};
use crate::subject::{self, RenderedSubject};

/// 取消标记，可在其他线程中调用 `cancel()`
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub not_before: DateTime<FixedOffset>,
    pub not_after: DateTime<FixedOffset>,
}

impl ValidityWindow {
    /// 解析ISO8601时间并检查 notBefore <= notAfter
    pub fn parse(not_before: &str, not_after: &str) -> Result<Self, ConfigError> {
        let not_before_at = parse_timestamp("notBefore", not_before)?;
        let not_after_at = parse_timestamp("notAfter", not_after)?;
        if not_before_at > not_after_at {
            return Err(ConfigError::InvalidValidity {
                not_before: not_before.trim().to_string(),
                not_after: not_after.trim().to_string(),
            });
        }
        Ok(Self {
            not_before: not_before_at,
            not_after: not_after_at,
        })
    }
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<FixedOffset>, ConfigError> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|_| ConfigError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}

fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// 单个CSR生成结果，创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrRecord {
    cn: String,
    subject: String,
    sign_hash_alg: SignatureHashSpec,
    validity: ValidityWindow,
    unique_id: Option<String>,
    sans: Option<SanSpec>,
    csr_pem: String,
    key_pair_type: KeySpec,
    private_key_pem: String,
}

impl CsrRecord {
    /// 通用名称
    pub fn cn(&self) -> &str {
        &self.cn
    }

    /// 完整Subject (已替换 `{CN}` 的模板文本)
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// 用户选择的签名哈希算法 (MatchIssuer 原样保留)
    pub fn sign_hash_alg(&self) -> SignatureHashSpec {
        self.sign_hash_alg
    }

    pub fn validity(&self) -> &ValidityWindow {
        &self.validity
    }

    pub fn not_before(&self) -> String {
        format_timestamp(&self.validity.not_before)
    }

    pub fn not_after(&self) -> String {
        format_timestamp(&self.validity.not_after)
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    pub fn sans(&self) -> Option<&SanSpec> {
        self.sans.as_ref()
    }

    pub fn csr_pem(&self) -> &str {
        &self.csr_pem
    }

    pub fn key_pair_type(&self) -> KeySpec {
        self.key_pair_type
    }

    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }
}

/// 批量生成的最终状态
#[derive(Debug)]
pub enum BatchOutcome {
    /// 全部生成成功
    Completed,
    /// 被取消，`completed` 为取消前已完成的数量
    Cancelled { completed: usize },
    /// 失败，整批结果作废
    Failed(ErrorDetail),
}

/// 批量生成结果
#[derive(Debug)]
pub struct BatchResult {
    /// 按通用名称顺序排列的记录；仅在成功时非空
    pub records: Vec<CsrRecord>,
    /// 计划生成的总数，预校验失败时为0
    pub total: usize,
    pub outcome: BatchOutcome,
}

impl BatchResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Cancelled { .. })
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        match &self.outcome {
            BatchOutcome::Failed(detail) => Some(detail),
            _ => None,
        }
    }

    fn failed(total: usize, detail: ErrorDetail) -> Self {
        Self {
            records: Vec::new(),
            total,
            outcome: BatchOutcome::Failed(detail),
        }
    }

    fn cancelled(total: usize, completed: usize) -> Self {
        Self {
            records: Vec::new(),
            total,
            outcome: BatchOutcome::Cancelled { completed },
        }
    }
}

/// 预校验通过的单个生成任务
#[derive(Debug, Clone)]
struct PlannedItem {
    cn: String,
    subject_text: String,
    subject: RenderedSubject,
}

/// 预校验通过的批量任务
#[derive(Debug, Clone)]
pub struct BatchPlan {
    items: Vec<PlannedItem>,
    key_spec: KeySpec,
    sign_hash: SignatureHashSpec,
    validity: ValidityWindow,
    unique_id: Option<String>,
    sans: Option<SanSpec>,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按生成顺序排列的通用名称
    pub fn cns(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.cn.as_str())
    }

    /// 按生成顺序排列的Subject文本
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.subject_text.as_str())
    }

    fn generate(&self, item: &PlannedItem) -> Result<CsrRecord, CsrError> {
        debug!("生成CSR: {}", item.cn);
        let generated = CsrBuilder::new(&item.subject)
            .sans(self.sans.as_ref())
            .key_spec(self.key_spec)
            .sign_hash(self.sign_hash)
            .build()?;

        Ok(CsrRecord {
            cn: item.cn.clone(),
            subject: item.subject_text.clone(),
            sign_hash_alg: self.sign_hash,
            validity: self.validity,
            unique_id: self.unique_id.clone(),
            sans: self.sans.clone(),
            csr_pem: generated.csr_pem,
            key_pair_type: self.key_spec,
            private_key_pem: generated.private_key_pem,
        })
    }
}

/// 批量生成的中止原因
enum Abort {
    Cancelled,
    Failed { cn: String, error: CsrError },
}

/// 批量CSR生成调度器
#[derive(Debug, Clone, Default)]
pub struct BatchOrchestrator {
    options: BatchOptions,
}

impl BatchOrchestrator {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    /// 预校验: 不生成任何密钥
    pub fn prepare(&self, params: &GenerateParams) -> Result<BatchPlan, ErrorDetail> {
        let config = |field: Field| move |error: ConfigError| ErrorDetail::config(error, field);

        let key_spec: KeySpec = params.key_type.parse().map_err(config(Field::KeyPairType))?;
        let sign_hash: SignatureHashSpec = params
            .sign_hash_alg
            .parse()
            .map_err(config(Field::SignHashAlg))?;
        if !key_spec.check_runtime() || !sign_hash.check_runtime() {
            return Err(ErrorDetail::config(
                ConfigError::UnsupportedCombination {
                    key_type: key_spec.to_string(),
                    hash: sign_hash.to_string(),
                },
                Field::KeyPairType,
            ));
        }

        let validity = ValidityWindow::parse(&params.not_before, &params.not_after).map_err(
            |error| {
                let field = match &error {
                    ConfigError::InvalidTimestamp { field: "notAfter", .. } => Field::NotAfter,
                    _ => Field::NotBefore,
                };
                ErrorDetail::config(error, field)
            },
        )?;

        let range = CnRange::parse(&params.cn_range).map_err(config(Field::CnRange))?;
        let sans = san::parse(params.sans.as_deref()).map_err(config(Field::Sans))?;

        let mut items = Vec::with_capacity(range.len());
        for cn in range.iter() {
            let subject = subject::render(&params.subject_template, &cn).map_err(|error| {
                let mut detail = ErrorDetail::config(error, Field::Subject);
                detail.cn = Some(cn.clone());
                detail
            })?;
            csr::subject_name(&subject).map_err(|error| ErrorDetail {
                error: error.into(),
                cn: Some(cn.clone()),
                field: Field::Subject,
                completed: 0,
            })?;
            items.push(PlannedItem {
                subject_text: subject::substitute(&params.subject_template, &cn),
                cn,
                subject,
            });
        }

        let unique_id = params
            .unique_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(BatchPlan {
            items,
            key_spec,
            sign_hash,
            validity,
            unique_id,
            sans,
        })
    }

    /// 执行批量生成
    ///
    /// `progress` 在每个通用名称完成后以 `(已完成数, 总数)` 调用。
    /// 取消在每个通用名称开始前检查。
    pub fn run<F>(&self, params: &GenerateParams, progress: F, cancel: &CancelToken) -> BatchResult
    where
        F: Fn(usize, usize) + Sync,
    {
        match self.prepare(params) {
            Ok(plan) => self.execute(&plan, progress, cancel),
            Err(detail) => {
                warn!("批量参数校验失败: {detail}");
                BatchResult::failed(0, detail)
            }
        }
    }

    /// 执行已通过预校验的任务
    pub fn execute<F>(&self, plan: &BatchPlan, progress: F, cancel: &CancelToken) -> BatchResult
    where
        F: Fn(usize, usize) + Sync,
    {
        let total = plan.len();
        info!(
            "开始批量生成 {} 个CSR ({}, {}, 并发 {})",
            total,
            plan.key_spec,
            plan.sign_hash,
            self.options.workers.max(1)
        );

        let completed = Mutex::new(0usize);
        let report = || {
            let mut done = completed.lock().unwrap_or_else(PoisonError::into_inner);
            *done += 1;
            progress(*done, total);
        };

        let result = if self.options.workers > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.workers)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    plan.items
                        .par_iter()
                        .map(|item| Self::step(plan, item, cancel, &report))
                        .collect::<Result<Vec<_>, _>>()
                }),
                Err(e) => {
                    warn!("创建线程池失败，改为顺序生成: {e}");
                    Self::sequential(plan, cancel, &report)
                }
            }
        } else {
            Self::sequential(plan, cancel, &report)
        };

        let completed = *completed.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(records) => {
                info!("成功生成 {} 个CSR", records.len());
                BatchResult {
                    records,
                    total,
                    outcome: BatchOutcome::Completed,
                }
            }
            Err(Abort::Cancelled) => {
                warn!("批量生成已取消，已完成 {completed}/{total}");
                BatchResult::cancelled(total, completed)
            }
            Err(Abort::Failed { cn, error }) => {
                let detail = ErrorDetail {
                    field: error.field(),
                    cn: Some(cn),
                    completed,
                    error,
                };
                warn!("批量生成失败: {detail}");
                BatchResult::failed(total, detail)
            }
        }
    }

    fn sequential(
        plan: &BatchPlan,
        cancel: &CancelToken,
        report: &(dyn Fn() + Sync),
    ) -> Result<Vec<CsrRecord>, Abort> {
        plan.items
            .iter()
            .map(|item| Self::step(plan, item, cancel, report))
            .collect()
    }

    fn step(
        plan: &BatchPlan,
        item: &PlannedItem,
        cancel: &CancelToken,
        report: &(dyn Fn() + Sync),
    ) -> Result<CsrRecord, Abort> {
        if cancel.is_cancelled() {
            return Err(Abort::Cancelled);
        }
        let record = plan.generate(item).map_err(|error| Abort::Failed {
            cn: item.cn.clone(),
            error,
        })?;
        report();
        Ok(record)
    }
}
