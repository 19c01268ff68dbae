use std::path::PathBuf;

use clap::{Parser, Subcommand};

use batch_csr_generator_lib::{AppConfig, ColumnLayout};

#[derive(Parser, Debug)]
#[command(version, about = "批量CSR生成器")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// 批量生成CSR并写入CSV文件
    Generate(GenerateArgs),
    /// 预览通用名称范围展开结果
    Expand {
        /// 例如 YDL0001-YDL0010
        range: String,
    },
}

/// 命令行参数覆盖配置文件中的同名项
#[derive(clap::Args, Debug, Default)]
pub struct GenerateArgs {
    /// 配置文件 (.toml / .json)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// 通用名称范围，例如 YDL0001-YDL0010
    #[arg(long)]
    pub cn_range: Option<String>,

    /// Subject主题模板，例如 "CN=[{CN}];O=[Example\, Inc.]"
    #[arg(long)]
    pub subject: Option<String>,

    /// RSA_2048 | RSA_3072 | RSA_4096 | EC_P256 | EC_P384 | EC_P521
    #[arg(long)]
    pub key_type: Option<String>,

    /// SHA256 | SHA384 | SHA512 | SHA1 | MatchIssuer
    #[arg(long = "hash")]
    pub sign_hash_alg: Option<String>,

    /// 有效期开始时间 (ISO8601)
    #[arg(long)]
    pub not_before: Option<String>,

    /// 有效期结束时间 (ISO8601)
    #[arg(long)]
    pub not_after: Option<String>,

    #[arg(long)]
    pub unique_id: Option<String>,

    /// 备用名称，例如 "DNS=[a.example.com];IP=[10.0.0.1]"
    #[arg(long)]
    pub sans: Option<String>,

    /// 输出CSV文件路径
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// 并发线程数
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// 没有 uniqueId / sans 时省略对应列
    #[arg(long)]
    pub compact: bool,

    /// 以JSON输出完成摘要
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        let batch = &mut config.batch;
        let overrides = [
            (&self.cn_range, &mut batch.cn_range),
            (&self.subject, &mut batch.subject_template),
            (&self.key_type, &mut batch.key_type),
            (&self.sign_hash_alg, &mut batch.sign_hash_alg),
            (&self.not_before, &mut batch.not_before),
            (&self.not_after, &mut batch.not_after),
        ];
        for (value, target) in overrides {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        if self.unique_id.is_some() {
            batch.unique_id = self.unique_id.clone();
        }
        if self.sans.is_some() {
            batch.sans = self.sans.clone();
        }
        if self.output.is_some() {
            batch.output_path = self.output.clone();
        }
        if let Some(jobs) = self.jobs {
            config.options.workers = jobs.max(1);
        }
        if self.compact {
            config.options.layout = ColumnLayout::Compact;
        }
    }
}
