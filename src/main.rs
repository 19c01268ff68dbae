mod cli;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

use batch_csr_generator_lib::range::expand;
use batch_csr_generator_lib::{
    generate_csr_batch, AppConfig, CancelToken, ColumnLayout, CsrRecord, GenerateResult,
    RecordSerializer,
};

fn main() {
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = real_main() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let args = cli::Args::parse();

    match args.cmd {
        cli::Cmd::Generate(generate) => run_generate(generate),
        cli::Cmd::Expand { range } => {
            for cn in expand(&range)? {
                println!("{cn}");
            }
            Ok(())
        }
    }
}

fn run_generate(args: cli::GenerateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    args.apply(&mut config);

    let output_path = config
        .batch
        .output_path
        .clone()
        .context("未指定输出文件路径 (--output)")?;

    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }

    let result = generate_csr_batch(
        &config.batch,
        &config.options,
        |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        },
        &CancelToken::new(),
    );
    bar.finish_and_clear();

    // 只有整批成功时才写入文件
    if result.success() {
        write_records(&output_path, &result.records, config.options.layout)?;
        info!("已写入 {}", output_path.display());
    }

    let summary = GenerateResult::from_batch(&result, Some(output_path.display().to_string()));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.message);
    }

    if !summary.success {
        std::process::exit(1);
    }
    Ok(())
}

/// 将结果写入CSV文件
fn write_records(path: &Path, records: &[CsrRecord], layout: ColumnLayout) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("无法创建输出文件: {}", path.display()))?;
    RecordSerializer::new(layout)
        .write(records, BufWriter::new(file))
        .with_context(|| format!("写入CSV失败: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use batch_csr_generator_lib::GenerateParams;

    use super::*;

    #[test]
    fn test_write_records() {
        let params = GenerateParams {
            cn_range: "W01-W02".into(),
            subject_template: "CN=[{CN}]".into(),
            key_type: "EC_P256".into(),
            sign_hash_alg: "SHA256".into(),
            not_before: "2025-01-01T00:00:00Z".into(),
            not_after: "2025-06-01T00:00:00Z".into(),
            ..Default::default()
        };
        let result = generate_csr_batch(
            &params,
            &Default::default(),
            |_, _| {},
            &CancelToken::new(),
        );
        assert!(result.success());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records(&path, &result.records, ColumnLayout::Compact).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let rows = RecordSerializer::parse(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].subject, "CN=[W01]");
        assert_eq!(rows[1].not_before, "2025-01-01T00:00:00Z");
        assert!(text.starts_with("subject,signHashAlg,notBefore,notAfter,csr,"));
    }
}
