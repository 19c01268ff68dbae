//! CSV行序列化
//! 只负责生成文本，写入文件由调用方完成

use std::io::Write;

use csv::{ReaderBuilder, Writer};
use serde::{Deserialize, Serialize};

use crate::batch::CsrRecord;
use crate::error::EncodingError;

/// 固定列顺序
pub const HEADERS: [&str; 9] = [
    "subject",
    "signHashAlg",
    "notBefore",
    "notAfter",
    "uniqueId",
    "sans",
    "csr",
    "keyPairType",
    "privateKey",
];

/// 列布局
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnLayout {
    /// 始终输出全部9列
    #[default]
    Full,
    /// 没有任何记录包含 uniqueId / sans 时省略对应列
    Compact,
}

/// 一行CSV数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub subject: String,
    #[serde(rename = "signHashAlg")]
    pub sign_hash_alg: String,
    #[serde(rename = "notBefore")]
    pub not_before: String,
    #[serde(rename = "notAfter")]
    pub not_after: String,
    #[serde(rename = "uniqueId", default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub sans: Option<String>,
    pub csr: String,
    #[serde(rename = "keyPairType")]
    pub key_pair_type: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

impl From<&CsrRecord> for CsvRow {
    fn from(record: &CsrRecord) -> Self {
        Self {
            subject: record.subject().to_string(),
            sign_hash_alg: record.sign_hash_alg().to_string(),
            not_before: record.not_before(),
            not_after: record.not_after(),
            unique_id: record.unique_id().map(str::to_string),
            sans: record.sans().map(|sans| sans.to_string()),
            csr: record.csr_pem().to_string(),
            key_pair_type: record.key_pair_type().display_name().to_string(),
            private_key: record.private_key_pem().to_string(),
        }
    }
}

impl CsvRow {
    fn fields(&self, with_unique_id: bool, with_sans: bool) -> Vec<&str> {
        let mut fields = vec![
            self.subject.as_str(),
            self.sign_hash_alg.as_str(),
            self.not_before.as_str(),
            self.not_after.as_str(),
        ];
        if with_unique_id {
            fields.push(self.unique_id.as_deref().unwrap_or_default());
        }
        if with_sans {
            fields.push(self.sans.as_deref().unwrap_or_default());
        }
        fields.push(&self.csr);
        fields.push(&self.key_pair_type);
        fields.push(&self.private_key);
        fields
    }
}

/// 记录序列化器
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordSerializer {
    layout: ColumnLayout,
}

impl RecordSerializer {
    pub fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// 将记录转换为行
    pub fn rows(records: &[CsrRecord]) -> Vec<CsvRow> {
        records.iter().map(CsvRow::from).collect()
    }

    /// 写入任意输出 (含表头)
    pub fn write<W: Write>(&self, records: &[CsrRecord], output: W) -> Result<(), EncodingError> {
        self.write_rows(&Self::rows(records), output)
    }

    /// 按列布局写入已转换的行
    pub fn write_rows<W: Write>(&self, rows: &[CsvRow], output: W) -> Result<(), EncodingError> {
        let (with_unique_id, with_sans) = match self.layout {
            ColumnLayout::Full => (true, true),
            ColumnLayout::Compact => (
                rows.iter().any(|r| r.unique_id.is_some()),
                rows.iter().any(|r| r.sans.is_some()),
            ),
        };

        let mut writer = Writer::from_writer(output);

        // 写入表头
        let headers: Vec<&str> = HEADERS
            .iter()
            .copied()
            .filter(|h| (with_unique_id || *h != "uniqueId") && (with_sans || *h != "sans"))
            .collect();
        writer.write_record(&headers)?;

        // 写入数据
        for row in rows {
            writer.write_record(row.fields(with_unique_id, with_sans))?;
        }

        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// 序列化为CSV文本
    pub fn serialize(&self, records: &[CsrRecord]) -> Result<String, EncodingError> {
        let mut buf = Vec::new();
        self.write(records, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// 解析CSV文本，兼容两种列布局
    pub fn parse(text: &str) -> Result<Vec<CsvRow>, EncodingError> {
        let mut reader = ReaderBuilder::new().from_reader(text.as_bytes());
        let rows = reader.deserialize().collect::<Result<Vec<CsvRow>, _>>()?;
        Ok(rows)
    }
}
