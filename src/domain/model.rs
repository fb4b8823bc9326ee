use std::collections::HashMap;

/// 一列 CSV 資料，`row` 從 1 起算（不含標題列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub row: usize,
    pub data: HashMap<String, String>,
}

impl Record {
    pub fn new(row: usize, data: HashMap<String, String>) -> Self {
        Self { row, data }
    }

    /// Value of `field`, treating an empty cell as absent.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.data
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// 已合成、等待寫出的 SVG
#[derive(Debug, Clone)]
pub struct RenderedRecord {
    pub row: usize,
    pub identifier: String,
    pub file_name: String,
    pub svg: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub row: usize,
    pub identifier: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub written: Vec<String>,
    pub failures: Vec<RecordFailure>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
