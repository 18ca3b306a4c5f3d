//! 결합 데이터 테이블.
//!
//! 심볼별 조회 결과를 하나의 표로 합칩니다. 컬럼 집합은 입력 행들의
//! 합집합(최초 등장 순서)이며, 값이 없는 셀은 빈 문자열로 남습니다.
//! 개요(심볼당 1행)와 시계열(심볼당 다수 행)을 같은 타입으로 다룹니다.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::error::Result;

/// 행 지향 결합 테이블.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

impl DataTable {
    /// 빈 테이블 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 행 수.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 비어 있는지 여부.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 컬럼 목록 (최초 등장 순서).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 행 추가.
    ///
    /// 새로운 컬럼은 테이블 컬럼 목록 끝에 등록됩니다.
    pub fn push_row(&mut self, row: Vec<(String, String)>) {
        let mut cells = HashMap::with_capacity(row.len());
        for (column, value) in row {
            if !self.columns.contains(&column) {
                self.columns.push(column.clone());
            }
            cells.insert(column, value);
        }
        self.rows.push(cells);
    }

    /// 다른 테이블의 모든 행 추가.
    pub fn extend(&mut self, other: DataTable) {
        for column in &other.columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
        self.rows.extend(other.rows);
    }

    /// 지정 컬럼의 최대 날짜 (증분 워터마크).
    ///
    /// 파싱 불가능한 셀은 무시합니다. 날짜 형식은 `YYYY-MM-DD`.
    pub fn max_date(&self, column: &str) -> Option<NaiveDate> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter_map(|cell| NaiveDate::parse_from_str(cell, "%Y-%m-%d").ok())
            .max()
    }

    /// 키 컬럼 조합이 겹치지 않는 행만 받아서 합집합 생성.
    ///
    /// 증분 게시에서 기존 행 ++ 신규 행을 만들 때 사용합니다.
    /// `other`의 행 중 키 튜플이 이미 존재하는 것은 버립니다.
    pub fn merge(mut self, other: DataTable, key_columns: &[&str]) -> DataTable {
        let existing_keys: HashSet<Vec<String>> = self
            .rows
            .iter()
            .map(|row| Self::key_of(row, key_columns))
            .collect();

        for column in &other.columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
        for row in other.rows {
            if !existing_keys.contains(&Self::key_of(&row, key_columns)) {
                self.rows.push(row);
            }
        }
        self
    }

    /// CSV 바이트로 직렬화 (헤더 행 포함).
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        if self.columns.is_empty() {
            return Ok(Vec::new());
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            let record: Vec<&str> = self
                .columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }

    /// CSV 바이트에서 역직렬화.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(bytes);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let cells: HashMap<String, String> = columns
                .iter()
                .zip(record.iter())
                .filter(|(_, value)| !value.is_empty())
                .map(|(column, value)| (column.clone(), value.to_string()))
                .collect();
            rows.push(cells);
        }

        Ok(Self { columns, rows })
    }

    fn key_of(row: &HashMap<String, String>, key_columns: &[&str]) -> Vec<String> {
        key_columns
            .iter()
            .map(|c| row.get(*c).cloned().unwrap_or_default())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> Vec<(String, String)> {
        cells
            .iter()
            .map(|(c, v)| (c.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_column_union_first_seen_order() {
        let mut table = DataTable::new();
        table.push_row(row(&[("date", "2024-01-10"), ("close", "186.19")]));
        table.push_row(row(&[("date", "2024-01-11"), ("ticker", "AAPL")]));

        assert_eq!(table.columns(), &["date", "close", "ticker"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_csv_roundtrip_with_missing_cells() {
        let mut table = DataTable::new();
        table.push_row(row(&[("date", "2024-01-10"), ("close", "186.19")]));
        table.push_row(row(&[("date", "2024-01-11"), ("ticker", "AAPL")]));

        let bytes = table.to_csv_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("date,close,ticker\n"));
        assert!(text.contains("2024-01-10,186.19,\n"));
        assert!(text.contains("2024-01-11,,AAPL\n"));

        let parsed = DataTable::from_csv_bytes(&bytes).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.columns(), table.columns());
    }

    #[test]
    fn test_max_date_ignores_unparseable_cells() {
        let mut table = DataTable::new();
        table.push_row(row(&[("date", "2024-01-10")]));
        table.push_row(row(&[("date", "2024-01-15")]));
        table.push_row(row(&[("date", "not-a-date")]));

        assert_eq!(
            table.max_date("date"),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(table.max_date("missing"), None);
        assert_eq!(DataTable::new().max_date("date"), None);
    }

    #[test]
    fn test_merge_skips_duplicate_keys() {
        let mut existing = DataTable::new();
        existing.push_row(row(&[("ticker", "AAPL"), ("date", "2024-01-10")]));
        existing.push_row(row(&[("ticker", "AAPL"), ("date", "2024-01-09")]));

        let mut new = DataTable::new();
        new.push_row(row(&[("ticker", "AAPL"), ("date", "2024-01-10")]));
        new.push_row(row(&[("ticker", "AAPL"), ("date", "2024-01-11")]));
        new.push_row(row(&[("ticker", "MSFT"), ("date", "2024-01-10")]));

        let merged = existing.merge(new, &["ticker", "date"]);
        assert_eq!(merged.len(), 4);
    }
}
