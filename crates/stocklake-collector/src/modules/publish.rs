//! 게시 모듈.
//!
//! 결합 테이블을 로컬 CSV로 저장하고 오브젝트 스토어에 업로드합니다.
//! 업로드 실패는 재시도 없이 치명적 오류로 전파됩니다. 로컬 CSV는
//! 업로드 실패 시 복구용으로 남겨둡니다.

use std::path::{Path, PathBuf};

use stocklake_data::{DataTable, ObjectStore};

use crate::Result;

/// 기존 게시본 로드 (증분 모드).
///
/// 객체가 없으면 `None` — 첫 실행의 정상 경로이며 오류가 아닙니다.
pub async fn load_published(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Option<DataTable>> {
    match store.get(bucket, key).await? {
        Some(bytes) => {
            let table = DataTable::from_csv_bytes(&bytes)?;
            tracing::info!(bucket = bucket, key = key, rows = table.len(), "기존 게시본 로드");
            Ok(Some(table))
        }
        None => {
            tracing::info!(bucket = bucket, key = key, "기존 게시본 없음 (첫 실행)");
            Ok(None)
        }
    }
}

/// 결합 테이블 게시.
///
/// 빈 테이블은 경고만 남기고 업로드하지 않습니다.
/// 반환값은 기록된 로컬 파일 경로입니다.
pub async fn publish(
    table: &DataTable,
    local_dir: &Path,
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Option<PathBuf>> {
    if table.is_empty() {
        tracing::warn!(key = key, "게시할 행이 없어 업로드를 건너뜁니다");
        return Ok(None);
    }

    let bytes = table.to_csv_bytes()?;

    tokio::fs::create_dir_all(local_dir).await?;
    let filename = Path::new(key)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("combined.csv");
    let local_path = local_dir.join(filename);
    tokio::fs::write(&local_path, &bytes).await?;
    tracing::info!(
        path = %local_path.display(),
        rows = table.len(),
        "로컬 CSV 저장 완료"
    );

    store.put(bucket, key, bytes).await?;
    tracing::info!(
        bucket = bucket,
        key = key,
        rows = table.len(),
        "게시 완료"
    );

    Ok(Some(local_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocklake_data::MemoryObjectStore;

    fn sample_table() -> DataTable {
        let mut table = DataTable::new();
        table.push_row(vec![
            ("date".to_string(), "2024-01-10".to_string()),
            ("close".to_string(), "186.19".to_string()),
            ("ticker".to_string(), "AAPL".to_string()),
        ]);
        table
    }

    #[tokio::test]
    async fn test_publish_writes_local_and_remote() {
        let store = MemoryObjectStore::new();
        let local_dir = std::env::temp_dir().join(format!(
            "stocklake_publish_{}",
            std::process::id()
        ));

        let table = sample_table();
        let path = publish(&table, &local_dir, &store, "bucket", "daily/combined.csv")
            .await
            .unwrap()
            .expect("로컬 경로가 반환되어야 함");

        assert!(path.ends_with("combined.csv"));
        let local = std::fs::read(&path).unwrap();
        let remote = store.get("bucket", "daily/combined.csv").await.unwrap();
        assert_eq!(remote, Some(local));

        std::fs::remove_dir_all(&local_dir).ok();
    }

    #[tokio::test]
    async fn test_publish_empty_table_skips_upload() {
        let store = MemoryObjectStore::new();
        let local_dir = std::env::temp_dir();

        let result = publish(&DataTable::new(), &local_dir, &store, "bucket", "x.csv")
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.get("bucket", "x.csv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_published_missing_is_none() {
        let store = MemoryObjectStore::new();
        let result = load_published(&store, "bucket", "missing.csv").await.unwrap();
        assert!(result.is_none());
    }
}
