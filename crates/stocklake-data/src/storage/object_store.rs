//! 오브젝트 스토리지 추상화.
//!
//! 게시 단계에서 사용하는 최소 계약만 정의합니다:
//! - `put`: bucket/key에 바이트 업로드 (덮어쓰기)
//! - `get`: 객체 조회, 없으면 `Ok(None)` — 증분 모드 첫 실행의 정상 경로

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{DataError, Result};

/// 오브젝트 스토어 계약.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 객체 업로드. 기존 객체는 덮어씁니다.
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// 객체 조회. 객체가 없으면 `Ok(None)`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;
}

/// AWS S3 기반 오브젝트 스토어.
///
/// 자격 증명은 S3 SDK의 기본 체인(환경변수, 프로파일 등)에서 로드됩니다.
/// 자격 증명 부재는 여기서 검사하지 않고 업로드 시점에 오류로 드러납니다.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// 환경 자격 증명으로 클라이언트 생성.
    ///
    /// # Arguments
    /// * `region` - 리전 이름 (예: "us-east-1")
    pub async fn from_env(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| DataError::Storage(format!("s3://{}/{} 업로드 실패: {}", bucket, key, e)))?;

        tracing::info!(bucket = bucket, key = key, "S3 업로드 완료");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                return Err(DataError::Storage(format!(
                    "s3://{}/{} 조회 실패: {}",
                    bucket, key, service_error
                )));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| DataError::Storage(format!("s3://{}/{} 본문 수신 실패: {}", bucket, key, e)))?
            .into_bytes()
            .to_vec();
        Ok(Some(bytes))
    }
}

/// 인메모리 오브젝트 스토어.
///
/// 테스트 및 로컬 드라이런용.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    /// 빈 스토어 생성.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects
            .write()
            .expect("스토어 락 획득 실패")
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .objects
            .read()
            .expect("스토어 락 획득 실패")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_missing_is_none() {
        let store = MemoryObjectStore::new();
        assert!(store.get("bucket", "missing.csv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_put_overwrites() {
        let store = MemoryObjectStore::new();
        store.put("bucket", "data.csv", b"v1".to_vec()).await.unwrap();
        store.put("bucket", "data.csv", b"v2".to_vec()).await.unwrap();
        assert_eq!(
            store.get("bucket", "data.csv").await.unwrap(),
            Some(b"v2".to_vec())
        );
    }
}
