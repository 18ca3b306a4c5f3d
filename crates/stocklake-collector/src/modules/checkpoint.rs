//! 워크플로우 체크포인트 관리 모듈.
//!
//! 장시간 실행되는 배치 작업의 중단/재개를 지원합니다.
//!
//! # 파일 형식
//!
//! 처리 완료된 심볼의 평탄한 JSON 배열입니다. 심볼마다 처리 직후
//! 파일 전체를 다시 쓰므로 최소 한 번(at-least-once) 내구성이
//! 보장됩니다: 중단 시 마지막 미기록 심볼만 재처리되며, 기록된
//! 심볼을 건너뛰는 일은 없습니다.
//!
//! # 주의
//!
//! 재시도 소진으로 실패한 심볼도 "처리됨"으로 기록됩니다. 일시 장애로
//! 실패한 심볼을 다시 수집하려면 운영자가 체크포인트 파일을 삭제해야
//! 합니다. 파일은 자동으로 삭제되지 않습니다.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

/// 파일 기반 체크포인트 저장소.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    done: HashSet<String>,
}

impl CheckpointStore {
    /// 체크포인트 로드.
    ///
    /// 파일이 없으면 빈 집합으로 시작합니다 (첫 실행의 정상 경로).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let done = match fs::read(&path) {
            Ok(bytes) => {
                let symbols: Vec<String> = serde_json::from_slice(&bytes)?;
                symbols.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };

        if !done.is_empty() {
            tracing::info!(
                path = %path.display(),
                done = done.len(),
                "체크포인트 로드 완료"
            );
        }

        Ok(Self { path, done })
    }

    /// 이미 처리된 심볼인지 확인.
    pub fn contains(&self, symbol: &str) -> bool {
        self.done.contains(symbol)
    }

    /// 기록된 심볼 수.
    pub fn len(&self) -> usize {
        self.done.len()
    }

    /// 비어 있는지 여부.
    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    /// 심볼을 처리 완료로 기록하고 즉시 저장.
    ///
    /// 다음 심볼을 시작하기 전에 디스크에 반영됩니다.
    pub fn mark_done(&mut self, symbol: &str) -> Result<()> {
        if self.done.insert(symbol.to_string()) {
            self.persist()?;
        }
        Ok(())
    }

    /// 체크포인트 완전 초기화 (파일 삭제).
    pub fn clear(&mut self) -> Result<()> {
        self.done.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// 체크포인트 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 집합 전체를 파일로 기록 (임시 파일 후 rename).
    fn persist(&self) -> Result<()> {
        let mut symbols: Vec<&String> = self.done.iter().collect();
        symbols.sort();
        let bytes = serde_json::to_vec_pretty(&symbols)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
