//! 기준값 정규화.
//!
//! 섹터의 초기 구간 평균으로 기준값을 산출하거나, 이미 저장된 가장 이른
//! 레코드에서 기준값을 대수적으로 복원합니다.

use serde::Serialize;

use super::aggregate::SectorSeries;
use crate::domain::IndexRecord;

/// 첫 `window`개 버킷의 산술 평균으로 기준값을 계산합니다.
///
/// - 버킷이 `window`보다 적으면 있는 만큼 평균
/// - 버킷이 없으면 1.0
/// - 평균이 0 이하이면 첫 양수 버킷 값, 그것도 없으면 1.0
pub fn base_value(series: &SectorSeries, window: usize) -> f64 {
    let head: Vec<f64> = series
        .points
        .values()
        .take(window.max(1))
        .copied()
        .collect();

    if head.is_empty() {
        return 1.0;
    }

    let mean = head.iter().sum::<f64>() / head.len() as f64;
    if mean > 0.0 && mean.is_finite() {
        return mean;
    }

    series
        .points
        .values()
        .copied()
        .find(|v| *v > 0.0 && v.is_finite())
        .unwrap_or(1.0)
}

/// 복원된 기준값의 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseSource {
    /// 저장된 가장 이른 레코드에서 복원
    Persisted,
    /// 이전 레코드가 없거나 쓸 수 없어 이번 배치의 첫 값으로 대체 (스케일 리셋)
    Fallback,
}

/// 증분 업데이트에 사용할 기준값과 스케일 상수.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecoveredBase {
    pub base: f64,
    pub scale_constant: f64,
    pub source: BaseSource,
}

/// 저장된 가장 이른 유효 레코드에서 기준값을 복원합니다.
///
/// `earliest`는 [`IndexRecord::can_recover_base`]를 만족하는 가장 이른 행이어야 합니다.
/// 첫 버킷의 원시값이 0이어도 이후 행으로 같은 기준값을 얻습니다.
///
/// `base = raw_value * scale_constant / index_value`. 스케일 상수는 레코드에
/// 저장된 값을 사용하고, 레코드에 유효한 값이 없으면 `default_scale`을 씁니다.
/// 복원할 수 없으면 `fallback_raw`(이번 배치의 가장 이른 값)를 기준값으로 삼습니다.
pub fn recover_base(
    earliest: Option<&IndexRecord>,
    fallback_raw: Option<f64>,
    default_scale: f64,
) -> RecoveredBase {
    if let Some(record) = earliest {
        let scale = if record.scale_constant.is_finite() && record.scale_constant > 0.0 {
            record.scale_constant
        } else {
            default_scale
        };

        if record.can_recover_base() {
            return RecoveredBase {
                base: record.raw_value * scale / record.index_value,
                scale_constant: scale,
                source: BaseSource::Persisted,
            };
        }
    }

    let base = fallback_raw
        .filter(|v| *v > 0.0 && v.is_finite())
        .unwrap_or(1.0);

    RecoveredBase {
        base,
        scale_constant: default_scale,
        source: BaseSource::Fallback,
    }
}
