use crate::models::{ReconReport, ReconSummary, UnmatchedObservation, VarianceRow};

/// 组装两张输出表与统计数, 不做任何计算
pub fn assemble(variance: Vec<VarianceRow>, errors: Vec<UnmatchedObservation>) -> ReconReport {
    let summary = ReconSummary {
        total_rows: variance.len(),
        variance_rows: variance.iter().filter(|r| r.variance != 0.0).count(),
        unmatched: errors.len(),
    };
    ReconReport { variance, errors, summary }
}
