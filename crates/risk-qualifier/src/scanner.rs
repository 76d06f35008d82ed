use analysis_core::{Bias, IndicatorSnapshot, Signal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::assessor::RiskAssessor;
use crate::error::QualificationResult;
use crate::models::{AssessmentOutcome, RiskAssessment};

/// One instrument's inputs for a universe scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub symbol: String,
    pub entry_price: f64,
    #[serde(default)]
    pub bias_hint: Option<Bias>,
    pub snapshot: IndicatorSnapshot,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub symbol: String,
    pub result: QualificationResult<RiskAssessment>,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Same order as the requests
    pub entries: Vec<ScanEntry>,
    pub qualified: usize,
    pub suppressed: usize,
    pub no_timeframe: usize,
    pub rejected: usize,
}

impl ScanReport {
    /// Qualified assessments, best leading plan first
    pub fn ranked(&self) -> Vec<&RiskAssessment> {
        let mut qualified: Vec<&RiskAssessment> = self
            .entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().ok())
            .filter(|assessment| assessment.is_qualified())
            .collect();

        let ratio = |a: &RiskAssessment| a.best_plan().map(|p| p.risk_reward.ratio).unwrap_or(0.0);
        qualified.sort_by(|a, b| ratio(b).partial_cmp(&ratio(a)).unwrap_or(Ordering::Equal));
        qualified
    }
}

impl RiskAssessor {
    /// Assess a whole universe in parallel. Each request is independent; a
    /// contract violation on one symbol does not affect the others.
    pub fn scan(&self, requests: &[AssessmentRequest]) -> ScanReport {
        tracing::info!("Scanning {} symbols", requests.len());

        let entries: Vec<ScanEntry> = requests
            .par_iter()
            .map(|request| ScanEntry {
                symbol: request.symbol.clone(),
                result: self.assess(
                    &request.symbol,
                    request.entry_price,
                    request.bias_hint,
                    &request.snapshot,
                    &request.signals,
                ),
            })
            .collect();

        let mut report = ScanReport {
            entries,
            qualified: 0,
            suppressed: 0,
            no_timeframe: 0,
            rejected: 0,
        };
        for entry in &report.entries {
            match &entry.result {
                Ok(a) if a.outcome == AssessmentOutcome::Qualified => report.qualified += 1,
                Ok(a) if a.outcome == AssessmentOutcome::Suppressed => report.suppressed += 1,
                Ok(_) => report.no_timeframe += 1,
                Err(_) => report.rejected += 1,
            }
        }

        tracing::info!(
            "Scan complete: {} qualified, {} suppressed, {} without timeframe, {} rejected",
            report.qualified,
            report.suppressed,
            report.no_timeframe,
            report.rejected
        );
        report
    }
}
