// crates/types/src/analysis.rs
//! Cross-dataset analysis: stock vs sales and price divergence rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STOCK_KEY: &str = "estoque_id";
pub const SALES_KEY: &str = "vendas_id";
pub const PRICES_KEY: &str = "precos_id";

/// Body of `POST /analysis/run`: dataset ids keyed by role.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub datasets: BTreeMap<String, String>,
}

impl AnalysisRequest {
    /// Blank ids are left out.
    pub fn new(stock: Option<&str>, sales: Option<&str>, prices: Option<&str>) -> Self {
        let datasets = [(STOCK_KEY, stock), (SALES_KEY, sales), (PRICES_KEY, prices)]
            .into_iter()
            .filter_map(|(key, id)| {
                let id = id?.trim();
                (!id.is_empty()).then(|| (key.to_string(), id.to_string()))
            })
            .collect();
        Self { datasets }
    }

    /// At least one rule can run: sales plus stock or prices.
    pub fn has_rule_pair(&self) -> bool {
        self.datasets.contains_key(SALES_KEY)
            && (self.datasets.contains_key(STOCK_KEY) || self.datasets.contains_key(PRICES_KEY))
    }
}

/// One row produced by a rule. Top-score entries omit the compared values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFinding {
    pub regra: String,
    /// Numeric or textual, depending on the source CSV.
    #[serde(default)]
    pub sku: Value,
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_base: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_comparado: Option<f64>,
    pub score: f64,
    #[serde(default)]
    pub flag: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub total_registros: u64,
    #[serde(default)]
    pub contagem_por_regra: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_10_scores: Vec<AnalysisFinding>,
}

/// `data` of `POST /analysis/run`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub results: Vec<AnalysisFinding>,
    #[serde(default)]
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    pub fn flagged(&self) -> usize {
        self.results.iter().filter(|r| r.flag).count()
    }
}
