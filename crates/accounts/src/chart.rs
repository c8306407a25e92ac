//! Well-known account codes the adapters resolve against.

use serde::{Deserialize, Serialize};

/// Chart-of-accounts configuration.
///
/// Adapters and integrations never hard-code account codes; they look them up
/// here. The defaults match the standard seeded chart. Deployments override
/// by deserializing their own mapping; missing fields keep the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub cash: String,
    pub accounts_receivable: String,
    pub inventory: String,
    pub fixed_assets: String,
    pub accounts_payable: String,
    pub payroll_payable: String,
    pub sales_revenue: String,
    pub salary_expense: String,
    pub overtime_expense: String,
    pub bonus_expense: String,
    pub commission_expense: String,
    pub disposal_gain: String,
    pub disposal_loss: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            cash: "1001".to_string(),
            accounts_receivable: "1100".to_string(),
            inventory: "1200".to_string(),
            fixed_assets: "1500".to_string(),
            accounts_payable: "2000".to_string(),
            payroll_payable: "2001".to_string(),
            sales_revenue: "4000".to_string(),
            salary_expense: "5000".to_string(),
            overtime_expense: "5001".to_string(),
            bonus_expense: "5002".to_string(),
            commission_expense: "5003".to_string(),
            disposal_gain: "8001".to_string(),
            disposal_loss: "8002".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_seeded_chart() {
        let chart = ChartConfig::default();
        assert_eq!(chart.cash, "1001");
        assert_eq!(chart.accounts_payable, "2000");
        assert_eq!(chart.disposal_loss, "8002");
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let chart: ChartConfig = serde_json::from_str(r#"{"cash": "1000"}"#).unwrap();
        assert_eq!(chart.cash, "1000");
        assert_eq!(chart.sales_revenue, "4000");
    }
}
