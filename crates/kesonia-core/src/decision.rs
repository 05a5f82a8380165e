//! Outcome of one applicant evaluation.

use serde::{Deserialize, Serialize};

/// Default approval cut-off on the classifier's probability.
pub const APPROVAL_THRESHOLD: f64 = 0.35;

/// Decimal places reported for the approval probability.
const PROBABILITY_PLACES: i32 = 4;
/// Decimal places reported for money amounts and rates.
const MONEY_PLACES: i32 = 2;

/// Decision returned to the caller of the predict path.
///
/// The financial fields are only present on approval. Constructed once per
/// request through [`Decision::rejected`] or [`Decision::approved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub approved: bool,
    pub approval_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(rename = "cluster", default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
}

impl Decision {
    pub fn rejected(probability: f64) -> Self {
        Self {
            approved: false,
            approval_probability: round_to(probability, PROBABILITY_PLACES),
            loan_amount: None,
            interest_rate: None,
            cluster_name: None,
        }
    }

    pub fn approved(
        probability: f64,
        loan_amount: f64,
        interest_rate: f64,
        cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            approved: true,
            approval_probability: round_to(probability, PROBABILITY_PLACES),
            loan_amount: Some(round_to(loan_amount, MONEY_PLACES)),
            interest_rate: Some(round_to(interest_rate, MONEY_PLACES)),
            cluster_name: Some(cluster_name.into()),
        }
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_omits_financial_fields() {
        let decision = Decision::rejected(0.123456);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["approved"], false);
        assert_eq!(json["approval_probability"], 0.1235);
        assert!(json.get("loan_amount").is_none());
        assert!(json.get("interest_rate").is_none());
        assert!(json.get("cluster").is_none());
    }

    #[test]
    fn approved_rounds_money_to_cents() {
        let decision = Decision::approved(0.9, 8102.083927575384, 7.499, "Prime");
        assert_eq!(decision.loan_amount, Some(8102.08));
        assert_eq!(decision.interest_rate, Some(7.5));

        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["cluster"], "Prime");
    }

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }
}
