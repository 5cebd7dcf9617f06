//! Weighted load-balance annotation.
//!
//! ```text
//! bfe.ingress.kubernetes.io/balance.weight: '{"service": {"service-v1": 80, "service-v2": 20}}'
//! ```
//!
//! The outer key is the service named by the declaration's backend; the
//! inner map splits its traffic across sub-services.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::rules::Annotations;

pub const WEIGHT_ANNOTATION: &str = "bfe.ingress.kubernetes.io/balance.weight";

/// service → sub-service → weight
pub type BalanceWeights = BTreeMap<String, BTreeMap<String, u32>>;

/// Parse the weight annotation. Absent annotation yields `None`.
pub fn weights(annotations: &Annotations) -> Result<Option<BalanceWeights>, ValidationError> {
    let Some(raw) = annotations.get(WEIGHT_ANNOTATION) else {
        return Ok(None);
    };

    let parsed: BalanceWeights = serde_json::from_str(raw)
        .map_err(|e| ValidationError::annotation(WEIGHT_ANNOTATION, e.to_string()))?;

    for (service, split) in &parsed {
        if split.is_empty() {
            return Err(ValidationError::annotation(
                WEIGHT_ANNOTATION,
                format!("service {service} has no weighted backends"),
            ));
        }
        let total: u64 = split.values().map(|w| u64::from(*w)).sum();
        if total == 0 {
            return Err(ValidationError::annotation(
                WEIGHT_ANNOTATION,
                format!("weights of service {service} sum to zero"),
            ));
        }
    }

    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_weight(raw: &str) -> Annotations {
        [(WEIGHT_ANNOTATION, raw)].into_iter().collect()
    }

    #[test]
    fn test_absent_weight() {
        assert_eq!(weights(&Annotations::new()), Ok(None));
    }

    #[test]
    fn test_parse_weights() {
        let parsed = weights(&with_weight(r#"{"svc": {"v1": 80, "v2": 20}}"#))
            .unwrap()
            .unwrap();
        assert_eq!(parsed["svc"]["v1"], 80);
        assert_eq!(parsed["svc"]["v2"], 20);
    }

    #[test]
    fn test_invalid_weights() {
        assert!(weights(&with_weight("ccc")).is_err());
        assert!(weights(&with_weight(r#"{"svc": {}}"#)).is_err());
        assert!(weights(&with_weight(r#"{"svc": {"v1": 0}}"#)).is_err());
        assert!(weights(&with_weight(r#"{"svc": {"v1": -3}}"#)).is_err());
    }
}
