//! Payload validation
//!
//! Checks raw reasoning-service payloads against the record shape
//! descriptors before anything typed is built from them. The first problem
//! found is reported with the entity, record index and field.
//!
//! Order of checks:
//! - top level must be an array
//! - each record must be an object
//! - fields in declaration order: present and non-null, right JSON type,
//!   enum literal matches exactly (case-sensitive)
//!
//! Unknown fields are ignored. An empty array is valid.

use deal_sim_core::{
    Clause, FieldKind, FieldSpec, RiskRecord, SchemaError, CLAUSE_FIELDS, RISK_FIELDS,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A record type with a declared wire shape
pub trait Shape: DeserializeOwned {
    /// Name used in error messages
    const ENTITY: &'static str;
    /// Required fields, in check order
    const FIELDS: &'static [FieldSpec];
}

impl Shape for Clause {
    const ENTITY: &'static str = "Clause";
    const FIELDS: &'static [FieldSpec] = CLAUSE_FIELDS;
}

impl Shape for RiskRecord {
    const ENTITY: &'static str = "RiskRecord";
    const FIELDS: &'static [FieldSpec] = RISK_FIELDS;
}

/// Validate a raw payload and convert it into typed records
pub fn validate<T: Shape>(raw: &Value) -> Result<Vec<T>, SchemaError> {
    let records = raw
        .as_array()
        .ok_or(SchemaError::NotAnArray { entity: T::ENTITY })?;

    let mut validated = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let object = record.as_object().ok_or(SchemaError::WrongType {
            entity: T::ENTITY,
            index,
            field: "(record)",
            expected: "object",
        })?;

        check_record(T::ENTITY, T::FIELDS, index, object)?;

        let typed = serde_json::from_value(record.clone())
            .map_err(|e| SchemaError::Malformed(format!("{}[{}]: {}", T::ENTITY, index, e)))?;
        validated.push(typed);
    }

    tracing::debug!(entity = T::ENTITY, count = validated.len(), "Payload validated");
    Ok(validated)
}

fn check_record(
    entity: &'static str,
    fields: &[FieldSpec],
    index: usize,
    object: &Map<String, Value>,
) -> Result<(), SchemaError> {
    for spec in fields {
        let value = match object.get(spec.name) {
            None | Some(Value::Null) => {
                return Err(SchemaError::MissingField {
                    entity,
                    index,
                    field: spec.name,
                })
            }
            Some(value) => value,
        };

        let wrong_type = || SchemaError::WrongType {
            entity,
            index,
            field: spec.name,
            expected: spec.kind.expected(),
        };

        match spec.kind {
            FieldKind::Text => {
                if !value.is_string() {
                    return Err(wrong_type());
                }
            }
            FieldKind::TextList => {
                let all_strings = value
                    .as_array()
                    .is_some_and(|items| items.iter().all(Value::is_string));
                if !all_strings {
                    return Err(wrong_type());
                }
            }
            FieldKind::OneOf(allowed) => {
                let literal = value.as_str().ok_or_else(wrong_type)?;
                if !allowed.contains(&literal) {
                    return Err(SchemaError::InvalidValue {
                        entity,
                        index,
                        field: spec.name,
                        value: literal.to_string(),
                        allowed,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deal_sim_core::{ImpactLevel, Severity};
    use serde_json::json;

    fn clause_json() -> Value {
        json!({
            "id": "c1",
            "category": "Investments",
            "sectionReference": "7.02(j)",
            "text": "Investments in Unrestricted Subsidiaries in an unlimited amount",
            "summary": "Uncapped investment basket"
        })
    }

    fn risk_json() -> Value {
        json!({
            "id": "r1",
            "title": "Unrestricted subsidiary drop-down",
            "category": "Unrestricted Subsidiaries",
            "description": "IP can leave the collateral package",
            "severity": "Critical",
            "affectedClauses": ["c1"],
            "ruleLogic": "Investments basket x Unrestricted Subsidiary definition",
            "ruleLabel": "J.CREW-01",
            "evidenceSnippet": "Investments in Unrestricted Subsidiaries in an unlimited amount",
            "scenarioTitle": "The IP Drop-Down",
            "scenarioNarrative": "Borrower moves trademarks to an unrestricted entity",
            "scenarioImpact": "Collateral stripped",
            "recoveryRisk": "High",
            "controlRisk": "Medium",
            "timingRisk": "Low",
            "adversarialHighlight": "in an unlimited amount"
        })
    }

    #[test]
    fn test_valid_payloads() {
        let clauses: Vec<Clause> = validate(&json!([clause_json()])).unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].section_reference, "7.02(j)");

        let risks: Vec<RiskRecord> = validate(&json!([risk_json()])).unwrap();
        assert_eq!(risks[0].severity, Severity::Critical);
        assert_eq!(risks[0].recovery_risk, ImpactLevel::High);
        assert_eq!(risks[0].affected_clauses, vec!["c1"]);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let risks: Vec<RiskRecord> = validate(&json!([])).unwrap();
        assert!(risks.is_empty());
    }

    #[test]
    fn test_not_an_array() {
        let err = validate::<Clause>(&json!({"clauses": []})).unwrap_err();
        assert_eq!(err, SchemaError::NotAnArray { entity: "Clause" });
    }

    #[test]
    fn test_missing_section_reference() {
        let mut clause = clause_json();
        clause.as_object_mut().unwrap().remove("sectionReference");

        let err = validate::<Clause>(&json!([clause_json(), clause])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingField {
                entity: "Clause",
                index: 1,
                field: "sectionReference"
            }
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let mut risk = risk_json();
        risk["evidenceSnippet"] = Value::Null;

        let err = validate::<RiskRecord>(&json!([risk])).unwrap_err();
        assert_eq!(err.field(), Some("evidenceSnippet"));
        assert!(matches!(err, SchemaError::MissingField { .. }));
    }

    #[test]
    fn test_wrong_types() {
        let mut risk = risk_json();
        risk["affectedClauses"] = json!("c1");
        let err = validate::<RiskRecord>(&json!([risk])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::WrongType {
                entity: "RiskRecord",
                index: 0,
                field: "affectedClauses",
                expected: "array of strings"
            }
        );

        let mut risk = risk_json();
        risk["affectedClauses"] = json!(["c1", 2]);
        assert!(validate::<RiskRecord>(&json!([risk])).is_err());

        let mut clause = clause_json();
        clause["id"] = json!(7);
        let err = validate::<Clause>(&json!([clause])).unwrap_err();
        assert_eq!(err.field(), Some("id"));

        let err = validate::<Clause>(&json!(["not a record"])).unwrap_err();
        assert_eq!(err.field(), Some("(record)"));
    }

    #[test]
    fn test_enum_literals_are_case_sensitive() {
        let mut risk = risk_json();
        risk["severity"] = json!("critical");

        let err = validate::<RiskRecord>(&json!([risk])).unwrap_err();
        match err {
            SchemaError::InvalidValue {
                field,
                value,
                allowed,
                ..
            } => {
                assert_eq!(field, "severity");
                assert_eq!(value, "critical");
                assert!(allowed.contains(&"Critical"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut risk = risk_json();
        risk["timingRisk"] = json!("Severe");
        let err = validate::<RiskRecord>(&json!([risk])).unwrap_err();
        assert_eq!(err.field(), Some("timingRisk"));
    }

    #[test]
    fn test_first_failure_wins() {
        let mut risk = risk_json();
        let object = risk.as_object_mut().unwrap();
        object.remove("title");
        object.insert("severity".to_string(), json!("Extreme"));

        let err = validate::<RiskRecord>(&json!([risk])).unwrap_err();
        assert_eq!(err.field(), Some("title"));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let mut clause = clause_json();
        clause["confidence"] = json!(0.93);
        let clauses: Vec<Clause> = validate(&json!([clause])).unwrap();
        assert_eq!(clauses[0].id, "c1");
    }
}
