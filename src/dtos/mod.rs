use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::errors::{AppError, Result};

pub mod admin_dtos;
pub mod auth_dtos;
pub mod match_dtos;
pub mod prediction_dtos;
pub mod question_dtos;
pub mod team_dtos;

/// One problem with one field of a request, optionally inside a batch.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(index: Option<usize>, field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            index,
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn field_errors(errors: &ValidationErrors, index: Option<usize>) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                index,
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

pub fn validate<T: Validate>(payload: &T) -> Result<()> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidFields(field_errors(&e, None)))
}

/// Parses and validates every item of an uploaded JSON array. All problems
/// are collected; a single bad item rejects the whole batch.
pub fn parse_batch<T>(items: Vec<Value>) -> std::result::Result<Vec<T>, Vec<FieldError>>
where
    T: DeserializeOwned + Validate,
{
    if items.is_empty() {
        return Err(vec![FieldError::new(None, "items", "upload is empty")]);
    }

    let mut parsed = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(value) => match value.validate() {
                Ok(()) => parsed.push(value),
                Err(e) => errors.extend(field_errors(&e, Some(index))),
            },
            Err(e) => errors.push(FieldError::new(Some(index), "item", e.to_string())),
        }
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

/// Document ids are single path segments.
pub fn check_document_id(id: &str, field: &str) -> Result<()> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.len() > 128 || trimmed.contains('/') || trimmed == "." || trimmed == ".." {
        return Err(AppError::InvalidFields(vec![FieldError::new(
            None,
            field,
            "must be a non-empty id without '/'",
        )]));
    }
    Ok(())
}

/// Ids chosen for new documents are limited to ASCII letters, digits and
/// `-`. Prediction ids join user, match and target ids with `_`, so none of
/// the joined parts may contain one.
pub fn check_new_id(id: &str, field: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err(AppError::InvalidFields(vec![FieldError::new(
            None,
            field,
            "must use only letters, digits and '-'",
        )]));
    }
    Ok(())
}

/// Uses the supplied id or generates one.
pub fn document_id_or_new(id: Option<&str>) -> Result<String> {
    match id {
        Some(id) => {
            let id = id.trim();
            check_new_id(id, "id")?;
            Ok(id.to_string())
        }
        None => Ok(uuid::Uuid::new_v4().simple().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::team_dtos::CreateTeamRequest;
    use serde_json::json;

    #[test]
    fn batch_errors_carry_item_index() {
        let items = vec![
            json!({ "name": "Chennai Super Kings", "shortName": "CSK" }),
            json!({ "name": "", "shortName": "MI" }),
            json!({ "shortName": 7 }),
        ];
        let errors = parse_batch::<CreateTeamRequest>(items).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].index, Some(1));
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].index, Some(2));
        assert_eq!(errors[1].field, "item");
    }

    #[test]
    fn valid_batch_parses() {
        let items = vec![json!({ "id": "rr", "name": "Rajasthan Royals", "shortName": "RR" })];
        let teams = parse_batch::<CreateTeamRequest>(items).unwrap();
        assert_eq!(teams[0].id.as_deref(), Some("rr"));
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(parse_batch::<CreateTeamRequest>(Vec::new()).is_err());
    }

    #[test]
    fn document_ids() {
        assert!(check_document_id("csk", "id").is_ok());
        assert!(check_document_id("a/b", "id").is_err());
        assert!(check_document_id(" ", "id").is_err());
        assert_eq!(document_id_or_new(Some(" gt ")).unwrap(), "gt");
        assert_eq!(document_id_or_new(Some("final-2026")).unwrap(), "final-2026");
        assert_eq!(document_id_or_new(None).unwrap().len(), 32);
    }

    #[test]
    fn new_ids_cannot_break_composite_keys() {
        for id in ["q_1", "a?b", "a#b", "100%", "a b", "ünï"] {
            assert!(document_id_or_new(Some(id)).is_err(), "{} was accepted", id);
        }
    }
}
