use serde::{Deserialize, Serialize};

/// A single validation failure, either bound to a request field or to the
/// request object as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationError {
    Field {
        field: String,
        #[serde(rename = "defaultMessage")]
        default_message: String,
    },
    Object {
        object: String,
        #[serde(rename = "defaultMessage")]
        default_message: String,
    },
}

impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            default_message: message.into(),
        }
    }

    pub fn object(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Object {
            object: object.into(),
            default_message: message.into(),
        }
    }
}

/// Body returned by every error response and by a few plain acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenericResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    pub fn with_error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(error.into()),
        }
    }

    /// The message is the JSON array of `errors`, in input order.
    pub fn from_validation_errors(errors: &[ValidationError], error: impl Into<String>) -> Self {
        Self {
            message: validation_message(errors),
            error: Some(error.into()),
        }
    }
}

fn validation_message(errors: &[ValidationError]) -> String {
    // Serializing plain strings into a Vec cannot fail.
    serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_error_list_renders_empty_array() {
        let response = GenericResponse::from_validation_errors(&[], "validation_failed");
        assert_eq!(response.message, "[]");
        assert_eq!(response.error.as_deref(), Some("validation_failed"));
    }

    #[test]
    fn field_error_renders_field_and_default_message() {
        let errors = [ValidationError::field("username", "must not be blank")];
        let response = GenericResponse::from_validation_errors(&errors, "validation_failed");
        assert_eq!(
            response.message,
            r#"[{"field":"username","defaultMessage":"must not be blank"}]"#
        );
    }

    #[test]
    fn object_errors_keep_input_order() {
        let errors = [
            ValidationError::object("passwordRegistration", "passwords do not match"),
            ValidationError::field("password", "too short"),
        ];
        let response = GenericResponse::from_validation_errors(&errors, "validation_failed");
        assert_eq!(
            response.message,
            r#"[{"object":"passwordRegistration","defaultMessage":"passwords do not match"},{"field":"password","defaultMessage":"too short"}]"#
        );
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        let errors = [ValidationError::field("displayName", r#"must not contain "quotes""#)];
        let response = GenericResponse::from_validation_errors(&errors, "validation_failed");

        let parsed: Vec<ValidationError> = serde_json::from_str(&response.message).unwrap();
        assert_eq!(parsed, errors);
    }

    #[test]
    fn plain_message_omits_error_field() {
        let json = serde_json::to_string(&GenericResponse::new("success")).unwrap();
        assert_eq!(json, r#"{"message":"success"}"#);
    }
}
