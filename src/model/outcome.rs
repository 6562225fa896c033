use serde::Serialize;

/// Result of a provider or workflow step.
///
/// Expected failures (missing item, wrong column, transport error) are
/// reported through `success == false` rather than an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: None,
            error: None,
        }
    }

    pub fn ok_with_output(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::ok(message)
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
            error: None,
        }
    }

    /// Failure carrying the provider's raw error text.
    pub fn failed_with_error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::failed(message)
        }
    }

    /// Builds a failure from a transport error, e.g. `"Error adding label: ..."`.
    pub fn from_transport(action: &str, err: &anyhow::Error) -> Self {
        let detail = format!("{err:#}");
        Self::failed_with_error(format!("Error {action}: {detail}"), detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_keeps_raw_error() {
        let err = anyhow::anyhow!("HTTP 404: Not Found");
        let result = OperationResult::from_transport("adding label", &err);
        assert!(!result.success);
        assert_eq!(result.message, "Error adding label: HTTP 404: Not Found");
        assert_eq!(result.error.as_deref(), Some("HTTP 404: Not Found"));
    }

    #[test]
    fn output_is_omitted_when_absent() {
        let json = serde_json::to_string(&OperationResult::ok("done")).unwrap();
        assert!(!json.contains("output"));
        let json =
            serde_json::to_string(&OperationResult::ok_with_output("made", "F/1/x")).unwrap();
        assert!(json.contains("F/1/x"));
    }
}
