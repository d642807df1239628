use crate::error::{PainError, Result};

/// A decoded command vector: `[credential, domain, operationCode, ...arguments]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Empty for operations authenticated by other means.
    pub credential: String,
    pub domain: String,
    pub operation_code: i64,
    pub arguments: Vec<String>,
}

impl Command {
    /// Validates the structural shape of a command vector.
    ///
    /// Fails when fewer than three fields are present or the operation code is
    /// not an integer. Arguments are left untouched.
    pub fn decode<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
        let [credential, domain, code, arguments @ ..] = fields else {
            return Err(PainError::ValidationError(format!(
                "Command needs credential, domain and operation code, got {} field(s)",
                fields.len()
            )));
        };
        let code = code.as_ref().trim();
        let operation_code = code.parse::<i64>().map_err(|_| {
            PainError::ValidationError(format!("Operation code '{code}' is not an integer"))
        })?;
        Ok(Self {
            credential: credential.as_ref().to_string(),
            domain: domain.as_ref().trim().to_string(),
            operation_code,
            arguments: arguments.iter().map(|a| a.as_ref().to_string()).collect(),
        })
    }
}
