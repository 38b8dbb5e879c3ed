use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

/// Flattens nested `validator` errors into their messages, falling back to
/// `"<field>: <code>"` when a rule carries no message.
pub fn validation_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    use validator::ValidationErrorsKind;

    let mut messages = Vec::new();
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    messages.push(match &err.message {
                        Some(msg) => msg.to_string(),
                        None => format!("{}: {}", field, err.code),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => messages.extend(validation_messages(inner)),
            ValidationErrorsKind::List(entries) => {
                for inner in entries.values() {
                    messages.extend(validation_messages(inner));
                }
            }
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Line {
        #[validate(range(min = 1.0, message = "Quantity must be at least 1"))]
        quantity: f64,
    }

    #[derive(Validate)]
    struct Sheet {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(nested)]
        lines: Vec<Line>,
    }

    #[test]
    fn test_validation_messages_flattens_nested_lists() {
        let sheet = Sheet {
            name: String::new(),
            lines: vec![Line { quantity: 2.0 }, Line { quantity: 0.0 }],
        };
        let errors = sheet.validate().unwrap_err();
        let messages = validation_messages(&errors);

        assert_eq!(messages.len(), 2);
        assert!(messages.contains(&"Name is required".to_string()));
        assert!(messages.contains(&"Quantity must be at least 1".to_string()));
    }
}
