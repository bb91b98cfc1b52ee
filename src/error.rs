use failure::{Error, Fail};

/// Shown when nothing more specific is known about a failure.
pub const GENERIC_FAILURE: &str = "Something went wrong!";

#[derive(Debug, Fail)]
pub enum ClientError {
    #[fail(display = "server answered {}", status)]
    Status { status: u16, detail: Option<String> },
    #[fail(display = "{}", _0)]
    Invalid(String),
    #[fail(display = "sign in first")]
    SignInRequired,
}

impl ClientError {
    pub fn invalid(msg: impl Into<String>) -> Error {
        ClientError::Invalid(msg.into()).into()
    }
}

/// True when the server rejected our credentials.
pub fn is_unauthorized(err: &Error) -> bool {
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::Status { status: 401, .. }) => true,
        _ => false,
    }
}

/// Turns an error into the single line a user gets to see.
pub fn notice(err: &Error, fallback: &str) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::Status { detail: Some(detail), .. }) => detail.clone(),
        Some(ClientError::Invalid(msg)) => msg.clone(),
        Some(ClientError::SignInRequired) => String::from("Please sign in first."),
        _ => String::from(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use failure::format_err;

    #[test]
    fn notice_prefers_server_detail() {
        let err: Error = ClientError::Status {
            status: 400,
            detail: Some("Username already taken".into()),
        }
        .into();
        assert_eq!(notice(&err, GENERIC_FAILURE), "Username already taken");
    }

    #[test]
    fn notice_falls_back() {
        let err: Error = ClientError::Status { status: 500, detail: None }.into();
        assert_eq!(notice(&err, "Could not save."), "Could not save.");
        let err = format_err!("connection reset");
        assert_eq!(notice(&err, GENERIC_FAILURE), GENERIC_FAILURE);
    }

    #[test]
    fn detects_unauthorized() {
        let err: Error = ClientError::Status { status: 401, detail: None }.into();
        assert!(is_unauthorized(&err));
        assert!(!is_unauthorized(&ClientError::invalid("nope")));
    }
}
