//! Credentials for opening a backend session.

use serde_json::json;

/// Exactly one method is used per session
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialProvider {
    /// Long-lived user token, sent in the `initSession` body
    UserToken { token: String },
    /// Username and password, sent as HTTP basic auth
    BasicAuth { username: String, password: String },
}

impl CredentialProvider {
    pub fn method_name(&self) -> &'static str {
        match self {
            CredentialProvider::UserToken { .. } => "user_token",
            CredentialProvider::BasicAuth { .. } => "basic_auth",
        }
    }

    /// Attach the credentials to an `initSession` request
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            CredentialProvider::UserToken { token } => {
                request.json(&json!({ "user_token": token }))
            }
            CredentialProvider::BasicAuth { username, password } => {
                request.basic_auth(username, Some(password))
            }
        }
    }
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialProvider::UserToken { token } => f
                .debug_struct("UserToken")
                .field("token", &super::mask_secret(token))
                .finish(),
            CredentialProvider::BasicAuth { username, .. } => f
                .debug_struct("BasicAuth")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_prints_secrets() {
        let token = CredentialProvider::UserToken {
            token: "abcdefghijklmnop".into(),
        };
        let basic = CredentialProvider::BasicAuth {
            username: "glpi".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{:?}", token).contains("ijklmnop"));
        let rendered = format!("{:?}", basic);
        assert!(rendered.contains("glpi"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(basic.method_name(), "basic_auth");
    }
}
