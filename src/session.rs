use crate::api::{ApiClient, Transport};
use crate::db::TokenStore;
use crate::error::ClientError;
use crate::models::{AuthToken, User};
use failure::Error;
use std::sync::Arc;
use tracing::{debug, warn};

/// Who is signed in, and the means to change that.
///
/// A session is created once by the front-end and handed to whatever needs
/// it. Until `start` has run it reports itself as loading.
pub struct Session<T> {
    api: Arc<ApiClient<T>>,
    store: TokenStore,
    user: Option<User>,
    loading: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(api: Arc<ApiClient<T>>, store: TokenStore) -> Session<T> {
        Session {
            api,
            store,
            user: None,
            loading: true,
        }
    }

    /// Restores a stored session. A token the server no longer accepts, or
    /// any other failure to fetch the profile, ends in a quiet logout.
    pub fn start(&mut self) -> Result<(), Error> {
        let result = self.restore();
        self.loading = false;
        result
    }

    fn restore(&mut self) -> Result<(), Error> {
        let token = match self.store.load()? {
            Some(token) => token,
            None => return Ok(()),
        };
        self.api.set_token(Some(token));
        match self.api.me() {
            Ok(user) => {
                debug!(user = %user.username, "session restored");
                self.user = Some(user);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch current user, logging out");
                self.logout()
            }
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<&User, Error> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ClientError::invalid("Email and password are required."));
        }
        let auth = self.api.login(email.trim(), password)?;
        self.accept(auth)
    }

    pub fn register(&mut self, email: &str, username: &str, password: &str) -> Result<&User, Error> {
        if email.trim().is_empty() || username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::invalid("Email, username and password are required."));
        }
        let auth = self.api.register(email.trim(), username.trim(), password)?;
        self.accept(auth)
    }

    fn accept(&mut self, auth: AuthToken) -> Result<&User, Error> {
        self.store.save(&auth.access_token)?;
        self.api.set_token(Some(auth.access_token));
        Ok(self.user.insert(auth.user))
    }

    pub fn logout(&mut self) -> Result<(), Error> {
        self.user = None;
        self.api.set_token(None);
        self.store.clear()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Gate for protected actions. Front-ends send the user to sign in
    /// when this fails.
    pub fn require_user(&self) -> Result<&User, Error> {
        match &self.user {
            Some(user) => Ok(user),
            None => Err(ClientError::SignInRequired.into()),
        }
    }

    pub fn replace_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn api(&self) -> &Arc<ApiClient<T>> {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::testing::{sample_user, to_json, FakeTransport};
    use serde_json::json;

    fn session_with(token: Option<&str>) -> Session<FakeTransport> {
        let store = TokenStore::in_memory().unwrap();
        if let Some(token) = token {
            store.save(token).unwrap();
        }
        Session::new(Arc::new(ApiClient::new(FakeTransport::new())), store)
    }

    fn fake(session: &Session<FakeTransport>) -> &FakeTransport {
        session.api().transport()
    }

    #[test]
    fn start_without_token_skips_profile_fetch() {
        let mut session = session_with(None);
        assert!(session.is_loading());
        session.start().unwrap();
        assert!(!session.is_loading());
        assert!(session.user().is_none());
        assert!(fake(&session).calls().is_empty());
    }

    #[test]
    fn stored_token_fetches_profile() {
        let mut session = session_with(Some("saved"));
        fake(&session).on(Method::Get, "auth/me", 200, to_json(&sample_user("u1")));
        session.start().unwrap();

        assert_eq!(session.user().map(|u| u.id.as_str()), Some("u1"));
        let calls = fake(&session).calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "auth/me");
        assert_eq!(calls[0].token.as_ref().map(String::as_str), Some("saved"));
    }

    #[test]
    fn rejected_token_logs_out_quietly() {
        let mut session = session_with(Some("expired"));
        fake(&session).on(
            Method::Get,
            "auth/me",
            401,
            json!({"detail": "Could not validate credentials"}),
        );
        session.start().unwrap();

        assert!(!session.is_loading());
        assert!(session.user().is_none());
        assert_eq!(session.api().token(), None);
        assert_eq!(session.store.load().unwrap(), None);
    }

    #[test]
    fn login_persists_token_and_user() {
        let mut session = session_with(None);
        fake(&session).on(
            Method::Post,
            "auth/login",
            200,
            json!({"access_token": "fresh", "token_type": "bearer", "user": to_json(&sample_user("u7"))}),
        );
        session.start().unwrap();
        let name = session.login("u7@example.com", "hunter2").unwrap().username.clone();

        assert_eq!(name, "player_u7");
        assert_eq!(session.api().token(), Some("fresh".to_string()));
        assert_eq!(session.store.load().unwrap(), Some("fresh".to_string()));
        let body = fake(&session).calls()[0].body.clone().unwrap();
        assert_eq!(body, json!({"email": "u7@example.com", "password": "hunter2"}));
    }

    #[test]
    fn empty_credentials_never_reach_the_server() {
        let mut session = session_with(None);
        assert!(session.login("", "secret").is_err());
        assert!(session.register("a@b.c", "  ", "secret").is_err());
        assert!(fake(&session).calls().is_empty());
    }

    #[test]
    fn failed_login_keeps_signed_out_state() {
        let mut session = session_with(None);
        fake(&session).on(Method::Post, "auth/login", 401, json!({"detail": "Incorrect email or password"}));
        assert!(session.login("a@b.c", "wrong").is_err());
        assert!(session.user().is_none());
        assert_eq!(session.api().token(), None);
    }

    #[test]
    fn logout_clears_everything() {
        let mut session = session_with(Some("saved"));
        fake(&session).on(Method::Get, "auth/me", 200, to_json(&sample_user("u1")));
        session.start().unwrap();
        session.logout().unwrap();

        assert!(session.user().is_none());
        assert!(session.require_user().is_err());
        assert_eq!(session.api().token(), None);
        assert_eq!(session.store.load().unwrap(), None);
    }
}
