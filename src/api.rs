use crate::error::ClientError;
use crate::models::*;
use failure::{Error, ResultExt};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One call against `<backend>/api`. `path` has no leading slash.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub token: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Moves requests to the service and back. Everything above this trait
/// is independent of the HTTP stack.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> Result<Response, Error>;
}

pub struct HttpTransport {
    client: Client,
    base: String,
}

impl HttpTransport {
    pub fn new(backend_url: &str) -> Result<HttpTransport, Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base = format!("{}/api", backend_url.trim_end_matches('/'));
        Ok(HttpTransport { client, base })
    }
}

impl HttpTransport {
    /// Turns a `Request` into the reqwest request `send` executes.
    pub fn build(&self, request: &Request) -> Result<reqwest::Request, Error> {
        let url = format!("{}/{}", self.base, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let built = builder
            .build()
            .with_context(|_| format!("bad request for `{}`", url))?;
        Ok(built)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response, Error> {
        let built = self.build(request)?;
        let url = built.url().to_string();
        let mut resp = self
            .client
            .execute(built)
            .with_context(|_| format!("could not reach `{}`", url))?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(Response { status, body })
    }
}

/// Typed access to every endpoint of the review service.
///
/// The bearer token lives here so that, once set, it rides along with
/// every subsequent request.
pub struct ApiClient<T> {
    transport: T,
    token: RwLock<Option<String>>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> ApiClient<T> {
        ApiClient {
            transport,
            token: RwLock::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_token(&self, token: Option<String>) {
        let mut slot = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = token;
    }

    pub fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<R, Error> {
        let request = Request {
            method,
            path,
            query,
            token: self.token(),
            body,
        };
        debug!(method = ?request.method, path = %request.path, "api request");
        let resp = self.transport.send(&request)?;
        if !(200..300).contains(&resp.status) {
            debug!(status = resp.status, path = %request.path, "api error");
            return Err(ClientError::Status {
                status: resp.status,
                detail: detail_of(&resp.body),
            }
            .into());
        }
        let parsed = serde_json::from_str(&resp.body)
            .with_context(|_| format!("unexpected body from `{}`", request.path))?;
        Ok(parsed)
    }

    fn get<R: DeserializeOwned>(&self, path: String) -> Result<R, Error> {
        self.call(Method::Get, path, Vec::new(), None)
    }

    fn get_with<R: DeserializeOwned>(&self, path: String, query: Vec<(String, String)>) -> Result<R, Error> {
        self.call(Method::Get, path, query, None)
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, path: String, body: &B) -> Result<R, Error> {
        self.call(Method::Post, path, Vec::new(), Some(serde_json::to_value(body)?))
    }

    fn put<B: Serialize, R: DeserializeOwned>(&self, path: String, body: &B) -> Result<R, Error> {
        self.call(Method::Put, path, Vec::new(), Some(serde_json::to_value(body)?))
    }

    pub fn register(&self, email: &str, username: &str, password: &str) -> Result<AuthToken, Error> {
        let body = Registration { email, username, password };
        self.post("auth/register".into(), &body)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthToken, Error> {
        self.post("auth/login".into(), &Credentials { email, password })
    }

    pub fn me(&self) -> Result<User, Error> {
        self.get("auth/me".into())
    }

    pub fn reviews(&self, skip: u32, limit: u32, category: Option<&str>) -> Result<Vec<Review>, Error> {
        let mut query = vec![
            ("skip".to_string(), skip.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        if let Some(category) = category {
            query.push(("category".to_string(), category.to_string()));
        }
        self.get_with("reviews".into(), query)
    }

    pub fn review(&self, id: &str) -> Result<Review, Error> {
        self.get(format!("reviews/{}", id))
    }

    pub fn create_review(&self, review: &NewReview) -> Result<Review, Error> {
        self.post("reviews".into(), review)
    }

    pub fn update_review(&self, id: &str, review: &NewReview) -> Result<Review, Error> {
        self.put(format!("reviews/{}", id), review)
    }

    pub fn delete_review(&self, id: &str) -> Result<(), Error> {
        let ack: Acknowledgement = self.call(Method::Delete, format!("reviews/{}", id), Vec::new(), None)?;
        debug!(message = %ack.message, "review deleted");
        Ok(())
    }

    pub fn add_collaborator(&self, review_id: &str, user_id: &str) -> Result<(), Error> {
        let path = format!("reviews/{}/collaborators/{}", review_id, user_id);
        let _: Acknowledgement = self.call(Method::Post, path, Vec::new(), None)?;
        Ok(())
    }

    pub fn comments(&self, review_id: &str) -> Result<Vec<Comment>, Error> {
        self.get(format!("reviews/{}/comments", review_id))
    }

    pub fn add_comment(&self, review_id: &str, content: &str) -> Result<Comment, Error> {
        self.post(format!("reviews/{}/comments", review_id), &NewComment { content })
    }

    pub fn toggle_like(&self, review_id: &str) -> Result<LikeState, Error> {
        self.call(Method::Post, format!("reviews/{}/like", review_id), Vec::new(), None)
    }

    pub fn liked(&self, review_id: &str) -> Result<bool, Error> {
        let state: LikeState = self.get(format!("reviews/{}/liked", review_id))?;
        Ok(state.liked)
    }

    pub fn categories(&self) -> Result<Vec<String>, Error> {
        let wrapped: Categories = self.get("categories".into())?;
        Ok(wrapped.categories)
    }

    pub fn popular_games(&self, limit: u32) -> Result<Vec<PopularGame>, Error> {
        let query = vec![("limit".to_string(), limit.to_string())];
        let wrapped: PopularGames = self.get_with("popular-games".into(), query)?;
        Ok(wrapped.popular_games)
    }

    pub fn search(&self, q: &str) -> Result<SearchResults, Error> {
        self.get_with("search".into(), vec![("q".to_string(), q.to_string())])
    }

    pub fn user(&self, id: &str) -> Result<User, Error> {
        self.get(format!("users/{}", id))
    }

    pub fn user_reviews(&self, id: &str) -> Result<Vec<Review>, Error> {
        self.get(format!("users/{}/reviews", id))
    }

    pub fn update_me(&self, update: &ProfileUpdate) -> Result<User, Error> {
        self.put("users/me".into(), update)
    }

    pub fn assist(&self, prompt: &str, context: Option<&str>) -> Result<String, Error> {
        let reply: AssistReply = self.post("ai/assist".into(), &AssistRequest { prompt, context })?;
        Ok(reply.suggestion)
    }

    pub fn explain(&self, word: &str, context: &str) -> Result<String, Error> {
        let reply: ExplainReply = self.post("ai/explain".into(), &ExplainRequest { word, context })?;
        Ok(reply.explanation)
    }
}

/// Pulls `detail` out of an error body. Validation errors carry a list
/// there, which is of no use to a reader.
fn detail_of(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(String::from)
}
