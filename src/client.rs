//! Roadmap Tracker API client
//!
//! Single point of contact with the roadmap service:
//! - owns the credential store (bearer token + cached profile)
//! - builds requests, attaching auth unless the caller opts out
//! - normalizes every outcome into a value or a [`ServiceError`]

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::storage::CredentialStore;
use crate::transport::{HttpRequest, Method, RequestBody, Transport};
use crate::types::{
    CareerGoals, CreateRoadmapRequest, Dashboard, RegisterRequest, Roadmap, SkillStatus,
    SkillStatusRecord, SkillStatusUpdate, User,
};

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Per-call options for [`ApiClient::request`].
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
    /// Skip the bearer header even when a token is stored.
    pub skip_auth: bool,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            body: None,
            headers: Vec::new(),
            skip_auth: false,
        }
    }

    pub fn post_json(body: impl Serialize) -> ServiceResult<Self> {
        Ok(Self {
            method: Method::Post,
            body: Some(RequestBody::Json(serde_json::to_value(body)?)),
            ..Self::get()
        })
    }

    pub fn patch_json(body: impl Serialize) -> ServiceResult<Self> {
        Ok(Self {
            method: Method::Patch,
            ..Self::post_json(body)?
        })
    }

    pub fn without_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            store,
        }
    }

    pub fn get_token(&self) -> ServiceResult<Option<String>> {
        Ok(self.store.token()?)
    }

    pub fn set_token(&self, token: &str) -> ServiceResult<()> {
        Ok(self.store.set_token(token)?)
    }

    /// Drop the token together with the cached profile.
    pub fn remove_token(&self) -> ServiceResult<()> {
        self.store.remove_token()?;
        self.store.remove_user()?;
        Ok(())
    }

    pub fn current_user(&self) -> ServiceResult<Option<User>> {
        Ok(self.store.user()?)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.store.token(), Ok(Some(_)))
    }

    pub fn logout(&self) -> ServiceResult<()> {
        self.remove_token()?;
        info!("Logged out");
        Ok(())
    }

    fn build_request(&self, endpoint: &str, options: RequestOptions) -> ServiceResult<HttpRequest> {
        let mut headers = vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())];
        if !options.skip_auth {
            if let Some(token) = self.store.token()? {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }
        for (name, value) in options.headers {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
                Some(existing) => existing.1 = value,
                None => headers.push((name, value)),
            }
        }

        Ok(HttpRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, endpoint),
            headers,
            body: options.body,
        })
    }

    /// Issue a call and return the parsed JSON body unchanged.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> ServiceResult<Value> {
        let (_, body) = self.exchange(endpoint, options).await?;
        Ok(body)
    }

    async fn exchange(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ServiceResult<(u16, Value)> {
        let request = self.build_request(endpoint, options)?;
        let method = request.method;
        debug!(%method, endpoint, "Sending request");

        let transport = Arc::clone(&self.transport);
        let outcome = tokio::task::spawn_blocking(move || transport.send(&request))
            .await
            .map_err(|e| ServiceError::NetworkError(format!("request task failed: {}", e)))?;

        let response = outcome.map_err(|e| {
            warn!(%method, endpoint, error = %e, "Network error");
            ServiceError::NetworkError(e.to_string())
        })?;

        let status = response.status;
        let body: Value = serde_json::from_str(&response.body).map_err(|e| {
            warn!(%method, endpoint, status, error = %e, "Unparseable response body");
            ServiceError::MalformedResponse { status }
        })?;

        if !response.is_success() {
            let message = error_message(&body, status);
            warn!(%method, endpoint, status, %message, "API error");
            return Err(ServiceError::ApiError { status, message });
        }

        debug!(%method, endpoint, status, "Request succeeded");
        Ok((status, body))
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ServiceResult<T> {
        let (status, body) = self.exchange(endpoint, options).await?;
        serde_json::from_value(body).map_err(|e| {
            warn!(endpoint, status, error = %e, "Response did not match the expected shape");
            ServiceError::MalformedResponse { status }
        })
    }

    /// Form-encoded login. Stores the token, then fetches and stores the
    /// profile; returns the raw login response.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<Value> {
        let options = RequestOptions {
            method: Method::Post,
            body: Some(RequestBody::Form(vec![
                ("username".to_string(), username.to_string()),
                ("password".to_string(), password.to_string()),
            ])),
            ..RequestOptions::get()
        }
        .without_auth()
        .header("Content-Type", FORM_CONTENT_TYPE);

        let (status, response) = self.exchange("/auth/login", options).await?;
        let token = response
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                warn!(status, "Login response carried no access_token");
                ServiceError::MalformedResponse { status }
            })?;
        self.set_token(token)?;

        match self.get_me().await {
            Ok(user) => self.store.set_user(&user)?,
            Err(e) => {
                // Never keep a token without its profile.
                self.remove_token()?;
                return Err(e);
            }
        }

        info!(username, "Logged in");
        Ok(response)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> ServiceResult<Value> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.map(str::to_string),
        };
        self.request("/auth/register", RequestOptions::post_json(&body)?.without_auth())
            .await
    }

    pub async fn get_me(&self) -> ServiceResult<User> {
        self.request_as("/auth/me", RequestOptions::get()).await
    }

    pub async fn get_career_goals(&self) -> ServiceResult<CareerGoals> {
        self.request_as("/career-goals", RequestOptions::get().without_auth())
            .await
    }

    pub async fn create_roadmap(&self, body: &CreateRoadmapRequest) -> ServiceResult<Roadmap> {
        let roadmap: Roadmap = self
            .request_as("/roadmaps/create", RequestOptions::post_json(body)?)
            .await?;
        info!(
            career_goal = %roadmap.career_goal,
            skills = roadmap.skills.len(),
            "Roadmap created"
        );
        Ok(roadmap)
    }

    pub async fn get_my_roadmaps(&self) -> ServiceResult<Vec<Roadmap>> {
        self.request_as("/roadmaps/my-roadmaps", RequestOptions::get())
            .await
    }

    /// Keyed by the skill's `status_id`, not its id.
    pub async fn update_skill_status(
        &self,
        status_id: i64,
        status: SkillStatus,
    ) -> ServiceResult<SkillStatusRecord> {
        let endpoint = format!("/skills/{}/update", status_id);
        self.request_as(
            &endpoint,
            RequestOptions::patch_json(SkillStatusUpdate { status })?,
        )
        .await
    }

    pub async fn get_dashboard(&self) -> ServiceResult<Dashboard> {
        self.request_as("/dashboard", RequestOptions::get()).await
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &Value, status: u16) -> String {
    let from_detail = match body.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    };

    from_detail
        .or_else(|| {
            body.get("message")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("request failed: {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CredentialStore;
    use crate::testing::Harness;
    use crate::types::fixtures;
    use serde_json::json;

    fn roadmap_json() -> Value {
        json!({
            "id": 1, "user_id": 1, "career_goal": "Web Developer",
            "learning_level": "Beginner", "existing_skills": ["HTML"],
            "created_at": "2024-01-01 00:00:00", "progress_percentage": 0.0,
            "skills": [{
                "id": 10, "skill_name": "HTML Basics", "learning_stage": "Beginner",
                "order_index": 0, "why_important": "Foundation", "estimated_hours": 10,
                "status": "NOT_STARTED", "status_id": 77
            }]
        })
    }

    #[tokio::test]
    async fn request_attaches_json_content_type_and_bearer() {
        let h = Harness::logged_in();
        h.transport.reply(200, json!({"ok": true}));

        let body = h.ctx.client().request("/anything", RequestOptions::get()).await.unwrap();
        assert_eq!(body, json!({"ok": true}));

        let sent = &h.transport.requests()[0];
        assert_eq!(sent.url, "http://roadmap.test/anything");
        assert_eq!(sent.header("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(sent.header("authorization"), Some("Bearer token-123"));
    }

    #[tokio::test]
    async fn request_without_auth_omits_bearer() {
        let h = Harness::logged_in();
        h.transport.reply(200, json!({"career_goals": ["Web Developer"]}));

        let goals = h.ctx.client().get_career_goals().await.unwrap();
        assert_eq!(goals.career_goals, vec!["Web Developer".to_string()]);
        assert_eq!(h.transport.requests()[0].header("authorization"), None);
    }

    #[tokio::test]
    async fn error_status_uses_service_detail() {
        let h = Harness::logged_in();
        h.transport
            .reply(404, json!({"detail": "Skill status not found"}));

        let err = h.ctx.client().update_skill_status(9, SkillStatus::Completed).await.unwrap_err();
        match err {
            ServiceError::ApiError { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Skill status not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_falls_back_to_message_then_generic() {
        let h = Harness::logged_in();
        h.transport
            .reply(400, json!({"message": "Bad input"}))
            .reply(503, json!({"unexpected": true}));

        let first = h.ctx.client().get_dashboard().await.unwrap_err();
        assert_eq!(first.to_string(), "Bad input");
        let second = h.ctx.client().get_dashboard().await.unwrap_err();
        assert_eq!(second.to_string(), "request failed: 503");
    }

    #[tokio::test]
    async fn validation_detail_lists_are_joined() {
        let h = Harness::logged_in();
        h.transport.reply(
            422,
            json!({"detail": [
                {"loc": ["body", "status"], "msg": "string does not match regex", "type": "value_error"},
                {"loc": ["body"], "msg": "field required", "type": "value_error"}
            ]}),
        );

        let err = h.ctx.client().get_dashboard().await.unwrap_err();
        assert_eq!(err.to_string(), "string does not match regex; field required");
    }

    #[tokio::test]
    async fn unparseable_body_is_malformed_with_status() {
        let h = Harness::logged_in();
        h.transport.reply_raw(502, "<html>Bad Gateway</html>");

        let err = h.ctx.client().get_dashboard().await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedResponse { status: 502 }));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let h = Harness::logged_in();
        h.transport.fail("connection refused");

        let err = h.ctx.client().get_my_roadmaps().await.unwrap_err();
        assert!(matches!(err, ServiceError::NetworkError(ref m) if m.contains("connection refused")));
    }

    #[tokio::test]
    async fn login_is_form_encoded_and_stores_token_then_profile() {
        let h = Harness::new();
        h.transport
            .reply(200, json!({"access_token": "jwt-1", "token_type": "bearer"}))
            .reply(200, json!({"id": 1, "username": "demo_user", "email": "demo@example.com"}));

        let raw = h.ctx.client().login("demo_user", "demo123").await.unwrap();
        assert_eq!(raw["token_type"], "bearer");

        let requests = h.transport.requests();
        assert_eq!(requests[0].header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(requests[0].header("authorization"), None);
        assert_eq!(
            requests[0].body,
            Some(RequestBody::Form(vec![
                ("username".to_string(), "demo_user".to_string()),
                ("password".to_string(), "demo123".to_string()),
            ]))
        );
        assert_eq!(requests[1].header("authorization"), Some("Bearer jwt-1"));
        assert_eq!(h.transport.paths(), vec!["POST /auth/login", "GET /auth/me"]);

        assert_eq!(h.store.token().unwrap().as_deref(), Some("jwt-1"));
        assert_eq!(h.store.user().unwrap().map(|u| u.username), Some("demo_user".to_string()));
    }

    #[tokio::test]
    async fn failed_login_stores_nothing() {
        let h = Harness::new();
        h.transport
            .reply(401, json!({"detail": "Incorrect username or password"}));

        let err = h.ctx.client().login("demo_user", "wrong1").await.unwrap_err();
        assert_eq!(err.to_string(), "Incorrect username or password");
        assert_eq!(h.store.snapshot().token, None);
        assert_eq!(h.store.snapshot().user, None);
    }

    #[tokio::test]
    async fn profile_failure_after_login_drops_the_token() {
        let h = Harness::new();
        h.transport
            .reply(200, json!({"access_token": "jwt-1", "token_type": "bearer"}))
            .fail("connection reset");

        let err = h.ctx.client().login("demo_user", "demo123").await.unwrap_err();
        assert!(matches!(err, ServiceError::NetworkError(_)));
        assert_eq!(h.store.snapshot().token, None);
        assert_eq!(h.store.snapshot().user, None);
    }

    #[tokio::test]
    async fn register_sends_json_without_auth_and_stores_nothing() {
        let h = Harness::new();
        h.transport.reply(201, json!({"id": 5, "username": "newbie", "email": null}));

        h.ctx.client().register("newbie", "secret1", None).await.unwrap();

        let sent = &h.transport.requests()[0];
        assert_eq!(sent.header("authorization"), None);
        assert_eq!(
            sent.body,
            Some(RequestBody::Json(json!({"username": "newbie", "password": "secret1"})))
        );
        assert_eq!(h.store.snapshot().token, None);
    }

    #[tokio::test]
    async fn domain_calls_use_documented_endpoints() {
        let h = Harness::logged_in();
        h.transport
            .reply(201, roadmap_json())
            .reply(200, json!([roadmap_json()]))
            .reply(200, json!({"id": 77, "skill_id": 10, "status": "COMPLETED", "updated_at": "now"}))
            .reply(200, json!({"user": {"id": 1, "username": "demo_user"}, "roadmaps": [roadmap_json()]}));

        let client = h.ctx.client();
        let created = client
            .create_roadmap(&CreateRoadmapRequest {
                career_goal: "Web Developer".into(),
                learning_level: "Beginner".into(),
                existing_skills: vec!["HTML".into()],
            })
            .await
            .unwrap();
        assert_eq!(created.skills[0].status_id, 77);
        assert_eq!(client.get_my_roadmaps().await.unwrap().len(), 1);
        let record = client.update_skill_status(77, SkillStatus::Completed).await.unwrap();
        assert_eq!(record.status, SkillStatus::Completed);
        let dashboard = client.get_dashboard().await.unwrap();
        assert_eq!(dashboard.roadmaps[0].skills.len(), 1);

        assert_eq!(
            h.transport.paths(),
            vec![
                "POST /roadmaps/create",
                "GET /roadmaps/my-roadmaps",
                "PATCH /skills/77/update",
                "GET /dashboard",
            ]
        );
        assert_eq!(
            h.transport.requests()[2].body,
            Some(RequestBody::Json(json!({"status": "COMPLETED"})))
        );
    }

    #[tokio::test]
    async fn unexpected_shape_is_malformed() {
        let h = Harness::logged_in();
        h.transport.reply(200, json!({"roadmaps": "nope"}));

        let err = h.ctx.client().get_dashboard().await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedResponse { .. }));
    }

    #[test]
    fn remove_token_clears_cached_profile() {
        let h = Harness::logged_in();
        assert_eq!(h.ctx.client().current_user().unwrap(), Some(fixtures::user()));
        h.ctx.client().remove_token().unwrap();
        assert!(!h.ctx.client().is_authenticated());
        assert_eq!(h.ctx.client().current_user().unwrap(), None);
    }
}
