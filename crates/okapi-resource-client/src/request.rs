//! Backend request descriptions.

use serde_json::Value;

const HEADER_ACCEPT: &str = "Accept";
const HEADER_CONTENT_TYPE: &str = "Content-Type";
const MIMETYPE_JSON: &str = "application/json";

/// HTTP verbs the gateway uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Tenant and token a call is made on behalf of.
///
/// Supplied by the session; the request builders only carry it along.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub tenant: String,
    pub token: Option<String>,
}

impl AuthContext {
    pub fn new(tenant: impl Into<String>, token: Option<String>) -> Self {
        Self {
            tenant: tenant.into(),
            token,
        }
    }
}

/// One backend call: verb, path relative to the Okapi root, headers, body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    method: HttpMethod,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    auth: AuthContext,
}

impl ResourceRequest {
    /// A JSON GET.
    pub fn get(path: impl Into<String>, auth: AuthContext) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            headers: vec![(HEADER_ACCEPT.to_string(), MIMETYPE_JSON.to_string())],
            body: None,
            auth,
        }
    }

    /// A JSON POST.
    pub fn post(path: impl Into<String>, body: Value, auth: AuthContext) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            headers: vec![
                (HEADER_ACCEPT.to_string(), MIMETYPE_JSON.to_string()),
                (HEADER_CONTENT_TYPE.to_string(), MIMETYPE_JSON.to_string()),
            ],
            body: Some(body),
            auth,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }
}

/// Percent-encode a CQL query for use in a path.
pub fn encode_query(query: &str) -> String {
    urlencoding::encode(query).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_requests_accept_json() {
        let request = ResourceRequest::get("/users", AuthContext::new("diku", None));
        assert_eq!(request.method(), HttpMethod::Get);
        assert_eq!(request.path(), "/users");
        assert!(request.body().is_none());
        assert!(request
            .headers()
            .iter()
            .any(|(name, value)| name == "Accept" && value == "application/json"));
    }

    #[test]
    fn post_requests_carry_body() {
        let request = ResourceRequest::post(
            "/accounts-bulk/pay",
            serde_json::json!({ "amount": "1.00" }),
            AuthContext::new("diku", Some("token".to_string())),
        );
        assert_eq!(request.method(), HttpMethod::Post);
        assert_eq!(request.body().unwrap()["amount"], "1.00");
        assert_eq!(request.auth().token.as_deref(), Some("token"));
    }

    #[test]
    fn encode_query_escapes_cql() {
        assert_eq!(encode_query("userId==abc"), "userId%3D%3Dabc");
        assert_eq!(
            encode_query("(userId==1 and status.name==Open)"),
            "%28userId%3D%3D1%20and%20status.name%3D%3DOpen%29"
        );
    }
}
