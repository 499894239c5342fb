//! Loans and renewals.

use crate::models::{collection, Loan};
use crate::{SessionData, UsersRepository};
use okapi_resource_client::{encode_query, ResourceProvider, ResourceRequest};
use serde_json::json;
use sip2_protocol_types::{RenewAllRequest, RenewAllResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOANS_KEY: &str = "loans";
const OPEN_LOANS_LIMIT: usize = 1000;

/// Talks to the circulation endpoints.
#[derive(Clone)]
pub struct CirculationRepository {
    provider: Arc<dyn ResourceProvider>,
    users: UsersRepository,
}

impl CirculationRepository {
    pub fn new(provider: Arc<dyn ResourceProvider>, users: UsersRepository) -> Self {
        Self { provider, users }
    }

    /// A user's open loans, or `None` if they could not be read.
    pub async fn get_open_loans_by_user_id(
        &self,
        user_id: &str,
        session: &SessionData,
    ) -> Option<Vec<Loan>> {
        debug_assert!(!user_id.is_empty(), "user id must not be empty");
        if user_id.is_empty() {
            return None;
        }

        let path = format!(
            "/circulation/loans?query={}&limit={}",
            encode_query(&format!("(userId=={} and status.name=Open)", user_id)),
            OPEN_LOANS_LIMIT
        );
        let request = ResourceRequest::get(path, session.auth());
        match self.provider.retrieve_resource(&request).await {
            Ok(resource) => collection(&resource, LOANS_KEY),
            Err(e) => {
                warn!(error = %e, "Open loan read failed");
                None
            }
        }
    }

    /// Renew every open loan of the patron, one at a time.
    ///
    /// A failed renewal lands the item in the unrenewed list and the loop
    /// carries on.
    pub async fn perform_renew_all_command(
        &self,
        request: &RenewAllRequest,
        session: &SessionData,
    ) -> RenewAllResponse {
        let Some(user) = self
            .users
            .get_user_by_identifier(request.patron_identifier(), session)
            .await
        else {
            let screen_messages = vec!["Patron not found".to_string()];
            return renew_all_response(request, session, false, Vec::new(), Vec::new(), screen_messages);
        };

        let Some(loans) = self.get_open_loans_by_user_id(&user.id, session).await else {
            return renew_all_response(request, session, false, Vec::new(), Vec::new(), Vec::new());
        };
        debug!(loans = loans.len(), "Renewing open loans");

        let mut renewed = Vec::new();
        let mut unrenewed = Vec::new();
        for loan in &loans {
            let body = json!({ "itemId": loan.item_id, "userId": user.id });
            let renewal = ResourceRequest::post("/circulation/renew-by-id", body, session.auth());

            match self.provider.create_resource(&renewal).await {
                Ok(_) => renewed.push(loan.item_identifier().to_string()),
                Err(e) => {
                    warn!(item_id = %loan.item_id, error = %e, "Renewal failed");
                    unrenewed.push(loan.item_identifier().to_string());
                }
            }
        }

        info!(
            renewed = renewed.len(),
            unrenewed = unrenewed.len(),
            "Renew all finished"
        );
        renew_all_response(request, session, true, renewed, unrenewed, Vec::new())
    }
}

impl std::fmt::Debug for CirculationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CirculationRepository").finish_non_exhaustive()
    }
}

fn renew_all_response(
    request: &RenewAllRequest,
    session: &SessionData,
    ok: bool,
    renewed_items: Vec<String>,
    unrenewed_items: Vec<String>,
    screen_messages: Vec<String>,
) -> RenewAllResponse {
    RenewAllResponse {
        ok,
        transaction_date: session.now(),
        institution_id: request.institution_id().to_string(),
        renewed_items,
        unrenewed_items,
        screen_messages,
        print_lines: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use okapi_resource_client::testing::RecordingResourceProvider;
    use okapi_resource_client::HttpMethod;
    use sip2_protocol_types::WireFormat;

    const USER_ID: &str = "4f0e711c-d583-41e0-9555-b62f1725023f";

    fn renew_all() -> RenewAllRequest {
        RenewAllRequest::parse(
            "20240315    101112AOuniversity_id|AA12345|",
            &WireFormat::default(),
        )
        .unwrap()
    }

    fn repository(provider: Arc<RecordingResourceProvider>) -> CirculationRepository {
        let users = UsersRepository::new(provider.clone(), vec!["barcode".to_string()]);
        CirculationRepository::new(provider, users)
    }

    fn session() -> SessionData {
        SessionData::new("diku", Tz::UTC, '|')
    }

    #[tokio::test]
    async fn renews_each_loan_in_order() {
        let provider = Arc::new(
            RecordingResourceProvider::new()
                .on_get("/users?", json!({ "users": [{ "id": USER_ID }] }))
                .on_get(
                    "/circulation/loans?",
                    json!({ "loans": [
                        { "id": "l1", "itemId": "i1", "item": { "barcode": "111" } },
                        { "id": "l2", "itemId": "i2", "item": { "barcode": "222" } }
                    ] }),
                )
                .on_post("/circulation/renew-by-id", json!({ "id": "l1" })),
        );
        let repository = repository(provider.clone());

        let response = repository
            .perform_renew_all_command(&renew_all(), &session())
            .await;

        assert!(response.ok);
        assert_eq!(response.institution_id, "university_id");
        assert_eq!(response.renewed_items, vec!["111".to_string(), "222".to_string()]);
        assert!(response.unrenewed_items.is_empty());

        let renewals = provider.requests_to(HttpMethod::Post, "/circulation/renew-by-id");
        assert_eq!(renewals.len(), 2);
        assert_eq!(renewals[0].body().unwrap()["itemId"], "i1");
        assert_eq!(renewals[1].body().unwrap()["itemId"], "i2");
        assert_eq!(renewals[1].body().unwrap()["userId"], USER_ID);

        let loan_reads = provider.requests_to(HttpMethod::Get, "/circulation/loans");
        assert!(loan_reads[0].path().ends_with("&limit=1000"));
    }

    #[tokio::test]
    async fn failed_renewals_do_not_abort() {
        let provider = Arc::new(
            RecordingResourceProvider::new()
                .on_get("/users?", json!({ "users": [{ "id": USER_ID }] }))
                .on_get(
                    "/circulation/loans?",
                    json!({ "loans": [{ "id": "l1", "itemId": "i1" }] }),
                )
                .fail_post("/circulation/renew-by-id", 422, "Item is not renewable"),
        );
        let repository = repository(provider);

        let response = repository
            .perform_renew_all_command(&renew_all(), &session())
            .await;

        assert!(response.ok);
        assert!(response.renewed_items.is_empty());
        assert_eq!(response.unrenewed_items, vec!["i1".to_string()]);
    }

    #[tokio::test]
    async fn unknown_patron_is_negative() {
        let provider = Arc::new(
            RecordingResourceProvider::new().on_get("/users?", json!({ "users": [] })),
        );
        let repository = repository(provider.clone());

        let response = repository
            .perform_renew_all_command(&renew_all(), &session())
            .await;

        assert!(!response.ok);
        assert_eq!(response.screen_messages, vec!["Patron not found".to_string()]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn loan_read_failure_is_negative() {
        let provider = Arc::new(
            RecordingResourceProvider::new()
                .on_get("/users?", json!({ "users": [{ "id": USER_ID }] }))
                .fail_get("/circulation/loans?", 500, "boom"),
        );
        let repository = repository(provider.clone());

        let response = repository
            .perform_renew_all_command(&renew_all(), &session())
            .await;

        assert!(!response.ok);
        assert!(provider
            .requests_to(HttpMethod::Post, "/circulation")
            .is_empty());
    }
}
