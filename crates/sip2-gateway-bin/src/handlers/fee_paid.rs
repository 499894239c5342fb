//! Fee Paid (`37`).

use crate::app::GatewayState;
use sip2_protocol_types::{Command, FeePaidRequest, Sip2Response};
use sip2_server::{HandlerRequest, Reply, Sip2Server};
use tracing::{debug, warn};

pub async fn register(server: &Sip2Server, state: GatewayState) {
    server
        .register_handler(Command::FeePaid, move |req| {
            let state = state.clone();
            async move { handle(&state, req).await }
        })
        .await;
}

async fn handle(state: &GatewayState, req: HandlerRequest) -> Reply {
    let format = req.session.wire_format();
    let request = match FeePaidRequest::parse(&req.body, &format) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed Fee Paid message");
            return Reply::resend();
        }
    };
    debug!(
        fee_type = ?request.fee_type(),
        payment_type = ?request.payment_type(),
        currency = request.currency_type().as_str(),
        "Fee Paid received"
    );

    let response = state
        .fee_fines
        .perform_fee_paid_command(&request, &req.session)
        .await;

    Reply::message(response.encode(&format)).with_institution_id(request.institution_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;
    use okapi_resource_client::testing::RecordingResourceProvider;
    use okapi_resource_client::HttpMethod;
    use serde_json::json;
    use sip2_config_and_utils::Config;
    use sip2_repositories::{FixedClock, SessionData};
    use std::sync::Arc;

    const TRANSACTION_ID: &str = "7e15ba2d-9c5b-4b0a-a1d8-6a7e3c3d2f10";

    fn provider(remaining: f64) -> Arc<RecordingResourceProvider> {
        Arc::new(
            RecordingResourceProvider::new()
                .on_get(
                    "/users?",
                    json!({ "users": [{ "id": "u1", "username": "leslie" }] }),
                )
                .on_get(
                    "/accounts?",
                    json!({ "accounts": [{ "id": "a1", "remaining": remaining }] }),
                )
                .on_post("/accounts-bulk/pay", json!({ "amount": remaining })),
        )
    }

    fn request(body: &str) -> HandlerRequest {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 10, 11, 12).unwrap());
        HandlerRequest {
            command: Command::FeePaid,
            body: body.to_string(),
            session: SessionData::new("diku", Tz::UTC, '|').with_clock(Arc::new(clock)),
        }
    }

    fn fee_paid_body(amount: &str) -> String {
        format!(
            "20240315    1011120100USDBV{}|AOdiku|AA1029384756|BK{}|",
            amount, TRANSACTION_ID
        )
    }

    #[tokio::test]
    async fn payment_of_balance_is_accepted() {
        let provider = provider(66.67);
        let state = GatewayState::new(Config::default(), provider.clone());

        let reply = handle(&state, request(&fee_paid_body("66.67"))).await;

        assert_eq!(reply.institution_id(), Some("diku"));
        assert_eq!(
            reply.into_message(),
            format!(
                "38Y20240315    101112AOdiku|AA1029384756|BK{}|",
                TRANSACTION_ID
            )
        );
        assert_eq!(provider.requests_to(HttpMethod::Post, "/accounts").len(), 1);
    }

    #[tokio::test]
    async fn overpayment_is_refused() {
        let provider = provider(66.67);
        let state = GatewayState::new(Config::default(), provider.clone());

        let reply = handle(&state, request(&fee_paid_body("100.00"))).await;

        assert_eq!(
            reply.into_message(),
            format!(
                "38N20240315    101112AOdiku|AA1029384756|BK{}|AFPaid amount ($100.00) is more than amount owed ($66.67). Please limit payment to no more than the amount owed.|",
                TRANSACTION_ID
            )
        );
        assert!(provider.requests_to(HttpMethod::Post, "/accounts").is_empty());
    }

    #[tokio::test]
    async fn malformed_message_asks_for_resend() {
        let provider = provider(1.0);
        let state = GatewayState::new(Config::default(), provider.clone());

        let reply = handle(&state, request("20240315    1011129900USD")).await;

        assert!(reply.is_resend());
        assert_eq!(provider.call_count(), 0);
    }
}
