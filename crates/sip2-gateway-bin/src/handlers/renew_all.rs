//! Renew All (`65`).

use crate::app::GatewayState;
use sip2_protocol_types::{Command, RenewAllRequest, Sip2Response};
use sip2_server::{HandlerRequest, Reply, Sip2Server};
use tracing::warn;

pub async fn register(server: &Sip2Server, state: GatewayState) {
    server
        .register_handler(Command::RenewAll, move |req| {
            let state = state.clone();
            async move { handle(&state, req).await }
        })
        .await;
}

async fn handle(state: &GatewayState, req: HandlerRequest) -> Reply {
    let format = req.session.wire_format();
    let request = match RenewAllRequest::parse(&req.body, &format) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed Renew All message");
            return Reply::resend();
        }
    };

    let response = state
        .circulation
        .perform_renew_all_command(&request, &req.session)
        .await;

    Reply::message(response.encode(&format)).with_institution_id(request.institution_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;
    use okapi_resource_client::testing::RecordingResourceProvider;
    use serde_json::json;
    use sip2_config_and_utils::Config;
    use sip2_repositories::{FixedClock, SessionData};
    use std::sync::Arc;

    fn request(body: &str) -> HandlerRequest {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 10, 11, 12).unwrap());
        HandlerRequest {
            command: Command::RenewAll,
            body: body.to_string(),
            session: SessionData::new("diku", Tz::UTC, '|').with_clock(Arc::new(clock)),
        }
    }

    #[tokio::test]
    async fn renews_open_loans() {
        let provider = Arc::new(
            RecordingResourceProvider::new()
                .on_get("/users?", json!({ "users": [{ "id": "u1" }] }))
                .on_get(
                    "/circulation/loans?",
                    json!({ "loans": [
                        { "id": "l1", "itemId": "i1", "item": { "barcode": "item1" } },
                        { "id": "l2", "itemId": "i2", "item": { "barcode": "item2" } }
                    ] }),
                )
                .on_post("/circulation/renew-by-id", json!({})),
        );
        let state = GatewayState::new(Config::default(), provider);

        let reply = handle(
            &state,
            request("20240315    101112AOuniversity_id|AA12345|"),
        )
        .await;

        assert_eq!(reply.institution_id(), Some("university_id"));
        assert_eq!(
            reply.into_message(),
            "6610002000020240315    101112AOuniversity_id|BMitem1|BMitem2|"
        );
    }

    #[tokio::test]
    async fn missing_patron_identifier_asks_for_resend() {
        let provider = Arc::new(RecordingResourceProvider::new());
        let state = GatewayState::new(Config::default(), provider.clone());

        let reply = handle(&state, request("20240315    101112AOuniversity_id|")).await;

        assert!(reply.is_resend());
        assert_eq!(provider.call_count(), 0);
    }
}
