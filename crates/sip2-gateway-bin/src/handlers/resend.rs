//! Request ACS Resend (`97`).

use sip2_protocol_types::{Command, REQUEST_SC_RESEND};
use sip2_server::{HandlerRequest, Reply, Sip2Server};

pub async fn register(server: &Sip2Server) {
    server
        .register_handler(Command::RequestAcsResend, |req| async move { handle(req) })
        .await;
}

fn handle(req: HandlerRequest) -> Reply {
    match req.session.last_response {
        Some(last_response) => Reply::message(last_response),
        None => Reply::message(REQUEST_SC_RESEND),
    }
}
