//! Patron lookup.

use crate::models::{collection, User};
use crate::SessionData;
use okapi_resource_client::{encode_query, ResourceProvider, ResourceRequest};
use std::sync::Arc;
use tracing::{debug, warn};

const USERS_KEY: &str = "users";

/// Resolves patron identifiers to backend users.
#[derive(Clone)]
pub struct UsersRepository {
    provider: Arc<dyn ResourceProvider>,
    identifier_fields: Vec<String>,
}

impl UsersRepository {
    /// `identifier_fields` are the user attributes a patron identifier may
    /// match, e.g. `barcode` or `externalSystemId`.
    pub fn new(provider: Arc<dyn ResourceProvider>, identifier_fields: Vec<String>) -> Self {
        Self {
            provider,
            identifier_fields,
        }
    }

    fn query_for(&self, identifier: &str) -> String {
        let clauses: Vec<String> = self
            .identifier_fields
            .iter()
            .map(|field| format!("{}==\"{}\"", field, identifier.replace('"', "\\\"")))
            .collect();
        format!("({})", clauses.join(" or "))
    }

    /// Find the user a patron identifier belongs to.
    ///
    /// Returns `None` when no user matches or the backend call fails.
    pub async fn get_user_by_identifier(
        &self,
        identifier: &str,
        session: &SessionData,
    ) -> Option<User> {
        debug_assert!(!identifier.is_empty(), "patron identifier must not be empty");
        if identifier.is_empty() {
            return None;
        }

        let path = format!(
            "/users?limit=1&query={}",
            encode_query(&self.query_for(identifier))
        );
        let request = ResourceRequest::get(path, session.auth());

        let resource = match self.provider.retrieve_resource(&request).await {
            Ok(resource) => resource,
            Err(e) => {
                warn!(error = %e, "User lookup failed");
                return None;
            }
        };

        let user = collection::<User>(&resource, USERS_KEY)?.into_iter().next();
        if user.is_none() {
            debug!("No user matches patron identifier");
        }
        user
    }
}

impl std::fmt::Debug for UsersRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsersRepository")
            .field("identifier_fields", &self.identifier_fields)
            .finish_non_exhaustive()
    }
}
