//! Fees, fines and payments.

use crate::models::{collection, Account, FeeFine, ManualBlock};
use crate::{money, SessionData, UsersRepository};
use okapi_resource_client::{
    encode_query, BackendError, Resource, ResourceProvider, ResourceRequest,
};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sip2_config_and_utils::MoneyRounding;
use sip2_protocol_types::{FeePaidRequest, FeePaidResponse};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

const ACCOUNTS_KEY: &str = "accounts";
const FEE_FINES_KEY: &str = "feefines";
const MANUAL_BLOCKS_KEY: &str = "manualblocks";
const ACCOUNT_SUMMARY_LIMIT: usize = 1000;

fn uuid_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\w{8}-\w{4}-\w{4}-\w{4}-\w{12})").expect("UUID prefix pattern is valid")
    })
}

/// The account a fee identifier points at, when it starts with a UUID.
fn account_id_from_fee_identifier(fee_identifier: &str) -> Option<&str> {
    uuid_prefix()
        .captures(fee_identifier)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}

/// Payment defaults recorded with every fee payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSettings {
    pub payment_method: String,
    pub notify_patron: bool,
    pub rounding: MoneyRounding,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            payment_method: "Credit Card".to_string(),
            notify_patron: true,
            rounding: MoneyRounding::default(),
        }
    }
}

/// Talks to the feefines, accounts and manual block endpoints.
#[derive(Clone)]
pub struct FeeFinesRepository {
    provider: Arc<dyn ResourceProvider>,
    users: UsersRepository,
    settings: PaymentSettings,
}

impl FeeFinesRepository {
    pub fn new(
        provider: Arc<dyn ResourceProvider>,
        users: UsersRepository,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            provider,
            users,
            settings,
        }
    }

    async fn retrieve(&self, path: String, session: &SessionData) -> Option<Resource> {
        let request = ResourceRequest::get(path, session.auth());
        match self.provider.retrieve_resource(&request).await {
            Ok(resource) => Some(resource),
            Err(e) => {
                warn!(path = %request.path(), error = %e, "Backend read failed");
                None
            }
        }
    }

    /// A patron's manual blocks, or `None` if they could not be read.
    pub async fn get_manual_blocks_by_user_id(
        &self,
        user_id: &str,
        session: &SessionData,
    ) -> Option<Vec<ManualBlock>> {
        debug_assert!(!user_id.is_empty(), "user id must not be empty");
        if user_id.is_empty() {
            return None;
        }

        let path = format!(
            "/manualblocks?query={}",
            encode_query(&format!("userId=={}", user_id))
        );
        let resource = self.retrieve(path, session).await?;
        collection(&resource, MANUAL_BLOCKS_KEY)
    }

    /// A patron's open accounts, the basis for payments.
    pub async fn get_fee_amount_by_user_id(
        &self,
        user_id: &str,
        session: &SessionData,
    ) -> Option<Vec<Account>> {
        debug_assert!(!user_id.is_empty(), "user id must not be empty");
        if user_id.is_empty() {
            return None;
        }

        let path = format!(
            "/accounts?query={}",
            encode_query(&format!("(userId=={} and status.name==Open)", user_id))
        );
        let resource = self.retrieve(path, session).await?;
        collection(&resource, ACCOUNTS_KEY)
    }

    /// All of a patron's accounts with their fee/fine type filled in.
    ///
    /// Accounts whose fee/fine cannot be found keep `fee_fine_type` unset, as
    /// do all accounts when the fee/fine read fails.
    pub async fn get_account_data_by_user_id(
        &self,
        user_id: &str,
        session: &SessionData,
    ) -> Option<Vec<Account>> {
        debug_assert!(!user_id.is_empty(), "user id must not be empty");
        if user_id.is_empty() {
            return None;
        }

        let path = format!(
            "/accounts?query=(userId=={})&limit={}",
            user_id, ACCOUNT_SUMMARY_LIMIT
        );
        let resource = self.retrieve(path, session).await?;
        let mut accounts: Vec<Account> = collection(&resource, ACCOUNTS_KEY)?;

        let mut fee_fine_ids: Vec<String> = Vec::new();
        for id in accounts.iter().filter_map(|account| account.fee_fine_id.as_ref()) {
            if !fee_fine_ids.contains(id) {
                fee_fine_ids.push(id.clone());
            }
        }
        if fee_fine_ids.is_empty() {
            return Some(accounts);
        }

        if let Some(fee_fines) = self.get_fee_fines_by_ids(&fee_fine_ids, session).await {
            populate_fee_fine_types(&mut accounts, &fee_fines);
        }
        Some(accounts)
    }

    /// Fee/fine definitions for `ids`.
    pub async fn get_fee_fines_by_ids(
        &self,
        ids: &[String],
        session: &SessionData,
    ) -> Option<Vec<FeeFine>> {
        if ids.is_empty() {
            return Some(Vec::new());
        }

        let clauses: Vec<String> = ids.iter().map(|id| format!("(id=={})", id)).collect();
        let path = format!("/feefines?query=({})", clauses.join("+OR+"));
        let resource = self.retrieve(path, session).await?;
        collection(&resource, FEE_FINES_KEY)
    }

    /// Pay towards a patron's open accounts.
    ///
    /// Steps run strictly in order and the payment is always the last call:
    /// resolve the patron, read open accounts, refuse overpayment, pay.
    pub async fn perform_fee_paid_command(
        &self,
        request: &FeePaidRequest,
        session: &SessionData,
    ) -> FeePaidResponse {
        let account_id = request
            .fee_identifier()
            .and_then(account_id_from_fee_identifier)
            .map(str::to_string);
        debug!(account_id = ?account_id, "Fee identifier resolved");

        let Some(user) = self
            .users
            .get_user_by_identifier(request.patron_identifier(), session)
            .await
        else {
            let screen_messages = vec!["Patron not found".to_string()];
            return fee_paid_response(request, session, false, screen_messages);
        };

        let Some(accounts) = self.get_fee_amount_by_user_id(&user.id, session).await else {
            return fee_paid_response(request, session, false, Vec::new());
        };

        let Some(paid) = money::parse_amount(request.fee_amount()) else {
            warn!(fee_amount = %request.fee_amount(), "Unparseable fee amount");
            let screen_messages = vec!["Invalid fee amount".to_string()];
            return fee_paid_response(request, session, false, screen_messages);
        };

        let Some(total_remaining) = accounts
            .iter()
            .try_fold(Decimal::ZERO, |total, account| total.checked_add(account.remaining))
        else {
            warn!(accounts = accounts.len(), "Open balance overflows");
            return fee_paid_response(request, session, false, Vec::new());
        };

        let rounding = self.settings.rounding;
        let amount_paid = money::round(paid, rounding);
        let amount_owed = money::round(total_remaining, rounding);
        debug!(%amount_paid, %amount_owed, "Comparing payment with open balance");

        if amount_paid > amount_owed {
            info!(%amount_paid, %amount_owed, "Rejecting overpayment");
            return fee_paid_response(
                request,
                session,
                false,
                vec![overpayment_message(amount_paid, amount_owed)],
            );
        }

        let path = match &account_id {
            Some(id) => format!("/accounts/{}/pay", id),
            None => "/accounts-bulk/pay".to_string(),
        };
        let account_ids: Vec<String> = accounts.into_iter().map(|account| account.id).collect();
        let body = self.payment_body(
            request.fee_amount(),
            user.username.as_deref(),
            session,
            account_id.is_none().then_some(account_ids),
        );
        let payment = ResourceRequest::post(path, body, session.auth());

        match self.provider.create_resource(&payment).await {
            Ok(resource) => {
                info!(path = %payment.path(), "Fee payment accepted");
                fee_paid_response(request, session, true, resource.error_messages)
            }
            Err(e) => {
                warn!(path = %payment.path(), error = %e, "Fee payment failed");
                let screen_messages = match e {
                    BackendError::Status { message, .. } if !message.is_empty() => vec![message],
                    _ => Vec::new(),
                };
                fee_paid_response(request, session, false, screen_messages)
            }
        }
    }

    fn payment_body(
        &self,
        amount: &str,
        user_name: Option<&str>,
        session: &SessionData,
        account_ids: Option<Vec<String>>,
    ) -> Value {
        let mut body = json!({
            "amount": amount,
            "notifyPatron": self.settings.notify_patron,
            "servicePointId": session.sc_location,
            "userName": user_name,
            "paymentMethod": self.settings.payment_method,
        });
        if let (Some(ids), Some(object)) = (account_ids, body.as_object_mut()) {
            object.insert("accountIds".to_string(), json!(ids));
        }
        body
    }
}

impl std::fmt::Debug for FeeFinesRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeeFinesRepository")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn overpayment_message(paid: Decimal, owed: Decimal) -> String {
    format!(
        "Paid amount (${}) is more than amount owed (${}). Please limit payment to no more than the amount owed.",
        paid, owed
    )
}

fn fee_paid_response(
    request: &FeePaidRequest,
    session: &SessionData,
    payment_accepted: bool,
    screen_messages: Vec<String>,
) -> FeePaidResponse {
    FeePaidResponse {
        payment_accepted,
        transaction_date: session.now(),
        institution_id: request.institution_id().to_string(),
        patron_identifier: request.patron_identifier().to_string(),
        transaction_id: request.transaction_id().map(str::to_string),
        screen_messages,
        print_lines: Vec::new(),
    }
}

/// Join fee/fine types onto accounts by fee/fine id.
fn populate_fee_fine_types(accounts: &mut [Account], fee_fines: &[FeeFine]) {
    let types: HashMap<&str, Option<&String>> = fee_fines
        .iter()
        .map(|fee_fine| (fee_fine.id.as_str(), fee_fine.fee_fine_type.as_ref()))
        .collect();

    for account in accounts.iter_mut() {
        let fee_fine_type = account
            .fee_fine_id
            .as_deref()
            .and_then(|id| types.get(id).copied().flatten());
        account.fee_fine_type = fee_fine_type.cloned();
    }
}
