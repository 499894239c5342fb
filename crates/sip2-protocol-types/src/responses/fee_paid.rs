//! Fee Paid Response (`38`).

use super::Sip2Response;
use crate::grammar::{format_bool, format_date_time, push_field, WireFormat};
use crate::Field;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeePaidResponse {
    pub payment_accepted: bool,
    pub transaction_date: DateTime<Utc>,
    pub institution_id: String,
    pub patron_identifier: String,
    pub transaction_id: Option<String>,
    pub screen_messages: Vec<String>,
    pub print_lines: Vec<String>,
}

impl Sip2Response for FeePaidResponse {
    fn encode(&self, format: &WireFormat) -> String {
        let delimiter = format.field_delimiter;
        let mut out = String::from("38");
        out.push(format_bool(self.payment_accepted));
        out.push_str(&format_date_time(self.transaction_date, format.timezone));
        push_field(&mut out, &Field::InstitutionId, &self.institution_id, delimiter);
        push_field(&mut out, &Field::PatronIdentifier, &self.patron_identifier, delimiter);
        if let Some(transaction_id) = &self.transaction_id {
            push_field(&mut out, &Field::TransactionId, transaction_id, delimiter);
        }
        for message in &self.screen_messages {
            push_field(&mut out, &Field::ScreenMessage, message, delimiter);
        }
        for line in &self.print_lines {
            push_field(&mut out, &Field::PrintLine, line, delimiter);
        }
        out
    }
}
