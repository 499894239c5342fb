//! Renew All Response (`66`).

use super::Sip2Response;
use crate::grammar::{format_count, format_date_time, push_field, WireFormat};
use crate::Field;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewAllResponse {
    pub ok: bool,
    pub transaction_date: DateTime<Utc>,
    pub institution_id: String,
    pub renewed_items: Vec<String>,
    pub unrenewed_items: Vec<String>,
    pub screen_messages: Vec<String>,
    pub print_lines: Vec<String>,
}

impl Sip2Response for RenewAllResponse {
    fn encode(&self, format: &WireFormat) -> String {
        let delimiter = format.field_delimiter;
        let mut out = String::from("66");
        out.push(if self.ok { '1' } else { '0' });
        out.push_str(&format_count(self.renewed_items.len()));
        out.push_str(&format_count(self.unrenewed_items.len()));
        out.push_str(&format_date_time(self.transaction_date, format.timezone));
        push_field(&mut out, &Field::InstitutionId, &self.institution_id, delimiter);
        for item in &self.renewed_items {
            push_field(&mut out, &Field::RenewedItems, item, delimiter);
        }
        for item in &self.unrenewed_items {
            push_field(&mut out, &Field::UnrenewedItems, item, delimiter);
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Tz;

    #[test]
    fn encodes_counts_and_item_lists() {
        let response = RenewAllResponse {
            ok: true,
            transaction_date: Utc.with_ymd_and_hms(2024, 3, 15, 10, 11, 12).unwrap(),
            institution_id: "university_id".to_string(),
            renewed_items: vec!["item1".to_string(), "item2".to_string()],
            unrenewed_items: vec!["item3".to_string()],
            screen_messages: Vec::new(),
            print_lines: Vec::new(),
        };

        assert_eq!(
            response.encode(&WireFormat::new('|', Tz::UTC)),
            "6610002000120240315    101112AOuniversity_id|BMitem1|BMitem2|BNitem3|"
        );
    }

    #[test]
    fn encodes_failure_without_items() {
        let response = RenewAllResponse {
            ok: false,
            transaction_date: Utc.with_ymd_and_hms(2024, 3, 15, 10, 11, 12).unwrap(),
            institution_id: "university_id".to_string(),
            renewed_items: Vec::new(),
            unrenewed_items: Vec::new(),
            screen_messages: vec!["Patron not found".to_string()],
            print_lines: Vec::new(),
        };

        assert_eq!(
            response.encode(&WireFormat::new('|', Tz::UTC)),
            "660000000020240315    101112AOuniversity_id|AFPatron not found|"
        );
    }
}
