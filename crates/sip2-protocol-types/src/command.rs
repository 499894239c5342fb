//! SIP2 command codes.

use crate::{ParseError, ParseResult};

/// Message sent by the ACS to ask the terminal to resend its last message.
///
/// It is the protocol's only way of saying "I could not process that".
pub const REQUEST_SC_RESEND: &str = "96";

/// Commands a terminal may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    BlockPatron,
    Checkin,
    Checkout,
    Hold,
    ItemInformation,
    ItemStatusUpdate,
    PatronStatus,
    PatronEnable,
    Renew,
    EndPatronSession,
    FeePaid,
    PatronInformation,
    RenewAll,
    Login,
    RequestAcsResend,
    ScStatus,
}

impl Command {
    /// Resolve a two-character request code.
    pub fn from_code(code: &str) -> ParseResult<Self> {
        let command = match code {
            "01" => Self::BlockPatron,
            "09" => Self::Checkin,
            "11" => Self::Checkout,
            "15" => Self::Hold,
            "17" => Self::ItemInformation,
            "19" => Self::ItemStatusUpdate,
            "23" => Self::PatronStatus,
            "25" => Self::PatronEnable,
            "29" => Self::Renew,
            "35" => Self::EndPatronSession,
            "37" => Self::FeePaid,
            "63" => Self::PatronInformation,
            "65" => Self::RenewAll,
            "93" => Self::Login,
            "97" => Self::RequestAcsResend,
            "99" => Self::ScStatus,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// Split a framed message into its command and body.
    pub fn split_message(message: &str) -> ParseResult<(Self, &str)> {
        let code = message.get(..2).ok_or_else(|| {
            ParseError::UnknownCommand(message.to_string())
        })?;
        let command = Self::from_code(code)?;
        Ok((command, &message[2..]))
    }

    /// The request code on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Self::BlockPatron => "01",
            Self::Checkin => "09",
            Self::Checkout => "11",
            Self::Hold => "15",
            Self::ItemInformation => "17",
            Self::ItemStatusUpdate => "19",
            Self::PatronStatus => "23",
            Self::PatronEnable => "25",
            Self::Renew => "29",
            Self::EndPatronSession => "35",
            Self::FeePaid => "37",
            Self::PatronInformation => "63",
            Self::RenewAll => "65",
            Self::Login => "93",
            Self::RequestAcsResend => "97",
            Self::ScStatus => "99",
        }
    }

    /// The code of the matching response message.
    ///
    /// Block Patron has no response; the ACS answers with a Patron Status.
    pub fn response_code(self) -> &'static str {
        match self {
            Self::BlockPatron => "24",
            Self::Checkin => "10",
            Self::Checkout => "12",
            Self::Hold => "16",
            Self::ItemInformation => "18",
            Self::ItemStatusUpdate => "20",
            Self::PatronStatus => "24",
            Self::PatronEnable => "26",
            Self::Renew => "30",
            Self::EndPatronSession => "36",
            Self::FeePaid => "38",
            Self::PatronInformation => "64",
            Self::RenewAll => "66",
            Self::Login => "94",
            Self::RequestAcsResend => REQUEST_SC_RESEND,
            Self::ScStatus => "98",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_message_separates_code_and_body() {
        let (command, body) = Command::split_message("6520240101    120000AOx|").unwrap();
        assert_eq!(command, Command::RenewAll);
        assert_eq!(body, "20240101    120000AOx|");
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(
            Command::split_message("XX123"),
            Err(ParseError::UnknownCommand("XX".to_string()))
        );
    }

    #[test]
    fn too_short_message_is_rejected() {
        assert!(Command::split_message("6").is_err());
    }

    #[test]
    fn response_codes_follow_requests() {
        assert_eq!(Command::FeePaid.response_code(), "38");
        assert_eq!(Command::RenewAll.response_code(), "66");
        assert_eq!(Command::from_code("37").unwrap().code(), "37");
    }
}
