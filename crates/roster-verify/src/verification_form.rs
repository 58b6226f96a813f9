//! Verification form layout and submission parsing.

use std::collections::BTreeMap;

use roster_core::MembershipNumber;
use thiserror::Error;

pub const VERIFY_BUTTON_ID: &str = "verify_button";
pub const VERIFY_MODAL_ID: &str = "verify_modal";
pub const MEMBERSHIP_NUMBER_INPUT_ID: &str = "unite_id";
pub const MANAGER_FLAG_INPUT_ID: &str = "is_manager";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Single-line text input with a fixed accepted length.
pub struct TextInputSpec {
    pub custom_id: &'static str,
    pub label: &'static str,
    pub length: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Public struct `FormSpec` describing a modal form.
pub struct FormSpec {
    pub custom_id: &'static str,
    pub title: &'static str,
    pub inputs: &'static [TextInputSpec],
}

pub const VERIFICATION_FORM: FormSpec = FormSpec {
    custom_id: VERIFY_MODAL_ID,
    title: "Verification",
    inputs: &[
        TextInputSpec {
            custom_id: MEMBERSHIP_NUMBER_INPUT_ID,
            label: "Unite the Union member number",
            length: 8,
        },
        TextInputSpec {
            custom_id: MANAGER_FLAG_INPUT_ID,
            label: "Are you a manager? Put 'Y' or 'N'",
            length: 1,
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates user-correctable problems with a form submission.
pub enum SubmissionError {
    #[error("form field '{field}' is missing")]
    MissingField { field: &'static str },
    #[error("member number cannot be empty")]
    EmptyMembershipNumber,
    #[error("member number '{entered}' is not numeric")]
    NonNumericMembershipNumber { entered: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parsed verification form values.
pub struct VerificationSubmission {
    pub membership_number: MembershipNumber,
    pub manager: bool,
}

impl VerificationSubmission {
    pub fn parse(membership_number: &str, manager_flag: &str) -> Result<Self, SubmissionError> {
        Ok(Self {
            membership_number: parse_membership_number(membership_number)?,
            manager: parse_manager_flag(manager_flag),
        })
    }

    pub fn from_fields(fields: &BTreeMap<String, String>) -> Result<Self, SubmissionError> {
        let field = |name: &'static str| {
            fields
                .get(name)
                .map(String::as_str)
                .ok_or(SubmissionError::MissingField { field: name })
        };
        Self::parse(
            field(MEMBERSHIP_NUMBER_INPUT_ID)?,
            field(MANAGER_FLAG_INPUT_ID)?,
        )
    }
}

fn parse_membership_number(raw: &str) -> Result<MembershipNumber, SubmissionError> {
    let entered = raw.trim();
    if entered.is_empty() {
        return Err(SubmissionError::EmptyMembershipNumber);
    }
    let non_numeric = || SubmissionError::NonNumericMembershipNumber {
        entered: entered.to_string(),
    };
    if !entered.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(non_numeric());
    }
    let value = entered.parse::<u64>().map_err(|_| non_numeric())?;
    Ok(MembershipNumber::new(value, entered))
}

// Anything other than y/Y means "not a manager".
fn parse_manager_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("y")
}
