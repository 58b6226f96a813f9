//! User-facing reply texts.

use roster_core::{AccountId, MembershipNumber};

use crate::verification_form::SubmissionError;

pub fn verified_reply(number: &MembershipNumber) -> String {
    format!("Thanks! Member number {number} is verified and your roles are being updated.")
}

pub fn membership_not_found_reply(number: &MembershipNumber, admin: AccountId) -> String {
    format!(
        "We can't find your member number {number} on the list yet, \
         please double check and try again or ping <@{admin}> with your member number \
         and corp username"
    )
}

pub fn invalid_submission_reply(error: &SubmissionError) -> String {
    match error {
        SubmissionError::NonNumericMembershipNumber { entered } => format!(
            "Your member number should only contain digits, but we got `{entered}`. \
             Please press the button and try again."
        ),
        SubmissionError::EmptyMembershipNumber | SubmissionError::MissingField { .. } => {
            "We couldn't read your member number. Please press the button and try again."
                .to_string()
        }
    }
}
