use chrono::{DateTime, Utc};

use crate::canvas::Assignment;
use crate::llm::Rephraser;

// Assignment links carry the institution's canvas host; students use the
// campus-branded one.
const LINK_HOST_FROM: &str = "canvas";
const LINK_HOST_TO: &str = "csus";

/// Rewrite the first `canvas` in the link to the campus host name.
pub fn rewrite_link(url: &str) -> String {
    url.replacen(LINK_HOST_FROM, LINK_HOST_TO, 1)
}

/// Prompt handed to the rephraser. Hours remaining may be fractional, and
/// can dip slightly negative if the send slips past the due time.
pub fn urgency_prompt(assignment: &Assignment, now: DateTime<Utc>) -> String {
    let hours_until_due = assignment
        .due_at
        .map(|due_at| (due_at - now).num_seconds() as f64 / 3600.0)
        .unwrap_or(0.0);
    let link = rewrite_link(&assignment.html_url);
    format!(
        "Create a motivating message that will get the user to do his homework, \
         the closer it is to the due date, the more urgent the message should be. \
         The assignment '{}' is due in {:.1} hours. \
         Here is the link to the assignment: {}",
        assignment.name, hours_until_due, link
    )
}

/// Build the outgoing message, falling back to the raw prompt when the
/// rephraser fails.
pub async fn compose(rephraser: &dyn Rephraser, assignment: &Assignment) -> String {
    let prompt = urgency_prompt(assignment, Utc::now());
    match rephraser.rephrase(&prompt).await {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(
                assignment = %assignment.name,
                error = %e,
                "Rephrase failed, sending raw prompt"
            );
            prompt
        }
    }
}
