//! English message catalog. Errors carry a stable key; clients may localize
//! from the key and fall back to the text rendered here.

pub fn english(key: &str) -> &'static str {
    match key {
        "subject_message_empty" => "The subject and message cannot be empty.",
        "message_empty" => "The message cannot be empty.",
        "message_too_long" => "The message is too long; the limit is {0} characters.",
        "ticket_for_support" => {
            "Your account has not been activated yet. Please email {0} for support."
        }
        "invalid_ticket" => "The ticket does not exist.",
        "plan_not_found" => "The plan does not exist.",
        "invalid_plan" => "Invalid plan attribute: {0}.",
        "region_not_found" => "The region {0} does not exist.",
        "region_plans_unsupported" => "The region {0} cannot list its plans.",
        "payment_method_not_found" => "The payment method {0} is not available.",
        "invalid_amount" => "The amount must be positive.",
        "payment_failed" => "The payment could not be started. Please try again later.",
        "unauthorized" => "Authentication is required.",
        "invalid_token" => "The authentication token is invalid or expired.",
        "forbidden" => "You do not have access to this resource.",
        "not_found" => "The requested resource does not exist.",
        _ => "An internal error occurred. Please try again later.",
    }
}

/// Looks the key up and substitutes `{0}`, `{1}`, ... with `args`.
pub fn render(key: &str, args: &[String]) -> String {
    args.iter()
        .enumerate()
        .fold(english(key).to_string(), |text, (index, arg)| {
            text.replace(&format!("{{{index}}}"), arg)
        })
}
