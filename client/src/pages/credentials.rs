//! Input checks shared by the login, signup and reset-password pages.

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

/// Trimmed email, loosely checked for `local@domain`.
pub(crate) fn validate_email(raw: &str) -> Result<String, &'static str> {
    let email = raw.trim();
    if email.is_empty() {
        return Err("Enter your email address.");
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email.to_owned())
        }
        _ => Err("Enter a valid email address."),
    }
}

/// New-password rules: minimum length and matching confirmation.
pub(crate) fn validate_new_password(password: &str, confirm: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters.");
    }
    if password != confirm {
        return Err("Passwords do not match.");
    }
    Ok(())
}
