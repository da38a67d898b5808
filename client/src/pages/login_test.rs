use super::*;

#[test]
fn trims_email_but_not_password() {
    assert_eq!(
        validate_login_input(" ada@example.com ", " secret "),
        Ok(("ada@example.com".to_owned(), " secret ".to_owned()))
    );
}

#[test]
fn requires_password() {
    assert_eq!(validate_login_input("ada@example.com", ""), Err("Enter your password."));
}

#[test]
fn reports_email_problems_first() {
    assert_eq!(validate_login_input("", ""), Err("Enter your email address."));
    assert_eq!(validate_login_input("nope", "secret"), Err("Enter a valid email address."));
}
