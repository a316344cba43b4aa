//! Typed form validation.
//!
//! Each posted form has a `validate` function that either yields the cleaned
//! input or a [`FormErrors`] list ready to be rendered next to the fields.

use crate::model::{LoginPost, RegisterPost, ReviewPost};

pub const CSRF_FIELD: &str = "csrf_token";

const REQUIRED: &str = "This field is required.";
const USERNAME_MAX: usize = 50;
const EMAIL_MAX: usize = 120;
const MOVIE_MAX: usize = 100;
const RATING_MIN: i64 = 1;
const RATING_MAX: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |err| err.field == field)
            .map(|err| err.message.as_str())
    }

    pub fn has(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub movie: String,
    pub rating: i64,
    pub comment: String,
}

/// Checks the submitted CSRF token against the one stored in the session.
pub fn check_csrf(
    errors: &mut FormErrors,
    submitted: Option<&str>,
    verify: impl FnOnce(&str) -> bool,
) {
    match submitted.filter(|token| !token.is_empty()) {
        None => errors.push(CSRF_FIELD, "The CSRF token is missing."),
        Some(token) if !verify(token) => errors.push(CSRF_FIELD, "The CSRF token is invalid."),
        Some(_) => {}
    }
}

fn required(errors: &mut FormErrors, field: &'static str, value: Option<&str>) -> String {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => v.to_string(),
        None => {
            errors.push(field, REQUIRED);
            String::new()
        }
    }
}

fn max_len(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(field, format!("Field cannot be longer than {max} characters."));
    }
}

pub fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

impl RegisterPost {
    pub fn validate(&self, csrf: impl FnOnce(&str) -> bool) -> Result<Registration, FormErrors> {
        let mut errors = FormErrors::new();
        check_csrf(&mut errors, self.csrf_token.as_deref(), csrf);

        let username = required(&mut errors, "username", self.username.as_deref());
        max_len(&mut errors, "username", &username, USERNAME_MAX);

        let email = required(&mut errors, "email", self.email.as_deref())
            .trim()
            .to_string();
        if !email.is_empty() {
            if !valid_email(&email) {
                errors.push("email", "Invalid email address.");
            }
            max_len(&mut errors, "email", &email, EMAIL_MAX);
        }

        let password = required(&mut errors, "password", self.password.as_deref());

        errors.into_result(Registration {
            username,
            email,
            password,
        })
    }
}

impl LoginPost {
    pub fn validate(&self, csrf: impl FnOnce(&str) -> bool) -> Result<Credentials, FormErrors> {
        let mut errors = FormErrors::new();
        check_csrf(&mut errors, self.csrf_token.as_deref(), csrf);

        let username = required(&mut errors, "username", self.username.as_deref());
        let password = required(&mut errors, "password", self.password.as_deref());

        errors.into_result(Credentials { username, password })
    }
}

impl ReviewPost {
    pub fn validate(&self, csrf: impl FnOnce(&str) -> bool) -> Result<NewReview, FormErrors> {
        let mut errors = FormErrors::new();
        check_csrf(&mut errors, self.csrf_token.as_deref(), csrf);

        let movie = required(&mut errors, "movie", self.movie.as_deref());
        max_len(&mut errors, "movie", &movie, MOVIE_MAX);

        let rating = required(&mut errors, "rating", self.rating.as_deref());
        let rating = if rating.is_empty() {
            0
        } else {
            match rating.trim().parse::<i64>() {
                Ok(n) if (RATING_MIN..=RATING_MAX).contains(&n) => n,
                Ok(_) => {
                    errors.push(
                        "rating",
                        format!("Number must be between {RATING_MIN} and {RATING_MAX}."),
                    );
                    0
                }
                Err(_) => {
                    errors.push("rating", "Not a valid integer value.");
                    0
                }
            }
        };

        let comment = required(&mut errors, "comment", self.comment.as_deref());

        errors.into_result(NewReview {
            movie,
            rating,
            comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn accept(_: &str) -> bool {
        true
    }

    fn review(rating: &str) -> ReviewPost {
        ReviewPost {
            movie: Some("Dune".to_string()),
            rating: Some(rating.to_string()),
            comment: Some("Great".to_string()),
            csrf_token: Some("token".to_string()),
        }
    }

    #[rstest]
    #[case("1", 1)]
    #[case("9", 9)]
    #[case("10", 10)]
    #[case(" 5 ", 5)]
    fn accepts_ratings_in_range(#[case] raw: &str, #[case] expected: i64) {
        let cleaned = review(raw).validate(accept).expect("valid review");
        assert_eq!(cleaned.rating, expected);
    }

    #[rstest]
    #[case("0", "Number must be between 1 and 10.")]
    #[case("11", "Number must be between 1 and 10.")]
    #[case("-3", "Number must be between 1 and 10.")]
    #[case("nine", "Not a valid integer value.")]
    #[case("7.5", "Not a valid integer value.")]
    #[case("", "This field is required.")]
    fn rejects_bad_ratings(#[case] raw: &str, #[case] message: &str) {
        let errors = review(raw).validate(accept).expect_err("invalid rating");
        let messages: Vec<_> = errors.for_field("rating").collect();
        assert_eq!(messages, [message]);
        assert!(!errors.has("movie"));
    }

    #[test]
    fn review_requires_movie_and_comment() {
        let post = ReviewPost {
            movie: Some("   ".to_string()),
            rating: Some("5".to_string()),
            comment: None,
            csrf_token: Some("token".to_string()),
        };
        let errors = post.validate(accept).expect_err("missing fields");
        assert!(errors.has("movie"));
        assert!(errors.has("comment"));
        assert!(!errors.has("rating"));
    }

    #[test]
    fn long_movie_title_is_rejected() {
        let mut post = review("5");
        post.movie = Some("x".repeat(101));
        let errors = post.validate(accept).expect_err("too long");
        assert_eq!(
            errors.for_field("movie").collect::<Vec<_>>(),
            ["Field cannot be longer than 100 characters."]
        );
    }

    #[test]
    fn missing_csrf_token_fails_validation() {
        let mut post = review("5");
        post.csrf_token = None;
        let errors = post.validate(accept).expect_err("no token");
        assert_eq!(
            errors.for_field(CSRF_FIELD).collect::<Vec<_>>(),
            ["The CSRF token is missing."]
        );
    }

    #[test]
    fn mismatched_csrf_token_fails_validation() {
        let errors = review("5")
            .validate(|token| token == "other")
            .expect_err("bad token");
        assert_eq!(
            errors.for_field(CSRF_FIELD).collect::<Vec<_>>(),
            ["The CSRF token is invalid."]
        );
    }

    #[rstest]
    #[case("alice@x.com", true)]
    #[case("a.b+c@mail.example.org", true)]
    #[case("alice", false)]
    #[case("alice@", false)]
    #[case("@x.com", false)]
    #[case("alice@x", false)]
    #[case("alice@@x.com", false)]
    #[case("al ice@x.com", false)]
    #[case("alice@x..com", false)]
    fn email_syntax(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(valid_email(email), expected);
    }

    #[test]
    fn registration_reports_every_missing_field() {
        let post = RegisterPost {
            csrf_token: Some("token".to_string()),
            ..RegisterPost::default()
        };
        let errors = post.validate(accept).expect_err("empty form");
        for field in ["username", "email", "password"] {
            assert_eq!(
                errors.for_field(field).collect::<Vec<_>>(),
                ["This field is required."]
            );
        }
    }

    #[test]
    fn registration_rejects_invalid_email() {
        let post = RegisterPost {
            username: Some("alice".to_string()),
            email: Some("not-an-email".to_string()),
            password: Some("pw1".to_string()),
            csrf_token: Some("token".to_string()),
        };
        let errors = post.validate(accept).expect_err("bad email");
        assert_eq!(
            errors.for_field("email").collect::<Vec<_>>(),
            ["Invalid email address."]
        );
    }

    #[test]
    fn registration_keeps_password_verbatim() {
        let post = RegisterPost {
            username: Some("alice".to_string()),
            email: Some(" alice@x.com ".to_string()),
            password: Some(" pw1 ".to_string()),
            csrf_token: Some("token".to_string()),
        };
        let cleaned = post.validate(accept).expect("valid");
        assert_eq!(cleaned.email, "alice@x.com");
        assert_eq!(cleaned.password, " pw1 ");
    }

    #[test]
    fn login_requires_both_fields() {
        let post = LoginPost {
            username: Some("alice".to_string()),
            password: Some(String::new()),
            csrf_token: Some("token".to_string()),
        };
        let errors = post.validate(accept).expect_err("no password");
        assert!(errors.has("password"));
        assert!(!errors.has("username"));
    }
}
