use maud::{html, Markup, DOCTYPE};

use crate::form::{FormErrors, CSRF_FIELD};
use crate::model::{LoginPost, RegisterPost, ReviewModel, ReviewPost};
use crate::session::{Flash, SessionUser};

/// What every page needs from the session: who is logged in and which
/// flashes are still pending.
pub struct Page {
    pub user: Option<SessionUser>,
    pub flashes: Vec<Flash>,
}

fn layout(page: &Page, title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | Movie Reviews" }
                link rel="stylesheet" href="/static/css/style.css";
            }
            body {
                nav.navbar {
                    a.brand href="/" { "Movie Reviews" }
                    @if let Some(user) = &page.user {
                        span.user { "Signed in as " (user.username) }
                        a href="/add_review" { "Add review" }
                        a href="/logout" { "Logout" }
                    } @else {
                        a href="/login" { "Login" }
                        a href="/register" { "Register" }
                    }
                }
                main.container {
                    @for flash in &page.flashes {
                        div class={ "flash flash-" (flash.level.as_str()) } { (flash.message) }
                    }
                    (content)
                }
            }
        }
    }
}

fn field_errors(errors: &FormErrors, field: &str) -> Markup {
    html! {
        @for message in errors.for_field(field) {
            span.error { (message) }
        }
    }
}

fn csrf_input(token: &str, errors: &FormErrors) -> Markup {
    html! {
        input type="hidden" name=(CSRF_FIELD) value=(token);
        (field_errors(errors, CSRF_FIELD))
    }
}

fn text_field(
    label: &str,
    name: &str,
    kind: &str,
    value: Option<&str>,
    errors: &FormErrors,
) -> Markup {
    html! {
        div.field.has-error[errors.has(name)] {
            label for=(name) { (label) }
            input type=(kind) id=(name) name=(name) value=(value.unwrap_or_default());
            (field_errors(errors, name))
        }
    }
}

pub fn home(page: &Page, reviews: &[ReviewModel]) -> Markup {
    layout(
        page,
        "Home",
        html! {
            h1 { "Latest Reviews" }
            @if reviews.is_empty() {
                p.empty { "No reviews yet." }
            }
            @for review in reviews {
                article.review {
                    h2.movie { (review.movie) }
                    p.rating { "Rating: " span.score { (review.rating) } "/10" }
                    p.comment { (review.comment) }
                    p.author { "by " span.username { (review.username) } }
                }
            }
        },
    )
}

pub fn register(page: &Page, csrf: &str, values: &RegisterPost, errors: &FormErrors) -> Markup {
    layout(
        page,
        "Register",
        html! {
            h1 { "Register" }
            form method="post" action="/register" {
                (csrf_input(csrf, errors))
                (text_field("Username", "username", "text", values.username.as_deref(), errors))
                (text_field("Email", "email", "email", values.email.as_deref(), errors))
                (text_field("Password", "password", "password", None, errors))
                button type="submit" { "Register" }
            }
            p { "Already registered? " a href="/login" { "Log in" } }
        },
    )
}

pub fn login(page: &Page, csrf: &str, values: &LoginPost, errors: &FormErrors) -> Markup {
    layout(
        page,
        "Login",
        html! {
            h1 { "Login" }
            form method="post" action="/login" {
                (csrf_input(csrf, errors))
                (text_field("Username", "username", "text", values.username.as_deref(), errors))
                (text_field("Password", "password", "password", None, errors))
                button type="submit" { "Login" }
            }
            p { "No account? " a href="/register" { "Register" } }
        },
    )
}

pub fn add_review(page: &Page, csrf: &str, values: &ReviewPost, errors: &FormErrors) -> Markup {
    layout(
        page,
        "Add Review",
        html! {
            h1 { "Add Review" }
            form method="post" action="/add_review" {
                (csrf_input(csrf, errors))
                (text_field("Movie Title", "movie", "text", values.movie.as_deref(), errors))
                div.field.has-error[errors.has("rating")] {
                    label for="rating" { "Rating (1-10)" }
                    input type="number" id="rating" name="rating" min="1" max="10"
                        value=(values.rating.as_deref().unwrap_or_default());
                    (field_errors(errors, "rating"))
                }
                div.field.has-error[errors.has("comment")] {
                    label for="comment" { "Comment" }
                    textarea id="comment" name="comment" { (values.comment.as_deref().unwrap_or_default()) }
                    (field_errors(errors, "comment"))
                }
                button type="submit" { "Submit Review" }
            }
        },
    )
}

pub fn not_found() -> Markup {
    bare("Not Found", "The requested page does not exist.")
}

pub fn server_error() -> Markup {
    bare("Internal Server Error", "Something went wrong while handling your request.")
}

fn bare(title: &str, message: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                link rel="stylesheet" href="/static/css/style.css";
            }
            body {
                main.container {
                    h1 { (title) }
                    p { (message) }
                    a href="/" { "Back to reviews" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashLevel;

    fn anonymous() -> Page {
        Page {
            user: None,
            flashes: Vec::new(),
        }
    }

    #[test]
    fn review_text_is_escaped() {
        let reviews = vec![ReviewModel {
            id: 1,
            movie: "<script>alert(1)</script>".to_string(),
            rating: 5,
            comment: "a & b".to_string(),
            username: "alice".to_string(),
            user_id: 1,
        }];
        let body = home(&anonymous(), &reviews).into_string();
        assert!(!body.contains("<script>alert"));
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("a &amp; b"));
    }

    #[test]
    fn navigation_follows_session_state() {
        let body = home(&anonymous(), &[]).into_string();
        assert!(body.contains("href=\"/login\""));
        assert!(!body.contains("href=\"/logout\""));

        let page = Page {
            user: Some(SessionUser {
                id: 1,
                username: "alice".to_string(),
            }),
            flashes: vec![Flash {
                level: FlashLevel::Success,
                message: "Review submitted!".to_string(),
            }],
        };
        let body = home(&page, &[]).into_string();
        assert!(body.contains("Signed in as alice"));
        assert!(body.contains("href=\"/logout\""));
        assert!(body.contains("flash flash-success"));
        assert!(body.contains("Review submitted!"));
    }

    #[test]
    fn login_form_never_echoes_password() {
        let values = LoginPost {
            username: Some("alice".to_string()),
            password: Some("hunter2".to_string()),
            csrf_token: None,
        };
        let body = login(&anonymous(), "tok", &values, &FormErrors::new()).into_string();
        assert!(body.contains("value=\"alice\""));
        assert!(!body.contains("hunter2"));
        assert!(body.contains("name=\"csrf_token\" value=\"tok\""));
    }

    #[test]
    fn field_errors_render_next_to_field() {
        let mut errors = FormErrors::new();
        errors.push("rating", "Number must be between 1 and 10.");
        let body =
            add_review(&anonymous(), "tok", &ReviewPost::default(), &errors).into_string();
        assert!(body.contains("<span class=\"error\">Number must be between 1 and 10.</span>"));
    }
}
