use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse};
use log::{debug, info, warn};
use maud::Markup;
use sqlx::SqlitePool;

use crate::auth::{check_password, hash_password};
use crate::db::{self, Conflict};
use crate::error::AppError;
use crate::form::FormErrors;
use crate::model::{LoginPost, RegisterPost, ReviewModelCreate, ReviewPost, UserModelCreate};
use crate::session::{FlashLevel, SessionContext, SessionUser};
use crate::view::{self, Page};
use crate::AppState;

/// Review comments are unbounded text; actix's 16 KiB default is too small.
const FORM_LIMIT: usize = 1 << 20;

type FormBody<T> = Result<web::Form<T>, actix_web::Error>;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(FORM_LIMIT))
        .service(index)
        .service(register_form)
        .service(register)
        .service(login_form)
        .service(login)
        .service(logout)
        .service(add_review_form)
        .service(add_review);
}

fn page(session: &SessionContext) -> Result<Page, AppError> {
    Ok(Page {
        user: session.user()?,
        flashes: session.take_flashes()?,
    })
}

fn render(markup: Markup) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(markup.into_string())
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn csrf_ok(session: &SessionContext, submitted: Option<&str>) -> Result<bool, AppError> {
    session.verify_csrf(submitted.unwrap_or_default())
}

/// A missing or unreadable body is treated as an empty form, so it turns into
/// validation messages rather than a bare 400.
fn form_or_default<T: Default>(post: FormBody<T>) -> T {
    match post {
        Ok(form) => form.into_inner(),
        Err(err) => {
            debug!("unreadable form body: {err}");
            T::default()
        }
    }
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(view::not_found().into_string())
}

#[get("/")]
async fn index(
    data: web::Data<AppState>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let reviews = db::list_reviews(&data.db).await?;
    Ok(render(view::home(&page(&session)?, &reviews)))
}

fn render_register(
    session: &SessionContext,
    values: &RegisterPost,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    let csrf = session.csrf_token()?;
    Ok(render(view::register(&page(session)?, &csrf, values, errors)))
}

#[get("/register")]
async fn register_form(session: SessionContext) -> Result<HttpResponse, AppError> {
    render_register(&session, &RegisterPost::default(), &FormErrors::new())
}

#[post("/register")]
async fn register(
    data: web::Data<AppState>,
    post: FormBody<RegisterPost>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let post = form_or_default(post);
    let csrf_valid = csrf_ok(&session, post.csrf_token.as_deref())?;
    let registration = match post.validate(|_| csrf_valid) {
        Ok(registration) => registration,
        Err(errors) => return render_register(&session, &post, &errors),
    };

    let mut errors = FormErrors::new();
    if db::username_taken(&data.db, &registration.username).await? {
        errors.push("username", "Username is already taken.");
    }
    if db::email_taken(&data.db, &registration.email).await? {
        errors.push("email", "Email is already registered.");
    }
    if !errors.is_empty() {
        return render_register(&session, &post, &errors);
    }

    let user = UserModelCreate {
        username: registration.username,
        email: registration.email,
        password_hash: hash_password(&registration.password),
    };

    match insert_user(&data.db, &user, &mut errors).await? {
        Some(id) => info!("registered user {} (id {id})", user.username),
        None => return render_register(&session, &post, &errors),
    }

    session.flash(FlashLevel::Success, "Registered successfully!")?;
    Ok(redirect("/login"))
}

/// Inserts the account. A uniqueness violation from the insert itself (a
/// concurrent registration won) becomes a field error and `None`.
async fn insert_user(
    db: &SqlitePool,
    user: &UserModelCreate,
    errors: &mut FormErrors,
) -> Result<Option<i64>, AppError> {
    match db::create_user(db, user).await {
        Ok(id) => Ok(Some(id)),
        Err(err) => {
            match db::unique_conflict(&err) {
                Some(Conflict::Username) => errors.push("username", "Username is already taken."),
                Some(Conflict::Email) => errors.push("email", "Email is already registered."),
                None => return Err(err.into()),
            }
            Ok(None)
        }
    }
}

fn render_login(
    session: &SessionContext,
    values: &LoginPost,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    let csrf = session.csrf_token()?;
    Ok(render(view::login(&page(session)?, &csrf, values, errors)))
}

#[get("/login")]
async fn login_form(session: SessionContext) -> Result<HttpResponse, AppError> {
    render_login(&session, &LoginPost::default(), &FormErrors::new())
}

#[post("/login")]
async fn login(
    data: web::Data<AppState>,
    post: FormBody<LoginPost>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let post = form_or_default(post);
    let csrf_valid = csrf_ok(&session, post.csrf_token.as_deref())?;
    let credentials = match post.validate(|_| csrf_valid) {
        Ok(credentials) => credentials,
        Err(errors) => return render_login(&session, &post, &errors),
    };

    let user = db::find_user_by_username(&data.db, &credentials.username).await?;
    match user.filter(|user| check_password(&credentials.password, &user.password)) {
        Some(user) => {
            session.log_in(&SessionUser {
                id: user.id,
                username: user.username,
            })?;
            session.flash(FlashLevel::Info, "Logged in successfully!")?;
            Ok(redirect("/"))
        }
        None => {
            warn!("failed login for {}", credentials.username);
            session.flash(FlashLevel::Danger, "Invalid credentials")?;
            render_login(&session, &post, &FormErrors::new())
        }
    }
}

#[get("/logout")]
async fn logout(session: SessionContext) -> Result<HttpResponse, AppError> {
    session.log_out();
    session.flash(FlashLevel::Info, "Logged out!")?;
    Ok(redirect("/login"))
}

fn login_required(session: &SessionContext) -> Result<HttpResponse, AppError> {
    session.flash(FlashLevel::Warning, "Login required to submit a review!")?;
    Ok(redirect("/login"))
}

fn render_add_review(
    session: &SessionContext,
    values: &ReviewPost,
    errors: &FormErrors,
) -> Result<HttpResponse, AppError> {
    let csrf = session.csrf_token()?;
    Ok(render(view::add_review(&page(session)?, &csrf, values, errors)))
}

#[get("/add_review")]
async fn add_review_form(session: SessionContext) -> Result<HttpResponse, AppError> {
    if session.user()?.is_none() {
        return login_required(&session);
    }
    render_add_review(&session, &ReviewPost::default(), &FormErrors::new())
}

#[post("/add_review")]
async fn add_review(
    data: web::Data<AppState>,
    post: FormBody<ReviewPost>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let Some(user) = session.user()? else {
        return login_required(&session);
    };
    let post = form_or_default(post);

    let csrf_valid = csrf_ok(&session, post.csrf_token.as_deref())?;
    let review = match post.validate(|_| csrf_valid) {
        Ok(review) => review,
        Err(errors) => return render_add_review(&session, &post, &errors),
    };

    let id = db::create_review(
        &data.db,
        &ReviewModelCreate {
            movie: review.movie,
            rating: review.rating,
            comment: review.comment,
            username: user.username,
            user_id: user.id,
        },
    )
    .await?;
    info!("review {id} added by user {}", user.id);

    session.flash(FlashLevel::Success, "Review submitted!")?;
    Ok(redirect("/"))
}
