use std::io;

use actix_files as fs;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};

use config::{Config, TlsConfig};

mod auth;
mod config;
mod db;
mod error;
mod form;
mod handler;
mod model;
mod session;
mod view;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config =
        Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let db_pool = db::connect(&config.database_url)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    db::create_schema(&db_pool)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    info!("database ready at {}", config.database_url);

    let app_state = AppState { db: db_pool };
    let session_config = config.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(Logger::default())
            .wrap(session::session_middleware(
                session_config.secret_key.clone(),
                session_config.cookie_secure,
                session_config.session_ttl_secs,
            ))
            .service(fs::Files::new("/static", "./public"))
            .configure(handler::configure)
            .default_service(web::route().to(handler::not_found))
    });

    let addr = (config.ip.as_str(), config.port);
    let server = match &config.tls {
        Some(tls) => {
            info!("listening on https://{}:{}", config.ip, config.port);
            server.bind_openssl(addr, ssl_builder(tls)?)?
        }
        None => {
            info!("listening on http://{}:{}", config.ip, config.port);
            server.bind(addr)?
        }
    };

    server.run().await
}

fn ssl_builder(tls: &TlsConfig) -> io::Result<SslAcceptorBuilder> {
    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())?;
    builder.set_private_key_file(&tls.private_key, SslFiletype::PEM)?;
    builder.set_certificate_chain_file(&tls.cert_chain)?;
    Ok(builder)
}
