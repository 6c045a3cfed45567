use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use actix_session::SessionMiddleware;
use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, time};
use actix_web::dev::Server;
use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;

use crate::authentication::reject_anonymous_users;
use crate::configuration::{DatabaseSettings, Settings};
use crate::newsletter::{EmailTemplate, NewsletterDispatcher, PgNewsletterStore};
use crate::routes::{
    AdminPassword, create_post, delete_post, delete_subscriber, export_subscribers, get_post,
    get_post_by_slug, health_check, json_payload_error, list_all_posts, list_posts,
    list_subscribers, load_views, log_out, login, publish_newsletter, publish_post_newsletter,
    subscribe, unsubscribe, unsubscribe_form, update_post,
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&config.database);
        let email_client = config.email_client.clone().client()?;
        let store = PgNewsletterStore::new(connection_pool.clone());
        let dispatcher =
            build_dispatcher(&config, Arc::new(email_client), Arc::new(store))?;

        Self::build_with(config, connection_pool, dispatcher)
    }

    /// Builds the server around an already assembled dispatcher.
    pub fn build_with(
        config: Settings,
        connection_pool: PgPool,
        dispatcher: NewsletterDispatcher,
    ) -> Result<Self, anyhow::Error> {
        let address = format!("{}:{}", config.app.host, config.app.port);
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {address}"))?;
        let port = listener.local_addr()?.port();
        let server = run(listener, connection_pool, dispatcher, config)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn build_dispatcher(
    config: &Settings,
    sender: Arc<dyn crate::email_client::EmailSender>,
    store: Arc<dyn crate::newsletter::NewsletterStore>,
) -> Result<NewsletterDispatcher, anyhow::Error> {
    let template = EmailTemplate::new(
        config.app.site_origin(),
        config.newsletter.organization_name.clone(),
        config.newsletter.default_link_text.clone(),
    )
    .context("Failed to load the newsletter email template")?;

    Ok(NewsletterDispatcher::new(sender, store, template))
}

fn run(
    listener: TcpListener,
    db_pool: PgPool,
    dispatcher: NewsletterDispatcher,
    config: Settings,
) -> Result<Server, anyhow::Error> {
    let db_pool = web::Data::new(db_pool);
    let dispatcher = web::Data::new(dispatcher);
    let admin_password = web::Data::new(AdminPassword(config.app.admin_password.clone()));
    let newsletter_settings = web::Data::new(config.newsletter.clone());
    let views = web::Data::new(load_views().context("Failed to load HTML views")?);
    let secret_key = session_key(&config.app.hmac_secret)?;
    let secure_cookie = config.app.secure_cookie;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_name("admin_session".into())
                    .cookie_secure(secure_cookie)
                    .session_lifecycle(
                        PersistentSession::default().session_ttl(time::Duration::days(7)),
                    )
                    .build(),
            )
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/login", web::post().to(login))
            .route("/subscriptions", web::post().to(subscribe))
            .route("/unsubscribe", web::get().to(unsubscribe_form))
            .route("/unsubscribe", web::post().to(unsubscribe))
            .route("/posts", web::get().to(list_posts))
            .route("/posts/{slug}", web::get().to(get_post_by_slug))
            .service(
                web::scope("/admin")
                    .wrap(from_fn(reject_anonymous_users))
                    .route("/logout", web::post().to(log_out))
                    .route("/newsletters", web::post().to(publish_newsletter))
                    .route("/posts", web::get().to(list_all_posts))
                    .route("/posts", web::post().to(create_post))
                    .route("/posts/{id}", web::get().to(get_post))
                    .route("/posts/{id}", web::patch().to(update_post))
                    .route("/posts/{id}", web::delete().to(delete_post))
                    .route(
                        "/posts/{id}/newsletter",
                        web::post().to(publish_post_newsletter),
                    )
                    .route("/subscribers", web::get().to(list_subscribers))
                    .route("/subscribers/export", web::get().to(export_subscribers))
                    .route("/subscribers/{id}", web::delete().to(delete_subscriber)),
            )
            .app_data(web::JsonConfig::default().error_handler(json_payload_error))
            .app_data(db_pool.clone())
            .app_data(dispatcher.clone())
            .app_data(admin_password.clone())
            .app_data(newsletter_settings.clone())
            .app_data(views.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

fn session_key(hmac_secret: &SecretString) -> Result<Key, anyhow::Error> {
    let secret = hmac_secret.expose_secret().as_bytes();
    if secret.len() < 64 {
        anyhow::bail!("The session secret must be at least 64 bytes long");
    }
    Ok(Key::from(secret))
}

pub fn get_connection_pool(db_config: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(db_config.with_db())
}
