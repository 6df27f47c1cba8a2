#[macro_use]
extern crate rocket;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;

use dotenvy::dotenv;
use log::info;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::serde::json::{json, Value};
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

fn error_body(message: &str) -> Value {
    json!({
        "success": false,
        "message": message
    })
}

#[catch(400)]
fn bad_request() -> Value {
    error_body("Malformed request")
}

#[catch(401)]
fn unauthorized() -> Value {
    error_body("Please sign in to continue")
}

#[catch(403)]
fn forbidden() -> Value {
    error_body("You are not allowed to do that")
}

#[catch(404)]
fn not_found() -> Value {
    error_body("Resource not found (check /api/v1 prefix)")
}

#[catch(422)]
fn unprocessable() -> Value {
    error_body("Request body does not match the expected shape")
}

#[catch(500)]
fn internal_error() -> Value {
    error_body("Internal server error")
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/v1/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- APP ----------------------------- */

/// Everything except the store, so tests can manage their own.
pub fn app() -> Rocket<Build> {
    rocket::build()
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Auth
                routes::auth::sign_in,
                routes::auth::refresh_token,
                // User
                routes::user::get_me,
                // Developer
                routes::developer::get_developer_profile,
                routes::developer::update_developer_profile,
                routes::developer::github_stats,
                // Listings
                routes::listing::create_listing,
                routes::listing::browse_listings,
                routes::listing::get_listing,
                routes::listing::founder_listings,
                routes::listing::founder_dashboard,
                // Applications
                routes::application::submit_application,
                routes::application::listing_applications,
                routes::application::approve_application,
                routes::application::reject_application,
                routes::application::delete_application,
                routes::application::my_applications,
                // Notifications
                routes::notification::get_notifications,
                routes::notification::unread_count,
                routes::notification::mark_read,
            ],
        )
        .mount(
            "/api/v1",
            routes![
                routes::stream::notification_stream,
                routes::stream::listing_stream,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![bad_request, unauthorized, forbidden, not_found, unprocessable, internal_error],
        )
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 FutureCo API running");
    if config::Config::is_development() {
        info!("📚 Swagger UI → http://localhost:8000/api/docs");
    }

    app().attach(db::init())
}
