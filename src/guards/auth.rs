use log::debug;
use rocket::request::{self, FromRequest, Request, Outcome};
use rocket::http::Status;

// === OpenAPI (compatible with rocket_okapi 0.8.0 / 0.8.1) ===
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use rocket_okapi::r#gen::OpenApiGenerator;

use crate::models::{Actor, Role};
use crate::services::JwtService;

/// JWT-based authentication guard
pub struct AuthGuard {
    pub actor: Actor,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let token = req.headers().get_one("Authorization");

        match token.and_then(|t| t.strip_prefix("Bearer ")) {
            Some(token) => match JwtService::verify_token(token.trim(), false) {
                Ok(claims) => Outcome::Success(AuthGuard {
                    actor: Actor {
                        uid: claims.sub,
                        role: claims.role,
                        display_name: claims.name,
                        email: claims.email,
                    },
                }),
                Err(_) => Outcome::Error((Status::Unauthorized, ())),
            },
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

async fn with_role<'r>(req: &'r Request<'_>, role: Role) -> request::Outcome<AuthGuard, ()> {
    match req.guard::<AuthGuard>().await {
        Outcome::Success(auth) if auth.actor.role == role => Outcome::Success(auth),
        Outcome::Success(auth) => {
            debug!(
                "{} signed in as {} tried a {} route",
                auth.actor.uid,
                auth.actor.role.as_str(),
                role.as_str()
            );
            Outcome::Error((Status::Unauthorized, ()))
        }
        Outcome::Error(e) => Outcome::Error(e),
        Outcome::Forward(f) => Outcome::Forward(f),
    }
}

/// Signed in through the founder identity provider.
pub struct FounderGuard {
    pub auth: AuthGuard,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for FounderGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        with_role(req, Role::Founder).await.map(|auth| FounderGuard { auth })
    }
}

/// Signed in through the developer identity provider.
pub struct DeveloperGuard {
    pub auth: AuthGuard,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for DeveloperGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        with_role(req, Role::Developer).await.map(|auth| DeveloperGuard { auth })
    }
}

/// === OpenAPI Integration ===
/// The guards don't contribute any special header/parameter for docs.
macro_rules! no_openapi_input {
    ($($guard:ty),*) => {
        $(
            impl<'a> OpenApiFromRequest<'a> for $guard {
                fn from_request_input(
                    _gen: &mut OpenApiGenerator,
                    _name: String,
                    _required: bool,
                ) -> rocket_okapi::Result<RequestHeaderInput> {
                    Ok(RequestHeaderInput::None)
                }
            }
        )*
    };
}

no_openapi_input!(AuthGuard, FounderGuard, DeveloperGuard);
