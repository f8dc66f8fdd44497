use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
};

use crate::model::mongodb::Id;

/// The header in which the authenticating layer in front of this service
/// names the entity making the request.
pub const ACTOR_HEADER: &str = "X-Actor-Id";

/// The identity of whoever is making a request: a voter, a candidate or an
/// admin, depending on the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Id);

#[derive(Debug, PartialEq, Eq)]
pub enum ActorError {
    Missing,
    Malformed,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Actor {
    type Error = ActorError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.headers().get_one(ACTOR_HEADER) {
            Some(value) => match value.trim().parse::<Id>() {
                Ok(id) => Outcome::Success(Actor(id)),
                Err(_) => {
                    warn!("Malformed {ACTOR_HEADER} header: {value:?}");
                    Outcome::Error((Status::BadRequest, ActorError::Malformed))
                }
            },
            None => Outcome::Error((Status::Unauthorized, ActorError::Missing)),
        }
    }
}
