use rocket::Route;

mod admin;
mod candidacy;
mod candidates;
mod control;
mod elections;
mod results;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(candidates::routes());
    routes.extend(elections::routes());
    routes.extend(candidacy::routes());
    routes.extend(voting::routes());
    routes.extend(control::routes());
    routes.extend(results::routes());
    routes.extend(admin::routes());
    routes
}

/// Helpers for driving the routes in tests.
#[cfg(test)]
pub(crate) mod test_util {
    use rocket::http::Header;

    use crate::model::{api::actor::ACTOR_HEADER, mongodb::Id};

    /// The header identifying `id` as the caller.
    pub fn actor(id: Id) -> Header<'static> {
        Header::new(ACTOR_HEADER, id.to_hex())
    }
}
