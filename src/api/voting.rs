use mongodb::{Client, Database};
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::Result,
    model::{
        api::{actor::Actor, vote::VoteRequest},
        db::Vote,
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// The acting voter casts their vote in the election.
#[post("/elections/<election_id>/votes", data = "<request>", format = "json")]
async fn cast_vote(
    actor: Actor,
    election_id: Id,
    request: Json<VoteRequest>,
    db_client: &State<Client>,
    db: &State<Database>,
    config: &State<Config>,
) -> Result<Status> {
    let ballot = request.into_inner().into_ballot(election_id, actor.0);
    Vote::cast(db_client, db, &ballot, config.voting_clock()).await?;
    Ok(Status::Created)
}
