use mongodb::{Client, Database};
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::Result,
    model::{
        api::{
            actor::Actor,
            election::{ElectionDescription, ElectionSpec, ParticipationDescription},
        },
        db::{Election, Vote},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![create_election, active_elections, get_election, participation]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    actor: Actor,
    spec: Json<ElectionSpec>,
    db_client: &State<Client>,
    db: &State<Database>,
    config: &State<Config>,
) -> Result<(Status, Json<ElectionDescription>)> {
    let election = Election::create(db_client, db, actor.0, spec.into_inner()).await?;
    let description = ElectionDescription::new(election, config.voting_clock(), 0);
    Ok((Status::Created, Json(description)))
}

#[get("/elections")]
async fn active_elections(
    elections: Coll<Election>,
    votes: Coll<Vote>,
    config: &State<Config>,
) -> Result<Json<Vec<ElectionDescription>>> {
    let now = config.voting_clock();
    let mut descriptions = Vec::new();
    for election in Election::active(&elections).await? {
        let total_votes = election.total_votes(&votes).await?;
        descriptions.push(ElectionDescription::new(election, now, total_votes));
    }
    Ok(Json(descriptions))
}

#[get("/elections/<election_id>")]
async fn get_election(
    election_id: Id,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    config: &State<Config>,
) -> Result<Json<ElectionDescription>> {
    let election = Election::get(&elections, election_id).await?;
    let total_votes = election.total_votes(&votes).await?;
    Ok(Json(ElectionDescription::new(
        election,
        config.voting_clock(),
        total_votes,
    )))
}

/// Whether the caller has voted in, or applied to stand in, the election.
#[get("/elections/<election_id>/status")]
async fn participation(
    actor: Actor,
    election_id: Id,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<ParticipationDescription>> {
    let participation = Election::participation(db_client, db, election_id, actor.0).await?;
    Ok(Json(participation.into()))
}
