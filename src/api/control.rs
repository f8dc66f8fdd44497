use mongodb::{Client, Database};
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            actor::Actor,
            gate::{BatchGateRequest, BatchOutcome, BatchRequest, GateValue},
        },
        db::Election,
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![toggle_gate, force_end, toggle_gate_batch, force_end_batch]
}

#[put("/elections/<election_id>/gates/<gate>", data = "<value>", format = "json")]
async fn toggle_gate(
    actor: Actor,
    election_id: Id,
    gate: &str,
    value: Json<GateValue>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<GateValue>> {
    Election::toggle_gate(db_client, db, actor.0, election_id, gate, value.value).await?;
    Ok(value)
}

#[post("/elections/<election_id>/force-end")]
async fn force_end(
    actor: Actor,
    election_id: Id,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<()> {
    Election::force_end(db_client, db, actor.0, election_id).await
}

#[post("/elections/batch/gates/<gate>", data = "<request>", format = "json")]
async fn toggle_gate_batch(
    actor: Actor,
    gate: &str,
    request: Json<BatchGateRequest>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<BatchOutcome>> {
    let affected = Election::toggle_gate_batch(
        db_client,
        db,
        actor.0,
        &request.election_ids,
        gate,
        request.value,
    )
    .await?;
    Ok(Json(BatchOutcome { affected }))
}

#[post("/elections/batch/force-end", data = "<request>", format = "json")]
async fn force_end_batch(
    actor: Actor,
    request: Json<BatchRequest>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<BatchOutcome>> {
    let affected =
        Election::force_end_batch(db_client, db, actor.0, &request.election_ids).await?;
    Ok(Json(BatchOutcome { affected }))
}
