use mongodb::{Client, Database};
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            actor::Actor,
            application::{ApplicationDescription, ApplicationRequest, ReviewRequest},
        },
        db::Application,
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![submit_application, get_application, review_application]
}

/// The acting candidate applies to stand in the election.
#[post("/elections/<election_id>/applications", data = "<request>", format = "json")]
async fn submit_application(
    actor: Actor,
    election_id: Id,
    request: Json<ApplicationRequest>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<(Status, Json<ApplicationDescription>)> {
    let application =
        Application::submit(db_client, db, actor.0, election_id, request.into_inner().statement)
            .await?;
    Ok((Status::Created, Json(application.into())))
}

#[get("/applications/<application_id>")]
async fn get_application(
    application_id: Id,
    applications: Coll<Application>,
) -> Result<Json<ApplicationDescription>> {
    Ok(Json(Application::get(&applications, application_id).await?.into()))
}

/// The acting admin approves or rejects the application.
#[post("/applications/<application_id>/review", data = "<request>", format = "json")]
async fn review_application(
    actor: Actor,
    application_id: Id,
    request: Json<ReviewRequest>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<ApplicationDescription>> {
    let ReviewRequest { decision, notes } = request.into_inner();
    let application =
        Application::review(db_client, db, actor.0, application_id, decision, notes).await?;
    Ok(Json(application.into()))
}
