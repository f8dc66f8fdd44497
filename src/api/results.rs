use mongodb::{Client, Database};
use rocket::{
    http::{ContentType, Header},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::Result,
    model::{
        api::results::{csv_filename, to_csv, ResultEntry, ResultsFeed},
        db::{Election, Vote},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_results, results_feed, export_csv]
}

/// A CSV file download.
#[derive(Responder)]
struct CsvExport {
    body: String,
    content_type: ContentType,
    disposition: Header<'static>,
}

#[get("/elections/<election_id>/results")]
async fn get_results(
    election_id: Id,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<Vec<ResultEntry>>> {
    Ok(Json(Vote::results(db_client, db, election_id).await?))
}

#[get("/elections/<election_id>/results/feed")]
async fn results_feed(
    election_id: Id,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<ResultsFeed>> {
    let results = Vote::results(db_client, db, election_id).await?;
    Ok(Json(results.as_slice().into()))
}

#[get("/elections/<election_id>/results/csv")]
async fn export_csv(
    election_id: Id,
    elections: Coll<Election>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<CsvExport> {
    let election = Election::get(&elections, election_id).await?;
    let results = Vote::results(db_client, db, election_id).await?;
    let filename = csv_filename(&election.title);
    Ok(CsvExport {
        body: to_csv(&results),
        content_type: ContentType::CSV,
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ),
    })
}
