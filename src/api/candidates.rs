use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::candidate::{CandidateDescription, CandidateRegistration},
        db::Candidate,
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![register_candidate, get_candidate]
}

#[post("/candidates", data = "<registration>", format = "json")]
async fn register_candidate(
    registration: Json<CandidateRegistration>,
    candidates: Coll<Candidate>,
) -> Result<(Status, Json<CandidateDescription>)> {
    let candidate = Candidate::register(&candidates, registration.into_inner()).await?;
    Ok((Status::Created, Json(candidate.into())))
}

#[get("/candidates/<candidate_id>")]
async fn get_candidate(
    candidate_id: Id,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidateDescription>> {
    let candidate = Candidate::get(&candidates, candidate_id).await?;
    Ok(Json(candidate.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        local::asynchronous::Client,
        serde::json::{serde_json, Value},
    };

    use super::*;

    #[backend_test]
    async fn register_then_fetch(client: Client) {
        let response = client
            .post(uri!(register_candidate))
            .json(&CandidateRegistration::example("Alice"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let registered = response.into_json::<CandidateDescription>().await.unwrap();
        assert_eq!(registered.full_name, "Alice");
        assert!(!registered.is_approved);
        assert!(!registered.standing);

        let response = client
            .get(uri!(get_candidate(registered.id)))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let fetched = response.into_json::<CandidateDescription>().await.unwrap();
        assert_eq!(fetched, registered);
    }

    #[backend_test]
    async fn registration_errors(client: Client) {
        let mut minor = CandidateRegistration::example("Alice");
        minor.age = 12;
        let response = client
            .post(uri!(register_candidate))
            .json(&minor)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        for expected in [Status::Created, Status::Conflict] {
            let response = client
                .post(uri!(register_candidate))
                .json(&CandidateRegistration::example("Alice"))
                .dispatch()
                .await;
            assert_eq!(response.status(), expected);
            if expected == Status::Conflict {
                let body = response.into_json::<Value>().await.unwrap();
                assert_eq!(body["error"], "duplicate_candidate");
            }
        }
    }

    #[backend_test]
    async fn unknown_candidate(client: Client) {
        let response = client
            .get(uri!(get_candidate(Id::new())))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
        let body: Value = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(body["error"], "not_found");
    }
}
