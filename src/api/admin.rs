use mongodb::{Client, Database};
use rocket::{serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::Result,
    model::{
        api::admin_action::AdminActionDescription,
        db::{AdminAction, TallyMismatch, Vote},
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![recent_actions, election_actions, check_tallies]
}

/// The most recent audit log entries, newest first.
#[get("/admin/actions?<limit>")]
async fn recent_actions(
    limit: Option<u32>,
    actions: Coll<AdminAction>,
    config: &State<Config>,
) -> Result<Json<Vec<AdminActionDescription>>> {
    let limit = limit.unwrap_or_else(|| config.audit_page_size());
    let recent = AdminAction::recent(&actions, limit).await?;
    Ok(Json(recent.into_iter().map(Into::into).collect()))
}

/// The full audit trail of one election, oldest first.
#[get("/admin/elections/<election_id>/actions")]
async fn election_actions(
    election_id: Id,
    actions: Coll<AdminAction>,
) -> Result<Json<Vec<AdminActionDescription>>> {
    let trail = AdminAction::for_election(&actions, election_id).await?;
    Ok(Json(trail.into_iter().map(Into::into).collect()))
}

/// Candidates whose stored tally disagrees with the committed votes.
#[get("/admin/tallies")]
async fn check_tallies(
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<Vec<TallyMismatch>>> {
    Ok(Json(Vote::audit_tallies(db_client, db).await?))
}

#[cfg(test)]
mod tests {
    use mongodb::Client as DbClient;
    use rocket::{http::Status, local::asynchronous::Client, serde::json::Value};

    use super::*;
    use crate::api::test_util::actor;
    use crate::model::{
        api::{
            election::{ElectionDescription, ElectionSpec},
            gate::GateValue,
        },
        db::{Candidate, Election},
    };

    #[backend_test]
    async fn actions_are_listed_newest_first(client: Client, db_client: DbClient, db: Database) {
        let admin = Id::new();
        let elections = (0..20).map(|_| Election::example()).collect::<Vec<_>>();
        Coll::<Election>::from_db(&db)
            .insert_many(&elections, None)
            .await
            .unwrap();
        for election in &elections {
            Election::force_end(&db_client, &db, admin, election.id)
                .await
                .unwrap();
        }

        let response = client.get("/admin/actions?limit=3").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let recent = response
            .into_json::<Vec<AdminActionDescription>>()
            .await
            .unwrap();
        let ids = recent
            .iter()
            .map(|action| action.election_id.unwrap())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![elections[19].id, elections[18].id, elections[17].id]);
        assert!(recent.iter().all(|action| action.actor_id == admin));

        // Without a limit, the configured page size applies.
        let recent = client
            .get("/admin/actions")
            .dispatch()
            .await
            .into_json::<Vec<Value>>()
            .await
            .unwrap();
        assert_eq!(recent.len(), 15);

        let response = client.get("/admin/actions?limit=0").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_json::<Vec<Value>>().await, Some(Vec::new()));
    }

    #[backend_test]
    async fn election_trail_is_oldest_first(client: Client) {
        let admin = Id::new();
        let created = client
            .post("/elections")
            .header(actor(admin))
            .json(&ElectionSpec::example())
            .dispatch()
            .await
            .into_json::<ElectionDescription>()
            .await
            .unwrap();
        let id = created.id.to_hex();

        let response = client
            .put(format!("/elections/{id}/gates/voting_open"))
            .header(actor(admin))
            .json(&GateValue { value: false })
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let response = client
            .post(format!("/elections/{id}/force-end"))
            .header(actor(admin))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let trail = client
            .get(format!("/admin/elections/{id}/actions"))
            .dispatch()
            .await
            .into_json::<Vec<AdminActionDescription>>()
            .await
            .unwrap();
        let labels = trail
            .iter()
            .map(|action| action.action.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec!["Create election", "Toggle voting_open", "Force-end election"]
        );
        assert_eq!(trail[1].details, "voting_open -> false");

        // Unknown elections simply have no trail.
        let response = client
            .get(uri!(election_actions(Id::new())))
            .dispatch()
            .await;
        assert_eq!(response.into_json::<Vec<Value>>().await, Some(Vec::new()));
    }

    #[backend_test]
    async fn tallies(client: Client, candidates: Coll<Candidate>) {
        let response = client.get(uri!(check_tallies)).dispatch().await;
        assert_eq!(
            response.into_json::<Vec<Value>>().await,
            Some(Vec::new())
        );

        let mut alice = Candidate::approved_example("Alice");
        alice.vote_count = 1;
        candidates.insert_one(&alice, None).await.unwrap();

        let mismatches = client
            .get(uri!(check_tallies))
            .dispatch()
            .await
            .into_json::<Vec<Value>>()
            .await
            .unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0]["candidate_id"], alice.id.to_hex());
        assert_eq!(mismatches[0]["recorded"], 1);
        assert_eq!(mismatches[0]["counted"], 0);
    }
}
