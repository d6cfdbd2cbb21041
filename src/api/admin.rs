use mongodb::{bson::doc, Client};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{
        api::{
            ballot::BallotView,
            registry::{CandidateSpec, CandidateView, PositionSpec, PositionView},
            voter::VoterView,
            window::WindowView,
        },
        auth::AuthToken,
        common::window::WindowConfigUpdate,
        db::{
            admin::Admin,
            ballot::Ballot,
            candidate::{Candidate, NewCandidate},
            position::{NewPosition, Position},
            voter::Voter,
            window::WindowDocument,
        },
        mongodb::{candidate_id_counter_id, Coll, Counter},
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        list_voters,
        list_votes,
        create_position,
        delete_position,
        create_candidate,
        rename_candidate,
        delete_candidate,
        update_settings,
    ]
}

#[get("/voters")]
async fn list_voters(_token: AuthToken<Admin>, voters: Coll<Voter>) -> Result<Json<Vec<VoterView>>> {
    let voter_list: Vec<Voter> = voters.find(None, None).await?.try_collect().await?;
    Ok(Json(voter_list.into_iter().map(VoterView::from).collect()))
}

/// The raw stored ballots, in submission order, for admin review.
#[get("/votes")]
async fn list_votes(
    _token: AuthToken<Admin>,
    ballots: Coll<Ballot>,
) -> Result<Json<Vec<BallotView>>> {
    let mut ballot_list: Vec<Ballot> = ballots.find(None, None).await?.try_collect().await?;
    ballot_list.sort_by_key(|b| b.submitted_at);
    Ok(Json(ballot_list.into_iter().map(BallotView::from).collect()))
}

#[post("/positions", data = "<spec>", format = "json")]
async fn create_position(
    _token: AuthToken<Admin>,
    spec: Json<PositionSpec>,
    positions: Coll<Position>,
    new_positions: Coll<NewPosition>,
) -> Result<Json<PositionView>> {
    if spec.position.trim().is_empty() {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            "Position name is required.".to_string(),
        ));
    }

    let position: NewPosition = spec.0.into();
    let with_name = doc! {
        "name": &position.name,
    };
    if positions.find_one(with_name, None).await?.is_some() {
        return Err(Error::Status(
            Status::Conflict,
            format!("Position already exists: {}", position.name),
        ));
    }

    new_positions.insert_one(&position, None).await?;
    Ok(Json(position.into()))
}

/// Delete a position; its candidates are cascade-deleted in the same
/// transaction.
#[delete("/positions/<name>")]
async fn delete_position(
    _token: AuthToken<Admin>,
    name: &str,
    positions: Coll<Position>,
    candidates: Coll<Candidate>,
    db_client: &State<Client>,
) -> Result<()> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let result = positions
        .delete_one_with_session(doc! { "name": name }, None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        session.abort_transaction().await?;
        return Err(Error::not_found(format!("Position '{name}'")));
    }

    candidates
        .delete_many_with_session(doc! { "position": name }, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    Ok(())
}

#[post("/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    _token: AuthToken<Admin>,
    spec: Json<CandidateSpec>,
    positions: Coll<Position>,
    new_candidates: Coll<NewCandidate>,
    counters: Coll<Counter>,
) -> Result<Json<CandidateView>> {
    if spec.name.trim().is_empty() {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            "Candidate name is required.".to_string(),
        ));
    }

    // The position must already exist.
    let with_name = doc! {
        "name": &spec.position,
    };
    if positions.find_one(with_name, None).await?.is_none() {
        return Err(Error::not_found(format!("Position '{}'", spec.position)));
    }

    // Allocate the next candidate ID from the global atomic counter.
    let candidate_id = Counter::next(&counters, candidate_id_counter_id()).await?;
    let candidate = spec.0.into_candidate(candidate_id);
    new_candidates.insert_one(&candidate, None).await?;

    Ok(Json(candidate.into()))
}

/// A candidate rename request.
#[derive(Debug, Deserialize)]
struct RenameRequest {
    name: String,
}

#[put("/candidates/<candidate_id>", data = "<rename>", format = "json")]
async fn rename_candidate(
    _token: AuthToken<Admin>,
    candidate_id: u32,
    rename: Json<RenameRequest>,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidateView>> {
    if rename.name.trim().is_empty() {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            "Candidate name is required.".to_string(),
        ));
    }

    let filter = doc! {
        "candidate_id": candidate_id,
    };
    let update = doc! {
        "$set": { "name": rename.name.trim() }
    };
    let result = candidates.update_one(filter.clone(), update, None).await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }

    // A concurrent delete may have removed the candidate since the update.
    let candidate = candidates
        .find_one(filter, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {candidate_id}")))?;
    Ok(Json(candidate.candidate.into()))
}

#[delete("/candidates/<candidate_id>")]
async fn delete_candidate(
    _token: AuthToken<Admin>,
    candidate_id: u32,
    candidates: Coll<Candidate>,
) -> Result<()> {
    let filter = doc! {
        "candidate_id": candidate_id,
    };
    let result = candidates.delete_one(filter, None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Candidate {candidate_id}")));
    }
    Ok(())
}

/// Upsert the voting window configuration; absent fields keep their current
/// (or default) value. Takes effect for all sessions within their next poll.
#[put("/settings", data = "<update>", format = "json")]
async fn update_settings(
    _token: AuthToken<Admin>,
    update: Json<WindowConfigUpdate>,
    windows: Coll<WindowDocument>,
) -> Result<Json<WindowView>> {
    let current = WindowDocument::load_or_create(&windows).await?;
    let updated = current.updated(update.0);
    if updated.voting_end_time <= updated.voting_start_time {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            "Voting end time must be after the start time.".to_string(),
        ));
    }
    WindowDocument::upsert(&windows, &updated).await?;
    Ok(Json(updated.into()))
}
