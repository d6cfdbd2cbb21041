use chrono::Utc;
use mongodb::{bson::doc, Client};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::ballot::{CastBallotRequest, CastBallotResponse},
        auth::AuthToken,
        common::eligibility::{Eligibility, ExpiryReason},
        db::{
            ballot::NewBallot,
            candidate::Candidate,
            position::Position,
            voter::{VoteClaim, Voter},
            window::WindowDocument,
        },
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![session_eligibility, cast_ballot]
}

/// The current eligibility of the voter session.
///
/// Clients poll this (and re-evaluate locally against the refetched window
/// configuration on a 1 s tick); the decisive evaluation for actually
/// accepting a ballot happens inside [`cast_ballot`].
#[get("/session/eligibility")]
async fn session_eligibility(
    token: AuthToken<Voter>,
    voters: Coll<Voter>,
    windows: Coll<WindowDocument>,
) -> Result<Json<Eligibility>> {
    let voter = voters
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter {}", token.id)))?;

    if voter.has_voted {
        return Ok(Json(Eligibility::Submitted));
    }

    let window = WindowDocument::load_or_create(&windows).await?;
    Ok(Json(Eligibility::evaluate(
        &window,
        token.login_at,
        Utc::now(),
    )))
}

/// Cast a ballot.
///
/// Checks, each with a distinct failure signal: the voter must exist
/// (submission does not implicitly register), the eligibility state machine
/// must currently permit casting, the ballot must be well-shaped against the
/// registry, and the voter must not have voted before. The ballot insert and
/// the `has_voted` flip are one transaction, gated by a conditional update on
/// `has_voted`, so concurrent duplicate submissions produce exactly one
/// stored ballot; that same guard makes a client retry after an ambiguous
/// timeout safe.
#[post("/votes", data = "<request>", format = "json")]
#[allow(clippy::too_many_arguments)]
async fn cast_ballot(
    token: AuthToken<Voter>,
    request: Json<CastBallotRequest>,
    voters: Coll<Voter>,
    positions: Coll<Position>,
    candidates: Coll<Candidate>,
    ballots: Coll<NewBallot>,
    windows: Coll<WindowDocument>,
    db_client: &State<Client>,
) -> Result<Json<CastBallotResponse>> {
    // The voter must exist.
    let voter = voters
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter {}", token.id)))?;

    // Authoritative eligibility re-check against a fresh window snapshot;
    // the client's own countdown is advisory only.
    let now = Utc::now();
    let window = WindowDocument::load_or_create(&windows).await?;
    let eligibility = Eligibility::evaluate(&window, token.login_at, now);
    if !eligibility.permits_casting() {
        return Err(Error::Status(
            Status::Forbidden,
            format!("Voting is not currently permitted: {}", describe(&eligibility)),
        ));
    }

    // Cheap early rejection; the conditional update below remains the
    // authoritative at-most-once guard.
    if voter.has_voted {
        return Err(already_voted());
    }

    // Validate the ballot shape against the registry.
    let position_list: Vec<Position> = positions.find(None, None).await?.try_collect().await?;
    let candidate_list: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    let position_cores: Vec<_> = position_list.into_iter().map(|p| p.position).collect();
    let candidate_cores: Vec<_> = candidate_list.into_iter().map(|c| c.candidate).collect();
    let entries = request
        .0
        .into_vote_entries(&position_cores, &candidate_cores)
        .map_err(|fault| Error::Status(Status::UnprocessableEntity, fault.to_string()))?;

    // Persist the ballot and flip `has_voted` as one logical transaction.
    // The `has_voted: false` filter is the compare-and-swap closing the race
    // between two concurrent submissions from the same voter.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let guard = doc! {
        "_id": voter.id,
        "has_voted": false,
    };
    let update = doc! {
        "$set": { "has_voted": true }
    };
    let result = voters
        .update_one_with_session(guard, update, None, &mut session)
        .await?;
    if VoteClaim::from_modified_count(result.modified_count) == VoteClaim::AlreadyVoted {
        session.abort_transaction().await?;
        return Err(already_voted());
    }

    let ballot = NewBallot::new(voter.id, voter.matric_number.clone(), entries, now);
    ballots
        .insert_one_with_session(&ballot, None, &mut session)
        .await?;

    session.commit_transaction().await?;

    info!("Ballot recorded for voter {}", voter.matric_number);
    Ok(Json(CastBallotResponse { submitted_at: now }))
}

fn already_voted() -> Error {
    Error::Status(
        Status::Conflict,
        "Voter has already voted".to_string(),
    )
}

fn describe(eligibility: &Eligibility) -> &'static str {
    match eligibility {
        Eligibility::AwaitingWindow { .. } => "the voting window has not opened yet",
        Eligibility::Voting { .. } => "voting is open",
        Eligibility::Submitted => "this session has already submitted a ballot",
        Eligibility::Expired { reason } => match reason {
            ExpiryReason::VotingDisabled => "voting has been disabled by the admin",
            ExpiryReason::WindowEnded => "the voting window has ended",
            ExpiryReason::LoginTimeout => "the login session has timed out",
        },
    }
}
