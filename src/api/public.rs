use chrono::Utc;
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            registry::{PositionCandidates, PositionView},
            results::ResultsSnapshot,
            window::WindowView,
        },
        db::{
            ballot::Ballot, candidate::Candidate, position::Position, voter::Voter,
            window::WindowDocument,
        },
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_settings, get_positions, get_candidates, get_results]
}

/// The current window configuration, creating the default if none exists.
#[get("/settings")]
async fn get_settings(windows: Coll<WindowDocument>) -> Result<Json<WindowView>> {
    let config = WindowDocument::load_or_create(&windows).await?;
    Ok(Json(config.into()))
}

#[get("/positions")]
async fn get_positions(positions: Coll<Position>) -> Result<Json<Vec<PositionView>>> {
    let mut position_list: Vec<Position> = positions.find(None, None).await?.try_collect().await?;
    position_list.retain(|p| p.active);
    position_list.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(
        position_list
            .into_iter()
            .map(|p| p.position.into())
            .collect(),
    ))
}

/// Active positions with their candidates, as needed to render a ballot.
#[get("/candidates")]
async fn get_candidates(
    positions: Coll<Position>,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<PositionCandidates>>> {
    let position_list: Vec<Position> = positions.find(None, None).await?.try_collect().await?;
    let candidate_list: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;

    let position_cores: Vec<_> = position_list.into_iter().map(|p| p.position).collect();
    let candidate_cores: Vec<_> = candidate_list.into_iter().map(|c| c.candidate).collect();
    Ok(Json(PositionCandidates::group(
        &position_cores,
        &candidate_cores,
    )))
}

/// Recompute the full results snapshot from the stored ballots.
///
/// Any store error fails the whole request; a partial tally is never served.
#[get("/results")]
async fn get_results(
    positions: Coll<Position>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
    voters: Coll<Voter>,
) -> Result<Json<ResultsSnapshot>> {
    let position_list: Vec<Position> = positions.find(None, None).await?.try_collect().await?;
    let candidate_list: Vec<Candidate> = candidates.find(None, None).await?.try_collect().await?;
    let ballot_list: Vec<Ballot> = ballots.find(None, None).await?.try_collect().await?;
    let voter_list: Vec<Voter> = voters.find(None, None).await?.try_collect().await?;

    let position_cores: Vec<_> = position_list.into_iter().map(|p| p.position).collect();
    let candidate_cores: Vec<_> = candidate_list.into_iter().map(|c| c.candidate).collect();
    let ballot_cores: Vec<_> = ballot_list.into_iter().map(|b| b.ballot).collect();

    Ok(Json(ResultsSnapshot::compute(
        &position_cores,
        &candidate_cores,
        &ballot_cores,
        &voter_list,
        Utc::now(),
    )))
}
