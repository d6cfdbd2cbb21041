use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::{admin::AdminCredentials, voter::{VoterLoginRequest, VoterView}},
        auth::{AuthToken, AUTH_TOKEN_COOKIE},
        db::{
            admin::Admin,
            voter::{NewVoter, Voter},
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![authenticate_admin, login_voter, logout]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
async fn authenticate_admin(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    let with_username = doc! {
        "username": &credentials.username,
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthorized(
                "No admin found with the provided username and password combination.",
            )
        })?;

    let token = AuthToken::new(&admin);
    cookies.add(token.into_cookie(config));

    Ok(())
}

/// Log a voter in, registering them on first login.
///
/// The issued token captures the login timestamp that the session timeout of
/// the eligibility state machine is measured from; an expired session simply
/// repeats this call to obtain a fresh one.
#[post("/auth/voter", data = "<login>", format = "json")]
async fn login_voter(
    cookies: &CookieJar<'_>,
    login: Json<VoterLoginRequest>,
    voters: Coll<Voter>,
    new_voters: Coll<NewVoter>,
    config: &State<Config>,
) -> Result<Json<VoterView>> {
    if !login.is_valid() {
        return Err(Error::Status(
            Status::UnprocessableEntity,
            "A valid matric number (6 to 15 letters, digits, or slashes), \
             full name, and department are all required."
                .to_string(),
        ));
    }

    let new_voter: NewVoter = login.0.into();
    let with_matric = doc! {
        "matric_number": &new_voter.matric_number,
    };

    let voter = match voters.find_one(with_matric.clone(), None).await? {
        Some(voter) => voter,
        None => {
            // First login: register the voter. A concurrent registration for
            // the same matric number loses the insert race on the unique
            // index, in which case the winner's record is used.
            match new_voters.insert_one(&new_voter, None).await {
                Ok(result) => {
                    let new_id: Id = result
                        .inserted_id
                        .as_object_id()
                        .unwrap() // Safe because the ID comes directly from the database.
                        .into();
                    voters.find_one(new_id.as_doc(), None).await?.unwrap()
                }
                Err(err) if is_duplicate_key_error(&err) => voters
                    .find_one(with_matric, None)
                    .await?
                    .ok_or_else(|| Error::not_found("Voter"))?,
                Err(err) => return Err(err.into()),
            }
        }
    };

    // A repeat login must match the registered record; never issue a session
    // for an existing voter under different personal details.
    if voter.conflicts_with(&new_voter) {
        return Err(Error::Status(
            Status::Conflict,
            "This matric number is already registered with different details.".to_string(),
        ));
    }

    let token = AuthToken::new(&voter);
    cookies.add(token.into_cookie(config));

    Ok(Json(voter.into()))
}

#[delete("/auth")]
fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
