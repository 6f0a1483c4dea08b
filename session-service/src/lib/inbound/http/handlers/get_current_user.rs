use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::NaiveDate;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::session::models::Principal;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::User;
use crate::inbound::http::router::AppState;

pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiSuccess<CurrentUserResponseData>, ApiError> {
    state
        .session_service
        .current_user(&principal)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUserResponseData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub designation: Option<String>,
    pub profile_picture: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub join_date: NaiveDate,
}

impl From<&User> for CurrentUserResponseData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            designation: user.designation.clone(),
            profile_picture: user.profile_picture.clone(),
            birthdate: user.birthdate,
            join_date: user.join_date,
        }
    }
}
