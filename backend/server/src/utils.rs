use axum::{
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

pub const VIEW_ROUTE: &str = "/view/";
pub const EDIT_ROUTE: &str = "/edit/";
pub const SAVE_ROUTE: &str = "/save/";
pub const DELETE_ROUTE: &str = "/delete/";

/// 302 to `route` followed by the percent-encoded title.
pub fn redirect_to(route: &str, title: &str) -> Response {
    let location = format!("{route}{}", urlencoding::encode(title));

    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}
