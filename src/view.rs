// bare-bones pages, styling and static assets live elsewhere

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{badge::Badge, dota2::MatchRecord};

#[derive(Debug)]
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html_content) => Html(html_content).into_response(),
            Err(err) => {
                log::error!("failed to render template: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate;

#[derive(Template)]
#[template(path = "new_matches_form.html")]
pub struct NewMatchesFormTemplate {
    badges: &'static [Badge],
}

impl Default for NewMatchesFormTemplate {
    fn default() -> Self {
        Self {
            badges: &Badge::ALL,
        }
    }
}

#[derive(Template)]
#[template(path = "matches.html")]
#[derive(Debug)]
pub struct MatchesTemplate {
    title: String,
    records: Vec<MatchRecord>,
}

impl MatchesTemplate {
    pub fn new_matches(badge: Badge, records: Vec<MatchRecord>) -> Self {
        let title = format!("{} Matches", badge);
        Self { title, records }
    }

    pub fn saved_matches(records: Vec<MatchRecord>) -> Self {
        let title = "Saved Matches".to_string();
        Self { title, records }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    message: String,
}

impl ErrorTemplate {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
