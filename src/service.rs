use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    badge::{Badge, UnknownBadge},
    client::{MatchSource, RequestError},
    database::{MatchStore, StoreError},
    dota2::MatchRecord,
    rate::{self, DispatchError, RateControl},
    view::{
        ErrorTemplate, HtmlTemplate, IndexTemplate, MatchesTemplate, NewMatchesFormTemplate,
    },
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    UnknownBadge(#[from] UnknownBadge),
    #[error("Invalid match id: {0}")]
    InvalidMatchId(String),
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] RequestError),
    #[error("Batch request failed: {0}")]
    Batch(#[from] DispatchError<RequestError>),
    #[error("Storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::UnknownBadge(_) | AppError::InvalidMatchId(_) => {
                log::info!("rejected request: {}", self);
                let page = ErrorTemplate::new(self.to_string());
                (StatusCode::BAD_REQUEST, HtmlTemplate(page)).into_response()
            }
            _ => {
                log::error!("{}", self);
                let upstream = match &self {
                    AppError::Upstream(err) | AppError::Batch(DispatchError::Failed(err)) => Some(err),
                    _ => None,
                };
                if let Some(body) = upstream.and_then(RequestError::undecoded_body) {
                    log::debug!("undecodable upstream response: {}", body);
                }
                let page = ErrorTemplate::new("Internal Server Error");
                (StatusCode::INTERNAL_SERVER_ERROR, HtmlTemplate(page)).into_response()
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewMatchesForm {
    // a missing badge is just another unrecognized one
    #[serde(default)]
    pub badge: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SaveMatchesForm {
    #[serde(default)]
    pub match_list: String,
}

pub struct AppState {
    source: Arc<dyn MatchSource>,
    store: Arc<dyn MatchStore>,
    dispatch_interval: Duration,
}

impl AppState {
    pub fn new(
        source: Arc<dyn MatchSource>,
        store: Arc<dyn MatchStore>,
        dispatch_interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            dispatch_interval,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/newmatches", get(new_matches_form).post(new_matches))
        .route("/savedmatches", get(saved_matches))
        .route("/savematches", post(save_matches))
        .with_state(state)
}

pub async fn index() -> HtmlTemplate<IndexTemplate> {
    HtmlTemplate(IndexTemplate)
}

pub async fn new_matches_form() -> HtmlTemplate<NewMatchesFormTemplate> {
    HtmlTemplate(NewMatchesFormTemplate::default())
}

pub async fn new_matches(
    State(state): State<Arc<AppState>>,
    Form(form): Form<NewMatchesForm>,
) -> Result<HtmlTemplate<MatchesTemplate>, AppError> {
    let badge: Badge = form.badge.parse()?;
    let range = badge.rank_range();
    log::info!(
        "requesting public matches for {} (rank {}..={})",
        badge,
        range.min,
        range.max
    );

    let matches = state.source.get_public_matches(range.min).await?;
    let records: Vec<MatchRecord> = matches.iter().map(MatchRecord::from).collect();
    Ok(HtmlTemplate(MatchesTemplate::new_matches(badge, records)))
}

pub async fn saved_matches(
    State(state): State<Arc<AppState>>,
) -> Result<HtmlTemplate<MatchesTemplate>, AppError> {
    log::info!("listing saved matches");
    let records = state.store.list_all().await?;
    Ok(HtmlTemplate(MatchesTemplate::saved_matches(records)))
}

pub async fn save_matches(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SaveMatchesForm>,
) -> Result<Redirect, AppError> {
    let match_ids = parse_match_list(&form.match_list)?;
    log::info!("incoming request to save matches: {:?}", match_ids);

    let records = fetch_records(&state, &match_ids).await?;
    if records.is_empty() {
        log::warn!("no matches found to save, match ids: {:?}", match_ids);
    } else {
        log::info!("inserting {} matches", records.len());
        let ids = state.store.save_many(&records).await?;
        log::debug!("inserted ids: {:?}", ids);
    }

    Ok(Redirect::to("/savedmatches"))
}

fn parse_match_list(match_list: &str) -> Result<Vec<u64>, AppError> {
    match_list
        .split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| AppError::InvalidMatchId(token.to_string()))
        })
        .collect()
}

// paced so we stay under the upstream rate limit
async fn fetch_records(state: &AppState, match_ids: &[u64]) -> Result<Vec<MatchRecord>, AppError> {
    let mut rate = RateControl::new(state.dispatch_interval);
    let handles = rate
        .dispatch(match_ids.iter().copied(), |match_id| {
            let source = Arc::clone(&state.source);
            async move { source.get_match(match_id).await }
        })
        .await;
    log::debug!("dispatched {} requests", handles.len());

    let matches = rate::join(handles).await?;
    Ok(matches.iter().map(MatchRecord::from).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use askama::Template;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };
    use tokio::time::Instant;
    use tower::ServiceExt;

    use super::*;
    use crate::{database::MemoryStore, dota2::opendota};

    #[derive(Default)]
    struct FakeSource {
        public: Vec<opendota::Match>,
        missing: Vec<u64>,
        min_ranks: Mutex<Vec<u32>>,
        requested: Mutex<Vec<(u64, Instant)>>,
    }

    fn raw_match(match_id: u64) -> opendota::Match {
        opendota::Match {
            match_id,
            radiant_win: Some(match_id % 2 == 0),
            duration: match_id * 7,
            lobby_type: Some((match_id % 3) as i32),
            game_mode: Some(22),
        }
    }

    fn public_matches() -> Vec<opendota::Match> {
        vec![
            opendota::Match {
                match_id: 7001,
                radiant_win: Some(true),
                duration: 2143,
                lobby_type: Some(7),
                game_mode: Some(22),
            },
            opendota::Match {
                match_id: 7002,
                radiant_win: Some(false),
                duration: 59,
                lobby_type: Some(0),
                game_mode: Some(3),
            },
        ]
    }

    #[async_trait]
    impl MatchSource for FakeSource {
        async fn get_match(&self, match_id: u64) -> Result<opendota::Match, RequestError> {
            self.requested
                .lock()
                .unwrap()
                .push((match_id, Instant::now()));
            if self.missing.contains(&match_id) {
                return Err(RequestError::OtherResponse(StatusCode::NOT_FOUND));
            }
            Ok(raw_match(match_id))
        }

        async fn get_public_matches(
            &self,
            min_rank: u32,
        ) -> Result<Vec<opendota::Match>, RequestError> {
            self.min_ranks.lock().unwrap().push(min_rank);
            Ok(self.public.clone())
        }
    }

    fn state(source: Arc<FakeSource>, store: Arc<MemoryStore>) -> Arc<AppState> {
        Arc::new(AppState::new(source, store, Duration::from_secs(1)))
    }

    async fn send(app: &Router, method: Method, uri: &str, form: Option<&str>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match form {
            Some(form) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn legend_requests_min_rank_50_and_renders_rows() {
        let source = Arc::new(FakeSource {
            public: public_matches(),
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::default());
        let form = NewMatchesForm {
            badge: "Legend".to_string(),
        };

        let page = new_matches(State(state(source.clone(), store.clone())), Form(form))
            .await
            .unwrap();
        let body = page.0.render().unwrap();

        assert_eq!(*source.min_ranks.lock().unwrap(), vec![50]);
        assert!(body.contains(
            "<tr><td>7001</td><td>Radiant</td><td>35:43</td><td>Ranked</td><td>All Pick</td></tr>"
        ));
        assert!(body.contains(
            "<tr><td>7002</td><td>Dire</td><td>00:59</td><td>Unranked</td><td>Random Draft</td></tr>"
        ));
        // browsing never persists
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_badge_is_a_bad_request() {
        let source = Arc::new(FakeSource::default());
        let store = Arc::new(MemoryStore::default());
        let form = NewMatchesForm {
            badge: "Mythic".to_string(),
        };

        let err = new_matches(State(state(source.clone(), store)), Form(form))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownBadge(_)));
        assert!(source.min_ranks.lock().unwrap().is_empty());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn save_fetches_inserts_and_redirects() {
        let source = Arc::new(FakeSource::default());
        let store = Arc::new(MemoryStore::default());
        let app = state(source.clone(), store.clone());
        let form = SaveMatchesForm {
            match_list: "100 200".to_string(),
        };

        let response = save_matches(State(app.clone()), Form(form))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/savedmatches");

        {
            let requested = source.requested.lock().unwrap();
            assert_eq!(requested.len(), 2);
            assert_eq!(requested[0].0, 100);
            assert_eq!(requested[1].0, 200);
            assert!(requested[1].1 - requested[0].1 >= Duration::from_secs(1));
        }
        assert_eq!(store.insert_calls(), 1);

        let body = saved_matches(State(app)).await.unwrap().0.render().unwrap();
        assert!(body.contains("<td>100</td>"));
        assert!(body.contains("<td>200</td>"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_save_skips_insert_but_still_redirects() {
        let source = Arc::new(FakeSource::default());
        let store = Arc::new(MemoryStore::default());
        let form = SaveMatchesForm {
            match_list: "  \n ".to_string(),
        };

        let response = save_matches(State(state(source.clone(), store.clone())), Form(form))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(source.requested.lock().unwrap().is_empty());
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failed_fetch_fails_the_whole_save() {
        let source = Arc::new(FakeSource {
            missing: vec![200],
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::default());
        let form = SaveMatchesForm {
            match_list: "100 200 300".to_string(),
        };

        let err = save_matches(State(state(source.clone(), store.clone())), Form(form))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Batch(DispatchError::Failed(_))));
        // every request went out before the failure surfaced
        assert_eq!(source.requested.lock().unwrap().len(), 3);
        assert_eq!(store.insert_calls(), 0);
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn non_numeric_match_id_is_rejected() {
        let source = Arc::new(FakeSource::default());
        let store = Arc::new(MemoryStore::default());
        let form = SaveMatchesForm {
            match_list: "100 abc".to_string(),
        };

        let err = save_matches(State(state(source.clone(), store)), Form(form))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidMatchId(ref token) if token == "abc"));
        assert!(source.requested.lock().unwrap().is_empty());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn match_list_splits_on_any_whitespace() {
        assert_eq!(
            parse_match_list("100 200\n300\t 400").unwrap(),
            vec![100, 200, 300, 400]
        );
        assert!(parse_match_list("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn router_serves_static_pages() {
        let app = router(state(
            Arc::new(FakeSource::default()),
            Arc::new(MemoryStore::default()),
        ));

        let response = send(&app, Method::GET, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("href=\"/newmatches\""));

        let response = send(&app, Method::GET, "/newmatches", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<option value=\"Legend\">"));
    }

    #[tokio::test]
    async fn router_decodes_badge_form() {
        let source = Arc::new(FakeSource {
            public: public_matches(),
            ..Default::default()
        });
        let app = router(state(source.clone(), Arc::new(MemoryStore::default())));

        let response = send(&app, Method::POST, "/newmatches", Some("badge=Legend")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert_eq!(*source.min_ranks.lock().unwrap(), vec![50]);
        assert!(body.contains("<td>7001</td><td>Radiant</td><td>35:43</td>"));
        assert!(body.contains("<td>7002</td><td>Dire</td><td>00:59</td>"));
    }

    #[tokio::test]
    async fn router_turns_missing_or_unknown_badge_into_error_page() {
        let source = Arc::new(FakeSource::default());
        let app = router(state(source.clone(), Arc::new(MemoryStore::default())));

        for form in ["", "badge=", "badge=Mythic"] {
            let response = send(&app, Method::POST, "/newmatches", Some(form)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "form {:?}", form);
            assert!(body_text(response).await.contains("Unrecognized badge"));
        }
        assert!(source.min_ranks.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn router_saves_then_lists_matches() {
        let source = Arc::new(FakeSource::default());
        let store = Arc::new(MemoryStore::default());
        let app = router(state(source.clone(), store.clone()));

        let response = send(&app, Method::POST, "/savematches", Some("match_list=100+200")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/savedmatches");
        assert_eq!(source.requested.lock().unwrap().len(), 2);
        assert_eq!(store.insert_calls(), 1);

        let response = send(&app, Method::GET, "/savedmatches", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<td>100</td>"));
        assert!(body.contains("<td>200</td>"));
    }

    #[tokio::test]
    async fn router_rejects_wrong_methods() {
        let app = router(state(
            Arc::new(FakeSource::default()),
            Arc::new(MemoryStore::default()),
        ));

        for (method, uri) in [
            (Method::GET, "/savematches"),
            (Method::POST, "/savedmatches"),
            (Method::POST, "/"),
            (Method::DELETE, "/newmatches"),
        ] {
            let response = send(&app, method.clone(), uri, None).await;
            assert_eq!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "{} {}",
                method,
                uri
            );
        }
    }
}
