use axum::{
    Json,
    extract::{Query as QueryParams, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::dto::*;
use super::error::ApiError;
use super::state::AppState;

/// POST /properties_data - Rank listings for a search by ROI
pub async fn properties_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PropertiesRequest>, JsonRejection>,
) -> Result<Json<Vec<PropertyRow>>, ApiError> {
    let Json(req) = payload?;
    let query = req.into_query()?;

    let ranked = state.orchestrator.handle(&query).await?;
    if ranked.len() > state.max_results {
        tracing::debug!(total = ranked.len(), returned = state.max_results, "truncated response");
    }

    Ok(Json(
        ranked
            .iter()
            .take(state.max_results)
            .map(PropertyRow::from)
            .collect(),
    ))
}

/// GET /locations?query= - Search-area suggestions
pub async fn locations(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<LocationsParams>,
) -> Json<Vec<LocationSuggestion>> {
    let found = state.locations.suggest(&params.query).await;
    Json(found.iter().map(LocationSuggestion::from).collect())
}

/// GET /health - Health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::config::Config;
    use crate::error::QueryError;
    use crate::models::tests::listing;
    use crate::models::Location;
    use crate::orchestrator::{FetchedListings, RankedProperties};
    use crate::scrapers::FixtureSource;
    use serde_json::json;

    fn state(max_results: usize) -> Arc<AppState> {
        let mut source = FixtureSource::default();
        source.locations.push(Location {
            display_name: "London".into(),
            identifier: "REGION^87490".into(),
            normalised_name: "LONDON".into(),
        });
        source.listings.insert(
            "REGION^87490".into(),
            vec![
                listing("cheap", 120_000, 2, 1_400.0),
                listing("mid", 200_000, 2, 1_400.0),
                listing("dear", 280_000, 3, 1_400.0),
                listing("mansion", 2_000_000, 6, 9_000.0),
            ],
        );
        let source = Arc::new(source);

        let mut config = Config::default();
        config.response.max_results = max_results;
        AppState::new(
            &config,
            source.clone(),
            source,
            Arc::new(MemoryBackend::<RankedProperties>::new()),
            Arc::new(MemoryBackend::<FetchedListings>::new()),
            Arc::new(MemoryBackend::<Arc<Vec<Location>>>::new()),
        )
    }

    fn request(overrides: serde_json::Value) -> PropertiesRequest {
        let mut body = json!({
            "identifier": "REGION^87490",
            "display_name": "London",
            "min_price": "100000",
            "max_price": "300000",
            "min_bedrooms": 1,
            "max_bedrooms": 3,
            "min_deposit": "10000",
            "max_deposit": "30000",
            "mortgage_length": "25",
            "mortgage_interest_rate": "4.5",
            "investment_increase": "0",
            "investment_deduction": "0",
            "rent_increase": "0",
            "rent_deduction": "0"
        });
        if let (Some(body), Some(overrides)) = (body.as_object_mut(), overrides.as_object()) {
            for (k, v) in overrides {
                body.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_properties_ranked_and_filtered() {
        let Json(rows) = properties_data(State(state(100)), Ok(Json(request(json!({})))))
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // Same rent, so the cheapest purchase has the best return
        assert_eq!(rows[0].price, 120_000);
        assert!(rows.windows(2).all(|w| w[0].roi >= w[1].roi));
    }

    #[tokio::test]
    async fn test_response_truncated_without_reranking() {
        let Json(rows) = properties_data(State(state(2)), Ok(Json(request(json!({})))))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].rank, 2);
    }

    #[tokio::test]
    async fn test_inverted_bounds_rejected() {
        let result = properties_data(
            State(state(100)),
            Ok(Json(request(json!({ "min_price": "400000" })))),
        )
        .await;

        match result {
            Err(ApiError(QueryError::InvalidQuery { field, .. })) => assert_eq!(field, "price"),
            other => panic!("expected invalid price bounds, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_locations_lookup() {
        let state = state(100);
        let Json(found) = locations(
            State(state.clone()),
            QueryParams(LocationsParams {
                query: "lond".into(),
            }),
        )
        .await;
        assert_eq!(
            found,
            vec![LocationSuggestion {
                display_name: "London".into(),
                identifier: "REGION^87490".into(),
            }]
        );

        let Json(found) = locations(
            State(state),
            QueryParams(LocationsParams { query: "".into() }),
        )
        .await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
