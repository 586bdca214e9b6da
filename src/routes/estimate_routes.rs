use axum::{routing::{get, post}, Router};
use crate::controllers::estimate_controller::{
    // Calculations
    post_estimate, post_quote, post_legacy_estimation,
    // Static tables
    list_installation_types, get_price_list,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/estimate",            post(post_estimate))
        .route("/quote",               post(post_quote))
        .route("/estimation",          post(post_legacy_estimation))
        .route("/installation-types",  get(list_installation_types))
        .route("/price-list",          get(get_price_list))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::models::catalog::Catalog;

    fn app() -> Router {
        Router::new().nest("/api", api_routes(AppState::new(Catalog::default())))
    }

    async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn simple_estimate_endpoint() {
        let (status, body) = send(
            Method::POST,
            "/api/estimate",
            Some(json!({ "surface": 100, "installation_type": "residential" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_power_wc"], json!(17000.0));
        assert_eq!(body["panel_count"], json!(43));
        assert_eq!(body["total_price"], json!(19497.5));
        assert_eq!(body["payback_years"], json!(4.78));
    }

    #[tokio::test]
    async fn simple_estimate_never_rejects_unknown_category() {
        let (status, body) = send(
            Method::POST,
            "/api/estimate",
            Some(json!({ "surface": 50, "installation_type": "unknown_xyz" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["installation_type"], json!("residential"));
        assert_eq!(body["total_power_wc"], json!(8500.0));
    }

    #[tokio::test]
    async fn quote_endpoint_returns_itemised_record() {
        let (status, body) = send(
            Method::POST,
            "/api/quote",
            Some(json!({
                "client": { "name": "Ferme du Bocage", "phone": "+33 6 00 00 00 00" },
                "surface": 200,
                "installation_type": "Agricultural",
                "need": "cold storage",
                "orientation": "south",
                "tilt": 30
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["quote_id"].as_str().unwrap().starts_with("DEV-"));
        assert_eq!(body["installation_type"], json!("agricultural"));
        assert_eq!(body["line_items"].as_array().unwrap().len(), 8);
        assert_eq!(body["client"]["name"], json!("Ferme du Bocage"));
        assert_eq!(body["tax_rate"], json!(0.2));
        assert_eq!(body["orientation"], json!("south"));
    }

    #[tokio::test]
    async fn quote_endpoint_rejections_are_distinct() {
        let cases = [
            (json!({ "client": { "name": "A" }, "surface": 0, "installation_type": "residential" }), "invalid_surface"),
            (json!({ "client": { "name": "A" }, "surface": 10, "installation_type": "commercial" }), "unknown_installation_type"),
            (json!({ "client": { "name": "" }, "surface": 10, "installation_type": "residential" }), "missing_client_name"),
            (json!({ "surface": 10, "installation_type": "residential" }), "missing_client_name"),
        ];
        for (request, code) in cases {
            let (status, body) = send(Method::POST, "/api/quote", Some(request)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{code}");
            assert_eq!(body["code"], json!(code));
            assert!(!body["error"].as_str().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn legacy_endpoint_keeps_original_shape() {
        let (status, body) = send(
            Method::POST,
            "/api/estimation",
            Some(json!({ "surface": "50", "type_installation": "résidentiel", "besoin": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["puissance"], json!(8500.0));
        assert_eq!(body["panneaux"], json!(22));
        assert!(body["prix"].as_f64().unwrap() > 0.0);
        assert!(body["production_kwh"].is_number());
        assert!(body["roi"].is_number());
    }

    #[tokio::test]
    async fn legacy_endpoint_rejects_non_object_body() {
        let (status, body) = send(Method::POST, "/api/estimation", Some(json!([1, 2, 3]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("malformed_field"));
    }

    #[tokio::test]
    async fn listings_are_plain_reads() {
        let (status, body) = send(Method::GET, "/api/installation-types", None).await;
        assert_eq!(status, StatusCode::OK);
        let categories: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["category"].as_str())
            .collect();
        assert_eq!(categories, vec!["agricultural", "industrial", "residential"]);

        let (status, body) = send(Method::GET, "/api/price-list", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["engineering_fee"], json!(500.0));
        assert_eq!(body["labour_per_m2"], json!(25.0));
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/quote")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
