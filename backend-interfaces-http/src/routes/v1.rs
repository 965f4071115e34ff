use axum::routing::{delete, get, post};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    attendance_handlers, event_handlers, group_handlers, ops_handlers, points_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(event_handlers::create_event))
        .route("/v1/events/:event_id", get(event_handlers::get_event))
        .route(
            "/v1/events/:event_id/join",
            post(attendance_handlers::join_event).delete(attendance_handlers::leave_event),
        )
        .route(
            "/v1/events/:event_id/checkin",
            post(attendance_handlers::check_in),
        )
        .route(
            "/v1/events/:event_id/checkout",
            post(attendance_handlers::check_out),
        )
        .route(
            "/v1/events/:event_id/attendance",
            get(event_handlers::get_attendance),
        )
        .route(
            "/v1/events/:event_id/attendees",
            get(event_handlers::list_attendees),
        )
        .route(
            "/v1/events/:event_id/qr",
            post(attendance_handlers::issue_event_qr),
        )
        .route("/v1/checkin/qr", post(attendance_handlers::check_in_by_qr))
        .route("/v1/checkout/qr", post(attendance_handlers::check_out_by_qr))
        .route("/v1/ledger/awards", post(points_handlers::award_points))
        .route("/v1/users/:user_id/points", get(points_handlers::get_points))
        .route("/v1/users/:user_id/streaks", get(points_handlers::get_streaks))
        .route("/v1/users/:user_id/stats", get(points_handlers::get_stats))
        .route("/v1/users/:user_id/history", get(points_handlers::get_history))
        .route("/v1/groups", post(group_handlers::create_group))
        .route(
            "/v1/groups/:group_id",
            get(group_handlers::get_group).patch(group_handlers::update_group),
        )
        .route("/v1/invites/accept", post(group_handlers::accept_invite))
        .route(
            "/v1/groups/:group_id/members",
            get(group_handlers::list_members),
        )
        .route(
            "/v1/groups/:group_id/members/:user_id",
            delete(group_handlers::remove_member),
        )
        .route(
            "/v1/groups/:group_id/leave",
            post(group_handlers::leave_group),
        )
        .route(
            "/v1/groups/:group_id/leaderboard",
            get(group_handlers::get_leaderboard),
        )
        .route(
            "/v1/groups/:group_id/progress",
            get(group_handlers::get_progress),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use backend_domain::{RuntimeConfig, UserId};
    use backend_infrastructure::{MemoryRecordStore, SystemClock};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    fn router() -> Router {
        let config = RuntimeConfig {
            api_token: Some(TOKEN.to_string()),
            qr_secret: Some("qr-secret".to_string()),
            admin_users: vec![UserId::from("admin")],
            ..RuntimeConfig::default()
        };
        let state = AppState::new(config, Arc::new(MemoryRecordStore::new()), Arc::new(SystemClock))
            .expect("state");
        build_router(state)
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {TOKEN}"));
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.expect("response")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    async fn create_event(app: &Router) -> String {
        let response = send(
            app,
            request(
                "POST",
                "/v1/events",
                Some("org-1"),
                Some(json!({
                    "title": "River cleanup",
                    "cause": "environment",
                    "starts_at": "2026-03-07T09:00:00Z",
                    "ends_at": "2026-03-07T12:00:00Z"
                })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["id"]
            .as_str()
            .expect("event id")
            .to_string()
    }

    #[tokio::test]
    async fn rejects_requests_without_token() {
        let app = router();
        let req = Request::builder()
            .uri("/v1/users/alice/points")
            .body(Body::empty())
            .expect("request");
        let response = send(&app, req).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let live = Request::builder()
            .uri("/v1/ops/health/live")
            .body(Body::empty())
            .expect("request");
        assert_eq!(send(&app, live).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn attendance_flow_over_http() {
        let app = router();
        let event_id = create_event(&app).await;

        let join = format!("/v1/events/{event_id}/join");
        let checkin = format!("/v1/events/{event_id}/checkin");
        let checkout = format!("/v1/events/{event_id}/checkout");

        let response = send(&app, request("POST", &checkin, Some("alice"), None)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["kind"], "not_joined");

        assert_eq!(
            send(&app, request("POST", &join, Some("alice"), None)).await.status(),
            StatusCode::OK
        );
        let response = send(&app, request("POST", &checkin, Some("alice"), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["awarded"]["amount"], 10);
        let response = send(&app, request("POST", &checkin, Some("alice"), None)).await;
        assert_eq!(json_body(response).await["kind"], "already_checked_in");
        assert_eq!(
            send(&app, request("POST", &checkout, Some("alice"), None)).await.status(),
            StatusCode::OK
        );

        let response = send(&app, request("GET", "/v1/users/alice/points", None, None)).await;
        assert_eq!(json_body(response).await["points"], 15);
        let response = send(&app, request("GET", "/v1/users/alice/stats", None, None)).await;
        assert_eq!(json_body(response).await["events_attended"], 1);

        let response = send(&app, request("POST", &join, None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["kind"], "unauthenticated");
    }

    #[tokio::test]
    async fn qr_check_in_over_http() {
        let app = router();
        let event_id = create_event(&app).await;
        let qr_uri = format!("/v1/events/{event_id}/qr");

        let response = send(&app, request("POST", &qr_uri, Some("bob"), None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = send(&app, request("POST", &qr_uri, Some("org-1"), None)).await;
        let payload = json_body(response).await["payload"]
            .as_str()
            .expect("payload")
            .to_string();

        let join = format!("/v1/events/{event_id}/join");
        send(&app, request("POST", &join, Some("bob"), None)).await;
        let response = send(
            &app,
            request("POST", "/v1/checkin/qr", Some("bob"), Some(json!({ "payload": payload }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["attendance"]["state"], "checked_in");

        let response = send(
            &app,
            request("POST", "/v1/checkin/qr", Some("bob"), Some(json!({ "payload": "vl1.x.00" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn group_flow_over_http() {
        let app = router();
        let response = send(
            &app,
            request(
                "POST",
                "/v1/groups",
                Some("admin"),
                Some(json!({ "name": "Crew", "monthly_goal": 10 })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let group = json_body(response).await;
        let group_id = group["id"].as_str().expect("id").to_string();
        let code = group["invite_code"].as_str().expect("code").to_string();

        let response = send(
            &app,
            request(
                "POST",
                "/v1/invites/accept",
                Some("member"),
                Some(json!({ "invite_code": code })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let remove_admin = format!("/v1/groups/{group_id}/members/admin");
        let response = send(&app, request("DELETE", &remove_admin, Some("member"), None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &app,
            request(
                "POST",
                "/v1/ledger/awards",
                Some("member"),
                Some(json!({ "user_id": "member", "amount": 500, "reason": "manual_award" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &app,
            request(
                "POST",
                "/v1/ledger/awards",
                Some("admin"),
                Some(json!({ "user_id": "member", "amount": 10, "reason": "event_checkin" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            request(
                "POST",
                "/v1/ledger/awards",
                Some("admin"),
                Some(json!({ "user_id": "member", "amount": 25, "reason": "manual_award" })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = send(
            &app,
            request("GET", &format!("/v1/groups/{group_id}/progress"), None, None),
        )
        .await;
        let progress = json_body(response).await;
        assert_eq!(progress["current_points"], 25);
        assert_eq!(progress["percentage"], 100.0);

        let response = send(
            &app,
            request("GET", &format!("/v1/groups/{group_id}/leaderboard"), None, None),
        )
        .await;
        let board = json_body(response).await;
        assert_eq!(board[0]["user_id"], "member");
        assert_eq!(board[1]["rank"], 2);
    }

    #[tokio::test]
    async fn metrics_render_counters() {
        let app = router();
        let response = send(&app, request("GET", "/v1/ops/metrics/prometheus", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(text.contains("volunteer_joins_total 0"));
    }
}
