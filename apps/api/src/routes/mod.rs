pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{admins, awards, bot, nominations, notifications, reward_cycles, settings};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Bot channel
        .route("/api/messages", post(bot::messages))
        // Awards
        .route("/api/awards/allawards", get(awards::handlers::handle_all_awards))
        .route(
            "/api/awards/awarddetails",
            get(awards::handlers::handle_award_details),
        )
        .route("/api/awards/award", post(awards::handlers::handle_save_award))
        .route(
            "/api/awards/awards",
            delete(awards::handlers::handle_delete_awards),
        )
        // Admin configuration
        .route(
            "/api/configureadmin/teammembers",
            get(admins::handlers::handle_team_members),
        )
        .route(
            "/api/configureadmin/admindetail",
            post(admins::handlers::handle_save_admin),
        )
        .route(
            "/api/configureadmin/alladmindetails",
            get(admins::handlers::handle_admin_details),
        )
        // Nominations
        .route(
            "/api/nominatedetail/nomination",
            post(nominations::handlers::handle_save_nomination),
        )
        .route(
            "/api/nominatedetail/nominationdetail",
            get(nominations::handlers::handle_nomination_duplicate),
        )
        .route(
            "/api/nominatedetail/allnominations",
            get(nominations::handlers::handle_all_nominations),
        )
        .route(
            "/api/nominatedetail/publishnominations",
            get(nominations::handlers::handle_publish_nominations),
        )
        // Reward cycles
        .route(
            "/api/rewardcycle/rewardcycledetails",
            get(reward_cycles::handlers::handle_reward_cycle_details),
        )
        .route(
            "/api/rewardcycle/rewardcycle",
            post(reward_cycles::handlers::handle_save_reward_cycle),
        )
        // Notifications
        .route(
            "/api/notification/winnernotification",
            post(notifications::handlers::winner_notification),
        )
        .route(
            "/api/settings/botsettings",
            get(settings::handle_bot_settings),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::tests::token;
    use crate::bot::connector::fake::RecordingConnector;
    use crate::bot::schema::TeamsChannelAccount;
    use crate::config::Config;
    use crate::models::award::AwardEntity;
    use crate::models::endorsement::EndorseEntity;
    use crate::models::nomination::{AwardWinnerNotification, NominateEntity};
    use crate::models::reward_cycle::RewardCycleState;
    use crate::models::team::TeamEntity;
    use crate::reward_cycles::storage::tests::cycle;
    use crate::search::TableScanSearch;
    use crate::storage::Repositories;

    const TEAM: &str = "19:team@thread.skype";

    struct TestApp {
        router: Router,
        repos: Repositories,
        connector: Arc<RecordingConnector>,
    }

    fn app() -> TestApp {
        let repos = Repositories::in_memory();
        let connector = Arc::new(RecordingConnector::with_roster(vec![TeamsChannelAccount {
            id: "29:kim".to_string(),
            name: "Kim".to_string(),
            aad_object_id: "oid-kim".to_string(),
            email: Some("kim@contoso.com".to_string()),
            user_principal_name: Some("kim@contoso.com".to_string()),
        }]));
        let state = AppState::new(
            Config::for_tests(),
            repos.clone(),
            Arc::new(TableScanSearch::new(repos.nominations.clone())),
            connector.clone(),
        );
        TestApp {
            router: build_router(state),
            repos,
            connector,
        }
    }

    fn bearer() -> String {
        format!(
            "Bearer {}",
            token(json!({ "oid": "oid-admin", "upn": "admin@contoso.com" }))
        )
    }

    async fn call(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer());
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = app
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_bearer_token() {
        let app = app();
        let response = app
            .router
            .clone()
            .oneshot(
                Request::get(format!("/api/awards/allawards?teamId={TEAM}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_award_lifecycle() {
        let app = app();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/awards/award",
            Some(json!({ "TeamId": "team-1", "AwardName": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, created) = call(
            &app,
            Method::POST,
            "/api/awards/award",
            Some(json!({ "TeamId": "team-1", "AwardName": "Star", "AwardDescription": "Shines" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let award_id = created["AwardId"].as_str().unwrap().to_string();
        assert!(!award_id.is_empty());
        assert_eq!(created["CreatedBy"], "oid-admin");

        let (_, updated) = call(
            &app,
            Method::POST,
            "/api/awards/award",
            Some(json!({ "TeamId": "team-1", "AwardId": award_id, "AwardName": "Superstar" })),
        )
        .await;
        assert_eq!(updated["ModifiedBy"], "oid-admin");

        let (status, listed) = call(&app, Method::GET, "/api/awards/allawards?teamId=team-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["AwardName"], "Superstar");

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/awards/awarddetails?teamId=team-1&awardId=missing",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::DELETE, "/api/awards/awards?teamId=team-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, removed) = call(
            &app,
            Method::DELETE,
            &format!("/api/awards/awards?teamId=team-1&awardIds={award_id},missing"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removed, json!(1));
        assert!(app.repos.awards.list("team-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reward_cycle_save_and_lookup() {
        let app = app();
        let now = Utc::now();

        let mut invalid = cycle("team-1", "", now, now - Duration::days(1), RewardCycleState::InActive);
        invalid.created_on = None;
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/rewardcycle/rewardcycle",
            Some(serde_json::to_value(&invalid).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let running = cycle("team-1", "", now, now + Duration::days(14), RewardCycleState::InActive);
        let (status, saved) = call(
            &app,
            Method::POST,
            "/api/rewardcycle/rewardcycle",
            Some(serde_json::to_value(&running).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!saved["cycleId"].as_str().unwrap().is_empty());
        assert_eq!(saved["createdByObjectId"], "oid-admin");

        let current = app.repos.reward_cycles.current("team-1").await.unwrap().unwrap();
        assert_eq!(current.reward_cycle_state, RewardCycleState::Active);

        let (status, details) = call(
            &app,
            Method::GET,
            "/api/rewardcycle/rewardcycledetails?teamId=team-1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["cycleId"], saved["cycleId"]);
        assert_eq!(details["rewardCycleState"], 1);
        assert_eq!(details["resultPublished"], 0);
        assert!(details.get("CycleId").is_none());

        let (_, published) = call(
            &app,
            Method::GET,
            "/api/rewardcycle/rewardcycledetails?teamId=team-1&isActiveCycle=false",
            None,
        )
        .await;
        assert_eq!(published, Value::Null);
    }

    #[tokio::test]
    async fn test_reward_cycle_resave_updates_in_place() {
        let app = app();
        let now = Utc::now();

        let (_, saved) = call(
            &app,
            Method::POST,
            "/api/rewardcycle/rewardcycle",
            Some(json!({
                "TeamId": "team-1",
                "RewardCycleStartDate": now,
                "RewardCycleEndDate": now + Duration::days(14),
            })),
        )
        .await;
        let cycle_id = saved["cycleId"].as_str().unwrap().to_string();

        let (status, resaved) = call(
            &app,
            Method::POST,
            "/api/rewardcycle/rewardcycle",
            Some(json!({
                "TeamId": "team-1",
                "CycleId": cycle_id,
                "RewardCycleStartDate": now,
                "RewardCycleEndDate": now + Duration::days(21),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resaved["cycleId"], json!(cycle_id));
        assert_eq!(app.repos.reward_cycles.list_all().await.unwrap().len(), 1);
    }

    fn nomination(nominee: &str) -> NominateEntity {
        NominateEntity {
            team_id: "team-1".to_string(),
            award_id: "award-1".to_string(),
            award_name: "Star".to_string(),
            nominated_to_name: nominee.to_string(),
            nominated_to_principal_name: format!("{nominee}@contoso.com"),
            nominated_to_object_id: format!("oid-{nominee}"),
            nominated_by_name: "Admin".to_string(),
            nominated_by_principal_name: "admin@contoso.com".to_string(),
            nominated_by_object_id: "oid-admin".to_string(),
            reason_for_nomination: "Helped ship the release".to_string(),
            reward_cycle_id: "cycle-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_nomination_flow() {
        let app = app();

        let (status, stored) = call(
            &app,
            Method::POST,
            "/api/nominatedetail/nomination",
            Some(serde_json::to_value(nomination("kim")).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let nomination_id = stored["NominationId"].as_str().unwrap().to_string();

        let (_, duplicate) = call(
            &app,
            Method::GET,
            "/api/nominatedetail/nominationdetail?teamId=team-1&aadObjectId=oid-kim&cycleId=cycle-1&awardId=award-1",
            None,
        )
        .await;
        assert_eq!(duplicate, json!(true));

        let (_, fresh) = call(
            &app,
            Method::GET,
            "/api/nominatedetail/nominationdetail?teamId=team-1&aadObjectId=oid-riley&cycleId=cycle-1&awardId=award-1",
            None,
        )
        .await;
        assert_eq!(fresh, json!(false));

        for endorser in ["riley", "sam"] {
            assert!(app
                .repos
                .endorsements
                .endorse(EndorseEntity {
                    team_id: "team-1".to_string(),
                    endorse_id: String::new(),
                    endorse_for_award: "Star".to_string(),
                    endorse_for_award_id: "award-1".to_string(),
                    award_cycle: "cycle-1".to_string(),
                    endorsed_to_principal_name: "kim@contoso.com".to_string(),
                    endorsed_to_object_id: "oid-kim".to_string(),
                    endorsed_by_principal_name: format!("{endorser}@contoso.com"),
                    endorsed_by_object_id: format!("oid-{endorser}"),
                    endorsed_on: Utc::now(),
                    timestamp: None,
                })
                .await
                .unwrap());
        }

        let (status, listed) = call(
            &app,
            Method::GET,
            "/api/nominatedetail/allnominations?teamId=team-1&isAwardGranted=false&awardCycleId=cycle-1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["NominationId"], nomination_id);
        assert_eq!(listed[0]["EndorseCount"], 2);

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/nominatedetail/publishnominations?teamId=team-1&nominationIds=",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, published) = call(
            &app,
            Method::GET,
            &format!("/api/nominatedetail/publishnominations?teamId=team-1&nominationIds={nomination_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(published[0]["AwardGranted"], true);

        let granted = app.repos.nominations.list("team-1", true, "cycle-1").await.unwrap();
        assert_eq!(granted.len(), 1);
    }

    #[tokio::test]
    async fn test_nomination_accepts_tab_body() {
        let app = app();
        let (status, stored) = call(
            &app,
            Method::POST,
            "/api/nominatedetail/nomination",
            Some(json!({
                "AwardId": "award-1",
                "RewardCycleId": "cycle-1",
                "AwardName": "Star",
                "AwardImageLink": "https://cdn.example.com/star.png",
                "ReasonForNomination": "Carried the launch",
                "TeamId": "team-1",
                "NominatedOn": "2024-05-02T10:15:30.123Z",
                "NominatedToName": "Kim, Riley",
                "NominatedToPrincipalName": "kim@contoso.com, riley@contoso.com",
                "NominatedToObjectId": "oid-kim, oid-riley",
                "NominatedByName": "Sam",
                "NominatedByPrincipalName": "sam@contoso.com",
                "NominatedByObjectId": "oid-sam",
                "IsGroupNomination": "0",
                "GroupName": "Kim, Riley"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["IsGroupNomination"], "0");

        let listed = app.repos.nominations.list("team-1", false, "cycle-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].group_name.as_deref(), Some("Kim, Riley"));
    }

    #[tokio::test]
    async fn test_admin_configuration() {
        let app = app();

        let (status, _) = call(&app, Method::GET, "/api/configureadmin/teammembers", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        app.repos
            .teams
            .upsert(TeamEntity {
                team_id: TEAM.to_string(),
                bot_installed_on: Utc::now(),
                service_url: "https://smba.example.com/amer/".to_string(),
                timestamp: None,
            })
            .await
            .unwrap();
        let (status, members) = call(
            &app,
            Method::GET,
            "/api/configureadmin/teammembers?teamId=19:team@thread.skype",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            members,
            json!([{ "content": "kim@contoso.com", "header": "Kim", "aadobjectid": "oid-kim" }])
        );

        let (_, none) = call(
            &app,
            Method::GET,
            "/api/configureadmin/alladmindetails?teamId=team-1",
            None,
        )
        .await;
        assert_eq!(none, Value::Null);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/configureadmin/admindetail",
            Some(json!({
                "TeamId": "team-1",
                "AdminName": "Kim",
                "AdminPrincipalName": "kim@contoso.com",
                "AdminObjectId": "oid-kim",
                "NoteForTeam": "Nominations close Friday"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, admin) = call(
            &app,
            Method::GET,
            "/api/configureadmin/alladmindetails?teamId=team-1",
            None,
        )
        .await;
        assert_eq!(admin["AdminPrincipalName"], "kim@contoso.com");
        assert_eq!(admin["CreatedByObjectId"], "oid-admin");
    }

    #[tokio::test]
    async fn test_winner_notification() {
        let app = app();

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/notification/winnernotification",
            Some(json!([])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let winner = AwardWinnerNotification {
            team_id: TEAM.to_string(),
            award_id: "award-1".to_string(),
            award_name: "Star".to_string(),
            award_cycle: "March".to_string(),
            nominated_to_name: "Kim".to_string(),
            nominated_to_principal_name: "kim@contoso.com".to_string(),
            nominated_to_object_id: "oid-kim".to_string(),
            ..Default::default()
        };
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/notification/winnernotification",
            Some(json!([winner])),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        app.repos
            .teams
            .upsert(TeamEntity {
                team_id: TEAM.to_string(),
                bot_installed_on: Utc::now(),
                service_url: "https://smba.example.com/amer/".to_string(),
                timestamp: None,
            })
            .await
            .unwrap();
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/notification/winnernotification",
            Some(json!([winner])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!app.connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bot_settings() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/settings/botsettings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "botId": "bot-app-id", "instrumentationKey": "ikey" }));
    }

    #[tokio::test]
    async fn test_messages_endpoint_answers_plain_messages() {
        let app = app();
        let activity = json!({
            "type": "message",
            "text": "hello",
            "serviceUrl": "https://smba.example.com/amer/",
            "from": { "id": "29:kim", "aadObjectId": "oid-kim" },
            "recipient": { "id": "28:bot" },
            "conversation": { "id": "a:personal" }
        });
        let (status, body) = call(&app, Method::POST, "/api/messages", Some(activity)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
        assert!(!app.connector.sent().is_empty());
    }

    #[tokio::test]
    async fn test_awards_are_kept_per_team() {
        let app = app();
        for team in ["team-1", "team-2"] {
            app.repos
                .awards
                .upsert(AwardEntity {
                    team_id: team.to_string(),
                    award_id: format!("{team}-award"),
                    award_name: "Star".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let (_, listed) = call(&app, Method::GET, "/api/awards/allawards?teamId=team-2", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["AwardId"], "team-2-award");
    }
}
