use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, Board, GameState, Player, AUTH_HEADER, STARTING_HP};
use tower::ServiceExt;

const ALICE: &str = "1.alpha-token";
const BOB: &str = "2.bravo-token";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed(method: &str, uri: &str, auth: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTH_HEADER, auth)
        .body(String::new())
        .unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, auth: &str) -> axum::response::Response {
    app.clone().oneshot(authed(method, uri, auth)).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let resp = app()
        .oneshot(Request::builder().uri("/board").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let resp = send(&app(), "GET", "/board", "1.bravo-token").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_header_is_unauthorized() {
    for header in ["alpha-token", "one.alpha-token", ""] {
        let resp = send(&app(), "GET", "/board", header).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{header:?}");
    }
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let resp = send(&app(), "GET", "/nowhere", ALICE).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- users ---

#[tokio::test]
async fn current_user_is_the_caller() {
    let resp = send(&app(), "GET", "/user/@me", BOB).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Player = body_json(resp).await;
    assert_eq!(me.id, 2);
    assert_eq!(me.name, "bob");
    assert_eq!(me.hp, STARTING_HP);
}

#[tokio::test]
async fn all_users_sorted_by_id() {
    let resp = send(&app(), "GET", "/user/all", ALICE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users: Vec<Player> = body_json(resp).await;
    let ids: Vec<u64> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn get_user_by_id() {
    let resp = send(&app(), "GET", "/user/2", ALICE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Player = body_json(resp).await;
    assert_eq!(user.name, "bob");
}

#[tokio::test]
async fn get_unknown_user_returns_404_with_error_body() {
    let resp = send(&app(), "GET", "/user/99", ALICE).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = body_bytes(resp).await;
    assert_eq!(&bytes[..], br#"{"error":"user not found"}"#);
}

#[tokio::test]
async fn get_user_bad_id_returns_400() {
    let resp = send(&app(), "GET", "/user/not-a-number", ALICE).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- board ---

#[tokio::test]
async fn board_lists_players_and_cells() {
    let resp = send(&app(), "GET", "/board", ALICE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let board: Board = body_json(resp).await;
    assert_eq!((board.width, board.height), (10, 10));
    assert_eq!(board.cells.len(), 10);
    assert_eq!(board.players.len(), 2);
}

#[tokio::test]
async fn move_updates_position() {
    let app = app();
    let resp = send(&app, "POST", "/board/move/RIGHT", ALICE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Player = body_json(resp).await;
    assert_eq!((me.x, me.y), (1, 0));

    let resp = send(&app, "POST", "/board/move/DOWN", ALICE).await;
    let me: Player = body_json(resp).await;
    assert_eq!((me.x, me.y), (1, 1));
}

#[tokio::test]
async fn move_off_the_board_is_a_conflict() {
    let resp = send(&app(), "POST", "/board/move/UP", ALICE).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_direction_returns_400() {
    let resp = send(&app(), "POST", "/board/move/SIDEWAYS", ALICE).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn move_requires_post() {
    let resp = send(&app(), "GET", "/board/move/UP", ALICE).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn dig_collects_the_cell_gem_once() {
    let app = app();
    let resp = send(&app, "POST", "/board/dig", ALICE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Player = body_json(resp).await;
    assert_eq!(me.gems, 1);

    let resp = send(&app, "POST", "/board/dig", ALICE).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let board: Board = body_json(send(&app, "GET", "/board", ALICE).await).await;
    assert_eq!(board.cells[0][0], 0);
}

#[tokio::test]
async fn dig_outside_the_board_is_a_conflict() {
    let mut state = GameState::new(2, 1);
    state.add_player(1, "alice", "a", (5, 5));
    let app = app_with_state(state);

    let resp = send(&app, "POST", "/board/dig", "1.a").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "player is outside the board");
}

// --- attack / gift ---

#[tokio::test]
async fn attack_damages_target() {
    let resp = send(&app(), "POST", "/user/2/attack", ALICE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let target: Player = body_json(resp).await;
    assert_eq!(target.id, 2);
    assert!(target.hp < STARTING_HP);
}

#[tokio::test]
async fn attack_self_returns_400() {
    let resp = send(&app(), "POST", "/user/1/attack", ALICE).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attack_defeated_target_is_a_conflict() {
    let mut state = GameState::new(2, 1);
    state.add_player(1, "alice", "a", (0, 0));
    state.add_player(2, "bob", "b", (1, 0));
    let app = app_with_state(state);

    let mut last = StatusCode::OK;
    for _ in 0..=STARTING_HP {
        last = send(&app, "POST", "/user/2/attack", "1.a").await.status();
        if last != StatusCode::OK {
            break;
        }
    }
    assert_eq!(last, StatusCode::CONFLICT);
}

#[tokio::test]
async fn gift_without_gems_is_a_conflict() {
    let resp = send(&app(), "POST", "/user/2/gift", ALICE).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn gift_transfers_one_gem() {
    let app = app();
    send(&app, "POST", "/board/dig", ALICE).await;

    let resp = send(&app, "POST", "/user/2/gift", ALICE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bob: Player = body_json(resp).await;
    assert_eq!(bob.gems, 1);

    let me: Player = body_json(send(&app, "GET", "/user/@me", ALICE).await).await;
    assert_eq!(me.gems, 0);
}

#[tokio::test]
async fn gift_unknown_user_returns_404() {
    let resp = send(&app(), "POST", "/user/42/gift", BOB).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
