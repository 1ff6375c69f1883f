//! In-memory implementation of the game-board API.
//!
//! Serves the same routes the client calls so the client can be exercised
//! end to end. Game rules are deliberately small: a fixed grid where each
//! cell starts with one gem, players that move one cell at a time, dig the
//! gem under them, attack each other for damage and gift gems.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const AUTH_HEADER: &str = "Authentication";
pub const ATTACK_DAMAGE: u32 = 10;
pub const STARTING_HP: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub hp: u32,
    pub gems: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    pub width: u32,
    pub height: u32,
    pub players: Vec<Player>,
    /// Remaining gems per cell, indexed `[y][x]`.
    pub cells: Vec<Vec<u32>>,
}

#[derive(Debug)]
pub struct GameState {
    width: u32,
    height: u32,
    cells: Vec<Vec<u32>>,
    players: HashMap<u64, Player>,
    tokens: HashMap<u64, String>,
}

impl GameState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![1; width as usize]; height as usize],
            players: HashMap::new(),
            tokens: HashMap::new(),
        }
    }

    /// A 10x10 board with `1.alpha-token` (alice) at the top-left corner and
    /// `2.bravo-token` (bob) at the bottom-right.
    pub fn seeded() -> Self {
        let mut state = Self::new(10, 10);
        state.add_player(1, "alice", "alpha-token", (0, 0));
        state.add_player(2, "bob", "bravo-token", (9, 9));
        state
    }

    pub fn add_player(&mut self, id: u64, name: &str, token: &str, (x, y): (u32, u32)) {
        let player = Player {
            id,
            name: name.to_string(),
            x,
            y,
            hp: STARTING_HP,
            gems: 0,
        };
        self.players.insert(id, player);
        self.tokens.insert(id, token.to_string());
    }

    fn board(&self) -> Board {
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.id);
        Board {
            width: self.width,
            height: self.height,
            players,
            cells: self.cells.clone(),
        }
    }
}

pub type Db = Arc<RwLock<GameState>>;

/// Id of the player whose token authenticated the request.
#[derive(Clone, Copy, Debug)]
struct Caller(u64);

type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: &str) -> Failure {
    (status, Json(json!({ "error": message })))
}

pub fn app() -> Router {
    app_with_state(GameState::seeded())
}

pub fn app_with_state(state: GameState) -> Router {
    let db: Db = Arc::new(RwLock::new(state));
    Router::new()
        .route("/user/@me", get(current_user))
        .route("/user/all", get(all_users))
        .route("/user/{user_id}", get(get_user))
        .route("/user/{user_id}/attack", post(attack))
        .route("/user/{user_id}/gift", post(gift))
        .route("/board", get(board))
        .route("/board/move/{direction}", post(move_player))
        .route("/board/dig", post(dig))
        .route_layer(middleware::from_fn_with_state(db.clone(), authenticate))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Resolve `Authentication: <id>.<token>` to a `Caller` or answer 401.
async fn authenticate(State(db): State<Db>, mut request: Request, next: Next) -> Result<Response, Failure> {
    let unauthorized = || failure(StatusCode::UNAUTHORIZED, "invalid or missing authentication");

    let header = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(unauthorized)?;
    let (id, token) = header.split_once('.').ok_or_else(unauthorized)?;
    let id: u64 = id.parse().map_err(|_| unauthorized())?;

    let known = db.read().await.tokens.get(&id).is_some_and(|t| t == token);
    if !known {
        tracing::debug!(user_id = id, "rejected authentication");
        return Err(unauthorized());
    }

    request.extensions_mut().insert(Caller(id));
    Ok(next.run(request).await)
}

async fn current_user(State(db): State<Db>, Extension(Caller(id)): Extension<Caller>) -> Result<Json<Player>, Failure> {
    let state = db.read().await;
    state
        .players
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))
}

async fn all_users(State(db): State<Db>) -> Json<Vec<Player>> {
    Json(db.read().await.board().players)
}

async fn get_user(State(db): State<Db>, Path(user_id): Path<u64>) -> Result<Json<Player>, Failure> {
    let state = db.read().await;
    state
        .players
        .get(&user_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))
}

async fn board(State(db): State<Db>) -> Json<Board> {
    Json(db.read().await.board())
}

async fn move_player(
    State(db): State<Db>,
    Extension(Caller(id)): Extension<Caller>,
    Path(direction): Path<String>,
) -> Result<Json<Player>, Failure> {
    let (dx, dy): (i64, i64) = match direction.as_str() {
        "UP" => (0, -1),
        "DOWN" => (0, 1),
        "RIGHT" => (1, 0),
        "LEFT" => (-1, 0),
        _ => return Err(failure(StatusCode::BAD_REQUEST, "unknown direction")),
    };

    let mut state = db.write().await;
    let (width, height) = (i64::from(state.width), i64::from(state.height));
    let player = state
        .players
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;

    let (x, y) = (i64::from(player.x) + dx, i64::from(player.y) + dy);
    if !(0..width).contains(&x) || !(0..height).contains(&y) {
        return Err(failure(StatusCode::CONFLICT, "move leaves the board"));
    }
    player.x = x as u32;
    player.y = y as u32;
    tracing::debug!(user_id = id, x, y, "player moved");
    Ok(Json(player.clone()))
}

async fn dig(State(db): State<Db>, Extension(Caller(id)): Extension<Caller>) -> Result<Json<Player>, Failure> {
    let mut state = db.write().await;
    let GameState { cells, players, .. } = &mut *state;
    let player = players
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;

    let cell = cells
        .get_mut(player.y as usize)
        .and_then(|row| row.get_mut(player.x as usize))
        .ok_or_else(|| failure(StatusCode::CONFLICT, "player is outside the board"))?;
    if *cell == 0 {
        return Err(failure(StatusCode::CONFLICT, "nothing left to dig here"));
    }
    *cell -= 1;
    player.gems += 1;
    Ok(Json(player.clone()))
}

async fn attack(
    State(db): State<Db>,
    Extension(Caller(id)): Extension<Caller>,
    Path(user_id): Path<u64>,
) -> Result<Json<Player>, Failure> {
    if user_id == id {
        return Err(failure(StatusCode::BAD_REQUEST, "cannot attack yourself"));
    }
    let mut state = db.write().await;
    let target = state
        .players
        .get_mut(&user_id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
    if target.hp == 0 {
        return Err(failure(StatusCode::CONFLICT, "target already defeated"));
    }
    target.hp = target.hp.saturating_sub(ATTACK_DAMAGE);
    Ok(Json(target.clone()))
}

async fn gift(
    State(db): State<Db>,
    Extension(Caller(id)): Extension<Caller>,
    Path(user_id): Path<u64>,
) -> Result<Json<Player>, Failure> {
    if user_id == id {
        return Err(failure(StatusCode::BAD_REQUEST, "cannot gift yourself"));
    }
    let mut state = db.write().await;
    if !state.players.contains_key(&user_id) {
        return Err(failure(StatusCode::NOT_FOUND, "user not found"));
    }
    let giver = state
        .players
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
    if giver.gems == 0 {
        return Err(failure(StatusCode::CONFLICT, "no gems to give"));
    }
    giver.gems -= 1;

    let target = state
        .players
        .get_mut(&user_id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "user not found"))?;
    target.gems += 1;
    Ok(Json(target.clone()))
}
