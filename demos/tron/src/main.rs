//! Two-player Tron lightcycle server. This binary is what gets baked
//! into a match's server container image: it reads the agent ids and
//! their pre-issued secrets off the environment, listens for both
//! agents to connect, and plays a game of Tron to completion.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use botbox_match::{run_match, HandlerTimeouts, MatchError, MatchLogic, Outcome, TurnError};
use botbox_session::SecretTable;
use botbox_transport::WebSocketTransport;

const GRID_WIDTH: i32 = 32;
const GRID_HEIGHT: i32 = 32;
const LISTEN_ADDR: &str = "0.0.0.0:12345";
const LOG_DIR: &str = "/botbox-server/logs";

const IDS_ENV_VAR: &str = "BOTBOX_IDS";
const SECRETS_ENV_VAR: &str = "BOTBOX_SECRETS";
const ENV_LIST_SEP: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    fn parse(action: &str) -> Option<Direction> {
        match action {
            "north" => Some(Direction::North),
            "east" => Some(Direction::East),
            "south" => Some(Direction::South),
            "west" => Some(Direction::West),
            _ => None,
        }
    }
}

/// A living or dead position. A dead player sits at `(-1, -1)` and
/// stays there, matching the reference game's sentinel convention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Coord {
    x: i32,
    y: i32,
}

impl Coord {
    const DEAD: Coord = Coord { x: -1, y: -1 };

    fn is_dead(self) -> bool {
        self.x < 0 && self.y < 0
    }
}

#[derive(Serialize)]
struct TronView {
    cells: HashMap<String, usize>,
    players: Vec<Coord>,
    w: i32,
    h: i32,
}

/// Two players race lightcycles across a grid, each leaving a trail
/// behind it. Running into a trail, the grid's edge, or another player
/// kills you; the last player alive wins. Perfect information: every
/// player sees the whole board every turn.
struct TronState {
    cells: HashMap<(i32, i32), usize>,
    players: Vec<Coord>,
    directions: Vec<Direction>,
    width: i32,
    height: i32,
}

impl TronState {
    fn new_two_player(width: i32, height: i32) -> Self {
        Self {
            cells: HashMap::new(),
            players: vec![Coord { x: 0, y: 0 }, Coord { x: width - 1, y: height - 1 }],
            directions: vec![Direction::South, Direction::North],
            width,
            height,
        }
    }

    fn kill(&mut self, player: usize) {
        self.players[player] = Coord::DEAD;
    }

    fn legal_directions(&self, player: usize) -> Vec<Direction> {
        let pos = self.players[player];
        if pos.is_dead() {
            return vec![];
        }
        let facing = self.directions[player];
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
        .into_iter()
        .filter(|&d| d != facing.opposite())
        .filter(|&d| {
            let (dx, dy) = d.delta();
            let (x, y) = (pos.x + dx, pos.y + dy);
            x >= 0 && x < self.width && y >= 0 && y < self.height
        })
        .collect()
    }
}

impl MatchLogic for TronState {
    fn actions(&self, player: usize) -> Value {
        serde_json::to_value(self.legal_directions(player)).unwrap_or(Value::Array(vec![]))
    }

    /// An unparsable or illegal action kills the player, same as making
    /// no move at all — there is no "do nothing and survive" option in
    /// this game.
    fn do_action(&mut self, player: usize, action: &str) {
        if self.players[player].is_dead() {
            return;
        }

        let direction = match Direction::parse(action) {
            Some(d) if self.legal_directions(player).contains(&d) => d,
            _ => {
                self.kill(player);
                return;
            }
        };

        self.directions[player] = direction;
        let before = self.players[player];
        self.cells.insert((before.x, before.y), player);

        let (dx, dy) = direction.delta();
        let after = Coord { x: before.x + dx, y: before.y + dy };
        self.players[player] = after;

        if self.cells.contains_key(&(after.x, after.y)) {
            self.kill(player);
        }

        for other in 0..self.players.len() {
            if other == player {
                continue;
            }
            if !self.players[other].is_dead()
                && self.players[other].x == after.x
                && self.players[other].y == after.y
            {
                self.kill(player);
                self.kill(other);
            }
        }
    }

    fn view(&self, _player: usize) -> Value {
        let cells = self
            .cells
            .iter()
            .map(|(&(x, y), &p)| (format!("{x},{y}"), p))
            .collect();
        serde_json::to_value(TronView {
            cells,
            players: self.players.clone(),
            w: self.width,
            h: self.height,
        })
        .unwrap_or(Value::Null)
    }

    fn finished(&self) -> bool {
        self.players.iter().any(|p| p.is_dead())
    }

    fn result(&self) -> Vec<Outcome> {
        let alive = self.players.iter().filter(|p| !p.is_dead()).count();
        self.players
            .iter()
            .map(|p| match (p.is_dead(), alive) {
                (false, _) => Outcome::Win,
                (true, 0) => Outcome::Tie,
                (true, _) => Outcome::Loss,
            })
            .collect()
    }
}

fn split_env(var: &str) -> Vec<String> {
    std::env::var(var)
        .unwrap_or_default()
        .split(ENV_LIST_SEP)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ids = split_env(IDS_ENV_VAR);
    let secrets = split_env(SECRETS_ENV_VAR);
    assert_eq!(ids.len(), secrets.len(), "ids and secrets must pair up 1:1");
    assert_eq!(ids.len(), 2, "this server only plays two-player Tron");

    std::fs::create_dir_all(LOG_DIR).expect("failed to create match log directory");

    let table = SecretTable::from_pairs(&ids, &secrets);
    let transport = WebSocketTransport::bind(LISTEN_ADDR)
        .await
        .expect("failed to bind match listen address");

    let (err_tx, mut err_rx) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(err) = err_rx.recv().await {
            match err {
                TurnError::SendTimeout { client } => {
                    tracing::warn!(%client, "turn broadcast timed out");
                }
                TurnError::ReceiveTimeout { client } => {
                    tracing::warn!(%client, "move collection timed out");
                }
            }
        }
    });

    let game = TronState::new_two_player(GRID_WIDTH, GRID_HEIGHT);
    let outcome = run_match(
        transport,
        game,
        ids,
        table,
        HandlerTimeouts::default(),
        LOG_DIR,
        err_tx,
    )
    .await;

    match outcome {
        Ok(result) => tracing::info!(?result, "match finished"),
        Err(MatchError::ConnectionTimeout(id)) => {
            tracing::warn!(agent = %id, "match aborted: agent never connected");
        }
        Err(err) => {
            tracing::warn!(%err, "match did not complete");
        }
    }
}
