//! Table and player directory.
//!
//! The directory is the client's local copy of the server's table list and
//! player list. It is mutated only through [`DirectoryUpdate`]s applied by the
//! synchronizer; everything else reads it.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::board::Color;

/// Which half of the directory an update touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryKind {
    Players,
    Tables,
}

impl DirectoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Players => "players",
            Self::Tables => "tables",
        }
    }
}

/// Table game status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Seats open, no game running
    #[default]
    Waiting,
    /// Game in progress
    Playing,
    /// Game over, table still open
    Ended,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Ended => "ended",
        }
    }
}

/// Player record as delivered by the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub rating: i32,
    #[serde(default)]
    pub table_id: Option<String>,
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>, rating: i32) -> Self {
        Self {
            id: id.into(),
            rating,
            table_id: None,
        }
    }

    pub fn at_table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }
}

/// Table record as delivered by the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: String,
    #[serde(default)]
    pub red: Option<String>,
    #[serde(default)]
    pub black: Option<String>,
    #[serde(default)]
    pub status: TableStatus,
}

impl TableRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            red: None,
            black: None,
            status: TableStatus::Waiting,
        }
    }

    pub fn with_seat(mut self, color: Color, player_id: impl Into<String>) -> Self {
        match color {
            Color::Red => self.red = Some(player_id.into()),
            Color::Black => self.black = Some(player_id.into()),
        }
        self
    }

    pub fn with_status(mut self, status: TableStatus) -> Self {
        self.status = status;
        self
    }
}

/// A batch of directory records.
///
/// A `complete` update is a full listing: any entity it does not mention is
/// dropped. A partial update only upserts `records` and drops `removed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUpdate<R> {
    pub records: Vec<R>,
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub complete: bool,
}

impl<R> DirectoryUpdate<R> {
    /// Full listing.
    pub fn full(records: Vec<R>) -> Self {
        Self {
            records,
            removed: Vec::new(),
            complete: true,
        }
    }

    /// Incremental change.
    pub fn partial(records: Vec<R>) -> Self {
        Self {
            records,
            removed: Vec::new(),
            complete: false,
        }
    }

    pub fn with_removed(mut self, ids: Vec<String>) -> Self {
        self.removed = ids;
        self
    }
}

/// A connected user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub rating: i32,
    /// Table the player currently sits at or watches
    pub table_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    fn from_record(record: PlayerRecord) -> Self {
        Self {
            id: record.id,
            rating: record.rating,
            table_id: record.table_id,
            updated_at: Utc::now(),
        }
    }

    fn update(&mut self, record: PlayerRecord) {
        self.rating = record.rating;
        self.table_id = record.table_id;
        self.updated_at = Utc::now();
    }

    /// "id (rating)" label used by player lists and seat buttons.
    pub fn label(&self) -> String {
        format!("{} ({})", self.id, self.rating)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "pid": self.id,
            "rating": self.rating,
            "table_id": self.table_id
        })
    }
}

/// A game session in the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: String,
    pub red: Option<String>,
    pub black: Option<String>,
    pub status: TableStatus,
    pub updated_at: DateTime<Utc>,
}

impl Table {
    fn from_record(record: TableRecord) -> Self {
        Self {
            id: record.id,
            red: record.red,
            black: record.black,
            status: record.status,
            updated_at: Utc::now(),
        }
    }

    fn update(&mut self, record: TableRecord) {
        self.red = record.red;
        self.black = record.black;
        self.status = record.status;
        self.updated_at = Utc::now();
    }

    /// Player id seated at `color`, if any.
    pub fn seat(&self, color: Color) -> Option<&str> {
        match color {
            Color::Red => self.red.as_deref(),
            Color::Black => self.black.as_deref(),
        }
    }

    /// Color `player_id` is seated as, if seated.
    pub fn color_of(&self, player_id: &str) -> Option<Color> {
        [Color::Red, Color::Black]
            .into_iter()
            .find(|c| self.seat(*c) == Some(player_id))
    }

    pub fn is_full(&self) -> bool {
        self.red.is_some() && self.black.is_some()
    }
}

/// Who a table seat resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatOccupant<'a> {
    Empty,
    Player(&'a Player),
    /// Seat names a player id the directory has never heard of
    Placeholder(&'a str),
}

impl SeatOccupant<'_> {
    pub fn label(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Player(p) => p.label(),
            Self::Placeholder(id) => format!("{} (?)", id),
        }
    }
}

/// Counts of what an update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// This update performed the one-time "loaded" transition
    pub became_loaded: bool,
}

impl UpdateSummary {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0 && !self.became_loaded
    }
}

/// Read-only point-in-time view of the directory.
#[derive(Debug, Clone, Copy)]
pub struct DirectorySnapshot<'a> {
    pub tables: &'a HashMap<String, Table>,
    pub players: &'a HashMap<String, Player>,
    pub loaded: bool,
}

/// Local cache of tables and players.
#[derive(Debug, Default)]
pub struct DirectoryStore {
    tables: HashMap<String, Table>,
    players: HashMap<String, Player>,
    /// Set by the first complete table listing, never cleared
    loaded: bool,
}

impl DirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the first full table listing has arrived.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn snapshot(&self) -> DirectorySnapshot<'_> {
        DirectorySnapshot {
            tables: &self.tables,
            players: &self.players,
            loaded: self.loaded,
        }
    }

    /// Apply a player update.
    pub(crate) fn apply_players(&mut self, update: DirectoryUpdate<PlayerRecord>) -> UpdateSummary {
        let summary = upsert(
            &mut self.players,
            update,
            |r: &PlayerRecord| r.id.clone(),
            Player::from_record,
            Player::update,
        );
        debug!(
            created = summary.created,
            updated = summary.updated,
            removed = summary.removed,
            "player directory updated"
        );
        summary
    }

    /// Apply a table update. The first complete listing marks the directory loaded.
    pub(crate) fn apply_tables(&mut self, update: DirectoryUpdate<TableRecord>) -> UpdateSummary {
        let complete = update.complete;
        let mut summary = upsert(
            &mut self.tables,
            update,
            |r: &TableRecord| r.id.clone(),
            Table::from_record,
            Table::update,
        );

        if complete && !self.loaded {
            self.loaded = true;
            summary.became_loaded = true;
            info!(tables = self.tables.len(), "table directory loaded");
        }

        debug!(
            created = summary.created,
            updated = summary.updated,
            removed = summary.removed,
            "table directory updated"
        );
        summary
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.get(table_id)
    }

    /// Players ordered by rating (highest first), then id.
    pub fn players(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.id.cmp(&b.id)));
        players
    }

    /// Tables ordered by id.
    pub fn tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.values().collect();
        tables.sort_by(|a, b| a.id.cmp(&b.id));
        tables
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Table the player is at, if known. Decides "invite" vs "join" in the UI.
    pub fn player_table(&self, player_id: &str) -> Option<&Table> {
        let table_id = self.players.get(player_id)?.table_id.as_deref()?;
        self.tables.get(table_id)
    }

    /// Resolve who sits at `color` of a table.
    pub fn resolve_seat<'a>(&'a self, table: &'a Table, color: Color) -> SeatOccupant<'a> {
        match table.seat(color) {
            None => SeatOccupant::Empty,
            Some(pid) => match self.players.get(pid) {
                Some(player) => SeatOccupant::Player(player),
                None => {
                    warn!(
                        table_id = %table.id,
                        player_id = pid,
                        "table seat references unknown player"
                    );
                    SeatOccupant::Placeholder(pid)
                }
            },
        }
    }

    /// Convert to JSON for the lobby views.
    pub fn to_json(&self) -> serde_json::Value {
        let tables: Vec<serde_json::Value> = self
            .tables()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "tid": t.id,
                    "status": t.status.as_str(),
                    "red": self.resolve_seat(t, Color::Red).label(),
                    "black": self.resolve_seat(t, Color::Black).label()
                })
            })
            .collect();

        let players: Vec<serde_json::Value> =
            self.players().into_iter().map(|p| p.to_json()).collect();

        serde_json::json!({
            "loaded": self.loaded,
            "tables": tables,
            "players": players
        })
    }
}

fn upsert<R, E>(
    entities: &mut HashMap<String, E>,
    update: DirectoryUpdate<R>,
    key: impl Fn(&R) -> String,
    create: impl Fn(R) -> E,
    refresh: impl Fn(&mut E, R),
) -> UpdateSummary {
    let mut summary = UpdateSummary::default();

    if update.complete {
        let listed: HashSet<String> = update.records.iter().map(&key).collect();
        let before = entities.len();
        entities.retain(|id, _| listed.contains(id));
        summary.removed += before - entities.len();
    }

    for id in &update.removed {
        if entities.remove(id).is_some() {
            summary.removed += 1;
        }
    }

    for record in update.records {
        let id = key(&record);
        match entities.get_mut(&id) {
            Some(entity) => {
                refresh(entity, record);
                summary.updated += 1;
            }
            None => {
                entities.insert(id, create(record));
                summary.created += 1;
            }
        }
    }

    summary
}
