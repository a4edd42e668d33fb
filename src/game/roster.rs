//! Game record and its seat layout
//!
//! Each team is an array of slots with an index pointing at the captain's
//! slot. Captaincy belongs to the slot, so swaps and subs only ever move
//! identities between slots.

use crate::types::{
    GameId, GameStatus, PlayerId, PlayerIdentity, QueueKind, Team, UserInGame,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One side of a game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub slots: Vec<PlayerIdentity>,
    /// Index into `slots` of the captain's slot
    pub captain: Option<usize>,
}

impl TeamRoster {
    pub fn new(slots: Vec<PlayerIdentity>, captain: Option<usize>) -> Self {
        Self { slots, captain }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn captain(&self) -> Option<&PlayerIdentity> {
        self.captain.and_then(|index| self.slots.get(index))
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.slots.iter().map(|p| p.id).collect()
    }
}

/// Where a player sits inside a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Team { team: Team, index: usize },
    Unassigned(usize),
}

/// An active or finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub queue: QueueKind,
    pub status: GameStatus,
    pub maps: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Partition rank the next shuffle will use
    pub reshuffles: u32,
    pub server: Option<String>,
    pub team_one: TeamRoster,
    pub team_two: TeamRoster,
    /// Players waiting to be drafted
    pub unassigned: Vec<PlayerIdentity>,
}

impl Game {
    pub fn team(&self, team: Team) -> &TeamRoster {
        match team {
            Team::One => &self.team_one,
            Team::Two => &self.team_two,
        }
    }

    pub fn team_mut(&mut self, team: Team) -> &mut TeamRoster {
        match team {
            Team::One => &mut self.team_one,
            Team::Two => &mut self.team_two,
        }
    }

    pub fn is_drafting(&self) -> bool {
        self.status == GameStatus::Pending
    }

    pub fn is_active(&self) -> bool {
        self.status != GameStatus::Finished
    }

    /// Locate a player's seat
    pub fn seat_of(&self, player_id: PlayerId) -> Option<Seat> {
        for team in [Team::One, Team::Two] {
            if let Some(index) = self.team(team).slots.iter().position(|p| p.id == player_id) {
                return Some(Seat::Team { team, index });
            }
        }

        self.unassigned
            .iter()
            .position(|p| p.id == player_id)
            .map(Seat::Unassigned)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.seat_of(player_id).is_some()
    }

    pub fn team_of(&self, player_id: PlayerId) -> Option<Team> {
        match self.seat_of(player_id)? {
            Seat::Team { team, .. } => Some(team),
            Seat::Unassigned(_) => None,
        }
    }

    pub fn is_captain(&self, player_id: PlayerId) -> bool {
        match self.seat_of(player_id) {
            Some(Seat::Team { team, index }) => self.team(team).captain == Some(index),
            _ => false,
        }
    }

    pub fn occupant(&self, seat: Seat) -> Option<&PlayerIdentity> {
        match seat {
            Seat::Team { team, index } => self.team(team).slots.get(index),
            Seat::Unassigned(index) => self.unassigned.get(index),
        }
    }

    /// Put `identity` in `seat` and return whoever sat there
    pub fn replace_occupant(&mut self, seat: Seat, identity: PlayerIdentity) -> Option<PlayerIdentity> {
        let slot = match seat {
            Seat::Team { team, index } => self.team_mut(team).slots.get_mut(index),
            Seat::Unassigned(index) => self.unassigned.get_mut(index),
        }?;
        Some(std::mem::replace(slot, identity))
    }

    /// Move unassigned players onto `team`, in the given order
    ///
    /// Returns `false` without changing anything if any id is not unassigned.
    pub fn assign(&mut self, team: Team, player_ids: &[PlayerId]) -> bool {
        if !player_ids
            .iter()
            .all(|id| self.unassigned.iter().any(|p| p.id == *id))
        {
            return false;
        }

        for id in player_ids {
            if let Some(index) = self.unassigned.iter().position(|p| p.id == *id) {
                let identity = self.unassigned.remove(index);
                self.team_mut(team).slots.push(identity);
            }
        }
        true
    }

    /// Every identity in the game, teams first
    pub fn participants(&self) -> Vec<PlayerIdentity> {
        self.team_one
            .slots
            .iter()
            .chain(&self.team_two.slots)
            .chain(&self.unassigned)
            .cloned()
            .collect()
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.participants().into_iter().map(|p| p.id).collect()
    }

    /// Flattened per-player view
    pub fn users(&self) -> Vec<UserInGame> {
        let mut users = Vec::new();
        for team in [Team::One, Team::Two] {
            let roster = self.team(team);
            for (index, identity) in roster.slots.iter().enumerate() {
                users.push(UserInGame {
                    player_id: identity.id,
                    name: identity.name.clone(),
                    is_captain: roster.captain == Some(index),
                    team: Some(team),
                });
            }
        }
        users.extend(self.unassigned.iter().map(|identity| UserInGame {
            player_id: identity.id,
            name: identity.name.clone(),
            is_captain: false,
            team: None,
        }));
        users
    }
}
