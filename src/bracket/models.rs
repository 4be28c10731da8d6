use std::{fmt, str::FromStr};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::error::BracketError;

/// The identifier of a participant as issued by the tournament backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Whether a tournament is played by individual users or by teams.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    #[default]
    #[strum(to_string = "User")]
    User,
    #[strum(to_string = "Team")]
    Team,
}

/// An entrant of the bracket. Either a single user or a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub kind: ParticipantKind,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ParticipantKind::User,
        }
    }

    pub fn team(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            kind: ParticipantKind::Team,
            ..Self::new(id, name)
        }
    }
}

/// Identifies a match by where it sits in the bracket.
///
/// Rendered as `<round>.<position>`, with rounds starting at 1 and positions at 0. Since the id
/// is derived from the bracket shape, rebuilding a bracket for the same participant count yields
/// the same ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId {
    round: u32,
    position: u32,
}

impl MatchId {
    pub fn new(round: u32, position: u32) -> Self {
        Self { round, position }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn position(&self) -> u32 {
        self.position
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.round, self.position)
    }
}

impl FromStr for MatchId {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BracketError::InvalidMatchId(s.to_string());
        // Plain digits only, u32::from_str would also take a leading '+'
        let number = |part: Option<&str>| {
            part.filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))?
                .parse::<u32>()
                .ok()
        };
        let mut parts = s.split('.');
        let round = number(parts.next())
            .filter(|r| *r > 0)
            .ok_or_else(invalid)?;
        let position = number(parts.next()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { round, position })
    }
}

impl TryFrom<String> for MatchId {
    type Error = BracketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchId> for String {
    fn from(value: MatchId) -> Self {
        value.to_string()
    }
}

/// One of the two participant slots of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum SlotIndex {
    #[strum(to_string = "1")]
    First,
    #[strum(to_string = "2")]
    Second,
}

impl SlotIndex {
    /// The slot of the next-round match fed by the match at `position`.
    pub fn for_position(position: u32) -> Self {
        if position % 2 == 0 {
            SlotIndex::First
        } else {
            SlotIndex::Second
        }
    }
}

/// The content of a participant slot.
///
/// Used to tell a real participant apart from a slot that is waiting for the winner of an earlier
/// match, and from a slot that nobody will ever fill (a bye).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "participant", rename_all = "snake_case")]
pub enum Slot {
    #[default]
    Pending,
    Player(Participant),
    Bye,
}

impl Slot {
    pub fn participant(&self) -> Option<&Participant> {
        match self {
            Slot::Player(participant) => Some(participant),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }
}

/// How the winner of a match was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[strum(to_string = "reported")]
    Reported,
    #[strum(to_string = "bye")]
    Bye,
}

/// A single match of the bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    pub position_in_round: u32,
    pub participant1: Slot,
    pub participant2: Slot,
    pub winner: Option<ParticipantId>,
    pub resolution: Option<Resolution>,
}

impl Match {
    /// Creates an undecided match with both slots pending.
    pub fn new(round: u32, position_in_round: u32) -> Self {
        Self {
            id: MatchId::new(round, position_in_round),
            round,
            position_in_round,
            participant1: Slot::Pending,
            participant2: Slot::Pending,
            winner: None,
            resolution: None,
        }
    }

    pub fn slot(&self, index: SlotIndex) -> &Slot {
        match index {
            SlotIndex::First => &self.participant1,
            SlotIndex::Second => &self.participant2,
        }
    }

    pub fn slot_mut(&mut self, index: SlotIndex) -> &mut Slot {
        match index {
            SlotIndex::First => &mut self.participant1,
            SlotIndex::Second => &mut self.participant2,
        }
    }

    /// Iterates over the participants currently assigned to this match.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        [&self.participant1, &self.participant2]
            .into_iter()
            .filter_map(Slot::participant)
    }

    pub fn get_participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants().find(|p| p.id == *id)
    }

    pub fn get_opponent(&self, id: &ParticipantId) -> Option<&Participant> {
        self.get_participant(id)?;
        self.participants().find(|p| p.id != *id)
    }

    /// Retrieves the winning participant, if the match has been decided.
    pub fn get_winning_participant(&self) -> Option<&Participant> {
        let winner = self.winner.as_ref()?;
        self.get_participant(winner)
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Both participants are known and the match can be played.
    pub fn is_ready(&self) -> bool {
        !self.is_decided() && self.participants().count() == 2
    }

    /// Exactly one participant is assigned and the other slot will never be filled.
    pub fn is_bye(&self) -> bool {
        if self.is_decided() {
            return false;
        }
        match (&self.participant1, &self.participant2) {
            (Slot::Player(_), Slot::Bye) | (Slot::Bye, Slot::Player(_)) => true,
            _ => false,
        }
    }

    /// The position and slot in the next round that receive this match's winner.
    pub fn next_slot(&self) -> (u32, SlotIndex) {
        (
            self.position_in_round / 2,
            SlotIndex::for_position(self.position_in_round),
        )
    }
}

/// The order in which participants are paired up before the bracket is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seeding {
    /// Pair participants in the order they were given.
    AsGiven,
    /// Shuffle with a fixed seed. The same seed always produces the same bracket.
    Seeded(u64),
    /// Shuffle with the thread-local generator.
    Random,
}

impl Seeding {
    pub fn order(&self, mut participants: Vec<Participant>) -> Vec<Participant> {
        match self {
            Seeding::AsGiven => {}
            Seeding::Seeded(seed) => {
                let mut rng = StdRng::seed_from_u64(*seed);
                participants.shuffle(&mut rng);
            }
            Seeding::Random => participants.shuffle(&mut rand::rng()),
        }
        participants
    }
}
