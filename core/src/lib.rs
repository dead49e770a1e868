// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt::Display, str::FromStr};

#[cfg(feature = "rand")]
use rand::{
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
    Rng,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use risc0_zkvm::sha::{Digest, Sha256};

pub mod board;
pub mod events;

pub use board::{BoardError, Cell, CellState, GameBoard, ShipState};
pub use events::{EventHub, FireOutcome, FireResult, SubscriptionHandle, ValidationResult};

pub const BOARD_SIZE: usize = 10;

/// Declared category of a ship. Categories are compared by identity, never by shape: a
/// [ShipClass::Cruiser] and a [ShipClass::Submarine] span the same number of cells but are
/// never equal.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Hash)]
pub enum ShipClass {
    Carrier,
    Battleship,
    Cruiser,
    Submarine,
    Destroyer,
}

impl ShipClass {
    pub fn span(&self) -> u32 {
        match self {
            ShipClass::Carrier => 5,
            ShipClass::Battleship => 4,
            ShipClass::Cruiser => 3,
            ShipClass::Submarine => 3,
            ShipClass::Destroyer => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShipClass::Carrier => "Carrier",
            ShipClass::Battleship => "Battleship",
            ShipClass::Cruiser => "Cruiser",
            ShipClass::Submarine => "Submarine",
            ShipClass::Destroyer => "Destroyer",
        }
    }

    pub const fn list() -> &'static [ShipClass] {
        &[
            Self::Carrier,
            Self::Battleship,
            Self::Cruiser,
            Self::Submarine,
            Self::Destroyer,
        ]
    }
}

impl Display for ShipClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown ship class '{0}'")]
pub struct UnknownShipClass(pub String);

impl FromStr for ShipClass {
    type Err = UnknownShipClass;

    /// Parses the exact, case sensitive class label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShipClass::list()
            .iter()
            .copied()
            .find(|class| class.label() == s)
            .ok_or_else(|| UnknownShipClass(s.to_string()))
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// A deployed ship. Its cells never change once it is placed; damage lives on the board cells.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ship {
    pub class: ShipClass,
    pub pos: Position,
    pub dir: Direction,
}

/// The ship layout a prover commits to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Fleet {
    pub ships: Vec<Ship>,
    /// Entropy added to the layout such that the commitment is hiding.
    pub pepper: [u8; 16],
}

impl Ship {
    pub fn new(class: ShipClass, pos: impl Into<Position>, dir: Direction) -> Self {
        Ship {
            class,
            pos: pos.into(),
            dir,
        }
    }

    pub fn points(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.class.span()).map(|offset| self.pos.step(self.dir, offset))
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.points().any(|p| p == pos)
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.points().any(|p| other.occupies(p))
    }

    pub fn in_bounds(&self) -> bool {
        self.pos.in_bounds() && self.pos.step(self.dir, self.class.span() - 1).in_bounds()
    }
}

impl Fleet {
    pub fn new(ships: Vec<Ship>, pepper: [u8; 16]) -> Self {
        Self { ships, pepper }
    }

    /// Checks whether the fleet is a complete, valid configuration of ships.
    #[must_use]
    pub fn check(&self) -> bool {
        // Ensure every ship is in bounds.
        if self.ships.iter().any(|ship| !ship.in_bounds()) {
            return false;
        }

        // Ensure every ship class appears exactly once.
        let mut classes = ShipClass::list().to_vec();
        for ship in self.ships.iter() {
            let Some(class_index) = classes.iter().position(|class| ship.class == *class) else {
                return false;
            };
            classes.swap_remove(class_index);
        }
        if !classes.is_empty() {
            return false;
        }

        // Ensure no two ships are intersecting.
        for (i, ship_i) in self.ships.iter().enumerate() {
            for ship_j in self.ships.iter().skip(i + 1) {
                if ship_i.intersects(ship_j) {
                    return false;
                }
            }
        }

        true
    }

    /// Adds a ship if it is in bounds, its class is not yet present and it overlaps nothing.
    #[must_use]
    pub fn add(&mut self, new_ship: Ship) -> bool {
        if !new_ship.in_bounds() {
            return false;
        }
        for ship in self.ships.iter() {
            if ship.class == new_ship.class || ship.intersects(&new_ship) {
                return false;
            }
        }
        self.ships.push(new_ship);
        true
    }

    pub fn occupied(&self, pos: Position) -> bool {
        self.ships.iter().any(|ship| ship.occupies(pos))
    }

    pub fn commit(&self) -> Digest {
        let serialized_fleet =
            bincode::serialize(&self).expect("fleet serialization should always succeed");
        *risc0_zkvm::sha::Impl::hash_bytes(&serialized_fleet)
    }
}

#[cfg(feature = "rand")]
impl Distribution<Fleet> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Fleet {
        // Create a shuffled list of all positions on the board.
        let mut positions: Vec<Position> = (0..BOARD_SIZE as u32)
            .flat_map(|x| (0..BOARD_SIZE as u32).map(move |y| Position { x, y }))
            .collect();
        positions.shuffle(rng);

        // Place the ships from largest to smallest, and using the shuffled positions.
        let mut fleet = Fleet::new(Vec::new(), rng.random());
        for ship_class in ShipClass::list() {
            for pos in positions.iter() {
                let dir = rng.random();
                if fleet.add(Ship::new(*ship_class, *pos, dir)) {
                    break;
                }
                if fleet.add(Ship::new(*ship_class, *pos, dir.flip())) {
                    break;
                }
            }
        }

        // The resulting fleet should always be valid.
        assert!(fleet.check());
        fleet
    }
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction, dist: u32) -> Self {
        match dir {
            Direction::Vertical => Self {
                x: self.x,
                y: self.y + dist,
            },
            Direction::Horizontal => Self {
                x: self.x + dist,
                y: self.y,
            },
        }
    }

    /// Check that the [Position] is within the bounds of the board.
    #[must_use]
    pub fn in_bounds(&self) -> bool {
        self.x < BOARD_SIZE as u32 && self.y < BOARD_SIZE as u32
    }
}

impl From<(u32, u32)> for Position {
    fn from(value: (u32, u32)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

#[cfg(feature = "rand")]
impl Distribution<Direction> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        match rng.random::<bool>() {
            true => Direction::Horizontal,
            false => Direction::Vertical,
        }
    }
}
