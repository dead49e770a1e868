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

//! Board/ship store: the authoritative cell and ship state of one player's board.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Fleet, Position, Ship, ShipClass, BOARD_SIZE};

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Hash)]
pub enum CellState {
    Empty,
    ShipPresent,
    Hit,
    Missed,
}

#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Hash)]
pub enum ShipState {
    Intact,
    Damaged,
    Destroyed,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Cell {
    pub pos: Position,
    pub state: CellState,
    /// Result of proof verification, recorded once the fire cycle for this cell is finalized.
    pub verified: Option<bool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("{0} does not fit on the board")]
    OutOfBounds(ShipClass),

    #[error("{0} is already deployed")]
    DuplicateClass(ShipClass),

    #[error("{0} overlaps the {1}")]
    Overlap(ShipClass, ShipClass),

    #[error("ships cannot be deployed after the first shot")]
    AlreadyFiring,
}

impl Cell {
    fn new(pos: Position) -> Self {
        Self {
            pos,
            state: CellState::Empty,
            verified: None,
        }
    }

    pub fn is_fired(&self) -> bool {
        matches!(self.state, CellState::Hit | CellState::Missed)
    }

    /// Checks a claimed fire result against what this cell actually holds.
    pub fn verify(&self, claimed: CellState) -> bool {
        self.is_fired() && self.state == claimed
    }

    /// Records the verification result. Only the first result for a fired cell is kept.
    pub fn validate(&mut self, is_valid: bool) -> bool {
        if !self.is_fired() || self.verified.is_some() {
            return false;
        }
        self.verified = Some(is_valid);
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameBoard {
    /// Rows of cells, indexed as `cells[y][x]`.
    cells: Vec<Vec<Cell>>,
    ships: Vec<Ship>,
    turn: u32,
}

impl Default for GameBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBoard {
    pub fn new() -> Self {
        let cells = (0..BOARD_SIZE as u32)
            .map(|y| {
                (0..BOARD_SIZE as u32)
                    .map(|x| Cell::new(Position { x, y }))
                    .collect()
            })
            .collect();
        Self {
            cells,
            ships: Vec::new(),
            turn: 0,
        }
    }

    pub fn from_ships(ships: impl IntoIterator<Item = Ship>) -> Result<Self, BoardError> {
        let mut board = Self::new();
        for ship in ships {
            board.deploy(ship)?;
        }
        Ok(board)
    }

    pub fn from_fleet(fleet: &Fleet) -> Result<Self, BoardError> {
        Self::from_ships(fleet.ships.iter().cloned())
    }

    /// Places a ship, marking its cells as occupied.
    pub fn deploy(&mut self, ship: Ship) -> Result<(), BoardError> {
        if self.turn > 0 {
            return Err(BoardError::AlreadyFiring);
        }
        if !ship.in_bounds() {
            return Err(BoardError::OutOfBounds(ship.class));
        }
        for placed in self.ships.iter() {
            if placed.class == ship.class {
                return Err(BoardError::DuplicateClass(ship.class));
            }
            if placed.intersects(&ship) {
                return Err(BoardError::Overlap(ship.class, placed.class));
            }
        }

        for pos in ship.points() {
            if let Some(cell) = self.cell_mut(pos) {
                cell.state = CellState::ShipPresent;
            }
        }
        tracing::debug!("deployed {} at {}", ship.class, ship.pos);
        self.ships.push(ship);
        Ok(())
    }

    pub fn is_all_deployed(&self) -> bool {
        ShipClass::list()
            .iter()
            .all(|class| self.ships.iter().any(|ship| ship.class == *class))
    }

    pub fn board(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// Number of accepted shots so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if !pos.in_bounds() {
            return None;
        }
        self.cells
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
    }

    fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if !pos.in_bounds() {
            return None;
        }
        self.cells
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
    }

    pub fn ship_by_cell(&self, pos: Position) -> Option<&Ship> {
        self.ships.iter().find(|ship| ship.occupies(pos))
    }

    /// Applies a provisional shot. Returns false, leaving the board untouched, if the position is
    /// off the board or was already fired upon.
    pub fn fire(&mut self, pos: Position) -> bool {
        let Some(cell) = self.cell_mut(pos) else {
            return false;
        };
        cell.state = match cell.state {
            CellState::ShipPresent => CellState::Hit,
            CellState::Empty => CellState::Missed,
            CellState::Hit | CellState::Missed => return false,
        };
        self.turn += 1;
        true
    }

    /// Checks that a claimed result is consistent with the stored occupancy at `pos`.
    pub fn verify(&self, pos: Position, claimed: CellState) -> bool {
        self.cell(pos).is_some_and(|cell| cell.verify(claimed))
    }

    /// Finalizes the cell at `pos` with the verification result.
    pub fn validate(&mut self, pos: Position, is_valid: bool) -> bool {
        self.cell_mut(pos)
            .is_some_and(|cell| cell.validate(is_valid))
    }

    pub fn ship_state(&self, ship: &Ship) -> ShipState {
        let hits = ship
            .points()
            .filter(|pos| {
                self.cell(*pos)
                    .is_some_and(|cell| cell.state == CellState::Hit)
            })
            .count() as u32;
        match hits {
            0 => ShipState::Intact,
            n if n == ship.class.span() => ShipState::Destroyed,
            _ => ShipState::Damaged,
        }
    }

    /// True iff `ship` is destroyed and `label` names exactly its class.
    pub fn is_destroyed_ship_class(&self, ship: &Ship, label: &str) -> bool {
        self.ship_state(ship) == ShipState::Destroyed
            && label.parse::<ShipClass>().is_ok_and(|class| class == ship.class)
    }

    pub fn remaining_ships(&self) -> impl Iterator<Item = &Ship> + '_ {
        self.ships
            .iter()
            .filter(|ship| self.ship_state(ship) != ShipState::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    fn full_board() -> GameBoard {
        GameBoard::from_ships([
            Ship::new(ShipClass::Carrier, (2, 3), Direction::Vertical),
            Ship::new(ShipClass::Battleship, (3, 1), Direction::Horizontal),
            Ship::new(ShipClass::Cruiser, (4, 7), Direction::Vertical),
            Ship::new(ShipClass::Submarine, (7, 5), Direction::Horizontal),
            Ship::new(ShipClass::Destroyer, (7, 7), Direction::Horizontal),
        ])
        .unwrap()
    }

    #[test]
    fn deploy_marks_cells() {
        let board = full_board();
        assert!(board.is_all_deployed());
        assert_eq!(
            board.cell((2, 5).into()).unwrap().state,
            CellState::ShipPresent
        );
        assert_eq!(board.cell((0, 0).into()).unwrap().state, CellState::Empty);
        assert_eq!(
            board.ship_by_cell((5, 1).into()).unwrap().class,
            ShipClass::Battleship
        );
        assert!(board.ship_by_cell((0, 0).into()).is_none());
    }

    #[test]
    fn deploy_rejects_bad_ships() {
        let mut board = GameBoard::new();
        assert!(!board.is_all_deployed());
        board
            .deploy(Ship::new(ShipClass::Cruiser, (0, 0), Direction::Vertical))
            .unwrap();
        assert_eq!(
            board.deploy(Ship::new(ShipClass::Cruiser, (5, 5), Direction::Vertical)),
            Err(BoardError::DuplicateClass(ShipClass::Cruiser))
        );
        assert_eq!(
            board.deploy(Ship::new(
                ShipClass::Submarine,
                (0, 1),
                Direction::Horizontal
            )),
            Err(BoardError::Overlap(ShipClass::Submarine, ShipClass::Cruiser))
        );
        assert_eq!(
            board.deploy(Ship::new(ShipClass::Carrier, (9, 9), Direction::Vertical)),
            Err(BoardError::OutOfBounds(ShipClass::Carrier))
        );
        assert_eq!(board.ships().len(), 1);

        // The layout is frozen once the first shot lands.
        assert!(board.fire(Position::new(9, 9)));
        assert_eq!(
            board.deploy(Ship::new(ShipClass::Carrier, (0, 9), Direction::Horizontal)),
            Err(BoardError::AlreadyFiring)
        );
        assert_eq!(board.ships().len(), 1);
    }

    #[test]
    fn fire_is_accepted_once() {
        let mut board = full_board();
        assert!(board.fire((2, 3).into()));
        assert_eq!(board.turn(), 1);
        assert_eq!(board.cell((2, 3).into()).unwrap().state, CellState::Hit);

        assert!(!board.fire((2, 3).into()));
        assert_eq!(board.turn(), 1);

        assert!(board.fire((0, 0).into()));
        assert_eq!(board.cell((0, 0).into()).unwrap().state, CellState::Missed);

        assert!(!board.fire((10, 0).into()));
        assert_eq!(board.turn(), 2);
    }

    #[test]
    fn verify_compares_claim_with_occupancy() {
        let mut board = full_board();
        assert!(!board.verify((2, 3).into(), CellState::Hit), "not fired yet");
        board.fire((2, 3).into());
        board.fire((0, 0).into());
        assert!(board.verify((2, 3).into(), CellState::Hit));
        assert!(!board.verify((2, 3).into(), CellState::Missed));
        assert!(board.verify((0, 0).into(), CellState::Missed));
        assert!(!board.verify((0, 0).into(), CellState::Hit));
    }

    #[test]
    fn validate_records_first_result_only() {
        let mut board = full_board();
        assert!(!board.validate((2, 3).into(), true), "not fired yet");
        board.fire((2, 3).into());
        assert!(board.validate((2, 3).into(), true));
        assert!(!board.validate((2, 3).into(), false));
        assert_eq!(board.cell((2, 3).into()).unwrap().verified, Some(true));
        assert_eq!(board.cell((2, 3).into()).unwrap().state, CellState::Hit);
    }

    #[test]
    fn ship_state_is_derived_from_cells() {
        let mut board = full_board();
        let destroyer = board.ship_by_cell((7, 7).into()).unwrap().clone();
        assert_eq!(board.ship_state(&destroyer), ShipState::Intact);
        board.fire((7, 7).into());
        assert_eq!(board.ship_state(&destroyer), ShipState::Damaged);
        board.fire((8, 7).into());
        assert_eq!(board.ship_state(&destroyer), ShipState::Destroyed);
        assert_eq!(board.remaining_ships().count(), 4);
    }

    #[test]
    fn destroyed_class_query_matches_identity() {
        let mut board = full_board();
        let cruiser = board.ship_by_cell((4, 7).into()).unwrap().clone();
        assert!(!board.is_destroyed_ship_class(&cruiser, "Cruiser"));

        for pos in cruiser.points() {
            board.fire(pos);
        }
        assert!(board.is_destroyed_ship_class(&cruiser, "Cruiser"));
        // Same shape, different class.
        assert!(!board.is_destroyed_ship_class(&cruiser, "Submarine"));
        assert!(!board.is_destroyed_ship_class(&cruiser, "cruiser"));
        assert!(!board.is_destroyed_ship_class(&cruiser, ""));

        let submarine = board.ship_by_cell((7, 5).into()).unwrap().clone();
        board.fire((7, 5).into());
        assert!(!board.is_destroyed_ship_class(&submarine, "Submarine"));
    }
}
