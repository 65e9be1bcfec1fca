//! A small grid colony: rock to dig, stone to haul, one stockpile.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use colony::act::{PathPoll, PathWorld};
use colony::core::{ReservationTable, ReservationWorld, WorldMut, WorldView};

pub type Cell = (i32, i32);

const NEIGHBOURS: [Cell; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug)]
pub struct GridWorld {
    width: i32,
    height: i32,
    rock: BTreeSet<Cell>,
    stone: BTreeMap<Cell, u32>,
    stockpile: Cell,
    stored: u32,
    positions: BTreeMap<u64, Cell>,
    /// Goal of each outstanding path request. Requests answer one tick after they are made.
    requests: BTreeMap<u64, Cell>,
    reservations: ReservationTable<Cell, u64>,
    /// Cells with a haul task already queued.
    haul_designations: BTreeSet<Cell>,
}

impl GridWorld {
    /// Lay out `rock_count` rock cells as a block on the right half of the map, filling columns
    /// from the middle outwards. The stockpile is the top-left corner.
    pub fn generate(width: i32, height: i32, rock_count: usize) -> Self {
        let width = width.max(4);
        let height = height.max(1);
        let mut rock = BTreeSet::new();
        'fill: for x in width / 2..width {
            for y in 0..height {
                if rock.len() >= rock_count {
                    break 'fill;
                }
                rock.insert((x, y));
            }
        }

        Self {
            width,
            height,
            rock,
            stone: BTreeMap::new(),
            stockpile: (0, 0),
            stored: 0,
            positions: BTreeMap::new(),
            requests: BTreeMap::new(),
            reservations: ReservationTable::new(),
            haul_designations: BTreeSet::new(),
        }
    }

    /// Place a creature on the left edge, spreading them down the column.
    pub fn spawn(&mut self, agent: u64) -> Cell {
        let cell = (0, (agent % self.height as u64) as i32);
        self.positions.insert(agent, cell);
        cell
    }

    pub fn stockpile(&self) -> Cell {
        self.stockpile
    }

    pub fn stored(&self) -> u32 {
        self.stored
    }

    pub fn rock(&self) -> impl Iterator<Item = Cell> + '_ {
        self.rock.iter().copied()
    }

    pub fn is_rock(&self, cell: Cell) -> bool {
        self.rock.contains(&cell)
    }

    pub fn stone_at(&self, cell: Cell) -> u32 {
        self.stone.get(&cell).copied().unwrap_or(0)
    }

    pub fn loose_stone(&self) -> u32 {
        self.stone.values().sum()
    }

    /// Stone piles with no haul task queued for them yet.
    pub fn undesignated_stone(&self) -> Vec<Cell> {
        self.stone
            .keys()
            .filter(|cell| !self.haul_designations.contains(cell))
            .copied()
            .collect()
    }

    pub fn designate_haul(&mut self, cell: Cell) {
        self.haul_designations.insert(cell);
    }

    pub fn clear_haul(&mut self, cell: Cell) {
        self.haul_designations.remove(&cell);
    }

    /// Turn a rock cell into floor with one stone on it.
    pub fn mine(&mut self, cell: Cell) -> bool {
        if !self.rock.remove(&cell) {
            return false;
        }
        *self.stone.entry(cell).or_insert(0) += 1;
        true
    }

    pub fn take_stone(&mut self, cell: Cell) -> bool {
        match self.stone.get_mut(&cell) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.stone.remove(&cell);
                }
                true
            }
            _ => false,
        }
    }

    /// Put a carried stone down. On the stockpile it counts as stored.
    pub fn drop_stone(&mut self, cell: Cell) {
        if cell == self.stockpile {
            self.stored += 1;
        } else {
            *self.stone.entry(cell).or_insert(0) += 1;
        }
    }

    fn in_bounds(&self, (x, y): Cell) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.rock.contains(&cell)
    }

    /// Breadth-first search over walkable cells. The returned path starts at `from` and ends at the
    /// first cell accepted by `is_goal`.
    pub fn search(&self, from: Cell, is_goal: impl Fn(Cell) -> bool) -> Option<Vec<Cell>> {
        let mut came_from: BTreeMap<Cell, Cell> = BTreeMap::new();
        let mut frontier = VecDeque::from([from]);
        came_from.insert(from, from);

        while let Some(cell) = frontier.pop_front() {
            if is_goal(cell) {
                let mut path = vec![cell];
                let mut at = cell;
                while at != from {
                    at = came_from[&at];
                    path.push(at);
                }
                path.reverse();
                return Some(path);
            }
            for (dx, dy) in NEIGHBOURS {
                let next = (cell.0 + dx, cell.1 + dy);
                if self.is_walkable(next) && !came_from.contains_key(&next) {
                    came_from.insert(next, cell);
                    frontier.push_back(next);
                }
            }
        }
        None
    }

    /// Closest walkable cell next to `rock` that `agent` can reach.
    pub fn dig_spot(&self, agent: u64, rock: Cell) -> Option<Vec<Cell>> {
        let from = *self.positions.get(&agent)?;
        self.search(from, |cell| {
            NEIGHBOURS
                .iter()
                .any(|(dx, dy)| (cell.0 + dx, cell.1 + dy) == rock)
        })
    }

    pub fn path_between(&self, agent: u64, goal: Cell) -> Option<Vec<Cell>> {
        let from = *self.positions.get(&agent)?;
        self.search(from, |cell| cell == goal)
    }
}

impl WorldView for GridWorld {
    type Agent = u64;

    fn agent_exists(&self, agent: u64) -> bool {
        self.positions.contains_key(&agent)
    }
}

impl WorldMut for GridWorld {}

impl PathWorld for GridWorld {
    type Location = Cell;

    fn location(&self, agent: u64) -> Option<Cell> {
        self.positions.get(&agent).copied()
    }

    fn request_path(&mut self, agent: u64, goal: Cell) -> PathPoll<Cell> {
        if self.requests.get(&agent) != Some(&goal) {
            self.requests.insert(agent, goal);
            return PathPoll::Pending;
        }
        self.requests.remove(&agent);
        match self.path_between(agent, goal) {
            Some(path) => PathPoll::Ready(path),
            None => PathPoll::Failed,
        }
    }

    fn advance(&mut self, agent: u64, next: Cell) -> bool {
        let Some(here) = self.positions.get(&agent).copied() else {
            return false;
        };
        let adjacent = (here.0 - next.0).abs() + (here.1 - next.1).abs() == 1;
        if !adjacent || !self.is_walkable(next) {
            return false;
        }
        self.positions.insert(agent, next);
        true
    }

    fn cancel_path(&mut self, agent: u64) {
        self.requests.remove(&agent);
    }
}

impl ReservationWorld<Cell> for GridWorld {
    fn reservations(&self) -> &ReservationTable<Cell, u64> {
        &self.reservations
    }

    fn reservations_mut(&mut self) -> &mut ReservationTable<Cell, u64> {
        &mut self.reservations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rock_fills_columns_from_the_middle() {
        let world = GridWorld::generate(8, 3, 4);
        let rock: Vec<_> = world.rock().collect();
        assert_eq!(rock, vec![(4, 0), (4, 1), (4, 2), (5, 0)]);
    }

    #[test]
    fn inner_rock_is_unreachable_until_the_face_is_dug() {
        let mut world = GridWorld::generate(6, 1, 2);
        world.spawn(0);
        assert!(world.dig_spot(0, (4, 0)).is_none());
        assert_eq!(world.dig_spot(0, (3, 0)).unwrap().last(), Some(&(2, 0)));

        assert!(world.mine((3, 0)));
        assert_eq!(world.dig_spot(0, (4, 0)).unwrap().last(), Some(&(3, 0)));
        assert_eq!(world.stone_at((3, 0)), 1);
    }

    #[test]
    fn path_requests_answer_on_the_second_poll() {
        let mut world = GridWorld::generate(6, 2, 0);
        world.spawn(0);
        assert_eq!(world.request_path(0, (2, 0)), PathPoll::Pending);
        assert_eq!(
            world.request_path(0, (2, 0)),
            PathPoll::Ready(vec![(0, 0), (1, 0), (2, 0)])
        );
    }

    #[test]
    fn cannot_walk_into_rock() {
        let mut world = GridWorld::generate(4, 1, 1);
        world.spawn(0);
        assert!(world.advance(0, (1, 0)));
        assert!(!world.advance(0, (2, 0)));
        assert_eq!(world.location(0), Some((1, 0)));
    }

    #[test]
    fn stone_on_the_stockpile_counts_as_stored() {
        let mut world = GridWorld::generate(4, 1, 0);
        world.drop_stone((0, 0));
        world.drop_stone((1, 0));
        assert_eq!(world.stored(), 1);
        assert_eq!(world.loose_stone(), 1);
    }
}
