use std::cell::RefCell;

use ts_core::{Direction, EntityKind, EntityRef, EntityTag, TerrainFeature};

use crate::world::World;

const TILE_SIZE: f64 = 16.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    StartMove(u32, Direction),
    StopMove(u32, Direction),
    StartJump(u32),
    StopJump(u32),
    StartDuck(u32),
    StopDuck(u32),
}

#[derive(Debug, Clone)]
pub(crate) struct TestEntity {
    pub entity: EntityRef,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub hit_points: f64,
    pub dead: bool,
    pub jumping: bool,
    pub ducking: bool,
    pub moving: Option<Direction>,
    pub feature: TerrainFeature,
    pub passable: bool,
}

impl TestEntity {
    fn new(id: u32, tag: EntityTag) -> Self {
        Self {
            entity: EntityRef::new(id, tag),
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            hit_points: 1.0,
            dead: false,
            jumping: false,
            ducking: false,
            moving: None,
            feature: TerrainFeature::Air,
            passable: true,
        }
    }

    pub fn actor(id: u32) -> Self {
        Self::new(id, EntityTag::Player)
    }

    pub fn plant(id: u32, x: f64) -> Self {
        let mut entity = Self::new(id, EntityTag::Plant);
        entity.x = x;
        entity
    }

    pub fn slime(id: u32, x: f64) -> Self {
        let mut entity = Self::new(id, EntityTag::Slime);
        entity.x = x;
        entity
    }

    pub fn tile(id: u32, x: f64, y: f64, feature: TerrainFeature) -> Self {
        let mut entity = Self::new(id, EntityTag::Tile);
        entity.x = x;
        entity.y = y;
        entity.width = TILE_SIZE;
        entity.height = TILE_SIZE;
        entity.feature = feature;
        entity.passable = feature != TerrainFeature::Solid;
        entity
    }
}

/// World stub recording issued commands and the order of position
/// queries, so tests can observe iteration order.
#[derive(Debug, Default)]
pub(crate) struct TestWorld {
    pub entities: Vec<TestEntity>,
    pub commands: Vec<Command>,
    pub position_queries: RefCell<Vec<u32>>,
}

impl TestWorld {
    pub fn with_entities(entities: Vec<TestEntity>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    fn find(&self, entity: EntityRef) -> Option<&TestEntity> {
        self.entities.iter().find(|e| e.entity == entity)
    }
}

impl World for TestWorld {
    fn enumerate(&self, kind: EntityKind) -> Vec<EntityRef> {
        self.entities
            .iter()
            .filter(|e| kind.matches(e.entity.tag))
            .map(|e| e.entity)
            .collect()
    }

    fn position(&self, entity: EntityRef) -> Option<(f64, f64)> {
        let found = self.find(entity)?;
        self.position_queries.borrow_mut().push(entity.id);
        Some((found.x, found.y))
    }

    fn size(&self, entity: EntityRef) -> Option<(f64, f64)> {
        self.find(entity).map(|e| (e.width, e.height))
    }

    fn hit_points(&self, entity: EntityRef) -> Option<f64> {
        self.find(entity).map(|e| e.hit_points)
    }

    fn is_moving(&self, entity: EntityRef, direction: Direction) -> Option<bool> {
        self.find(entity).map(|e| e.moving == Some(direction))
    }

    fn is_jumping(&self, entity: EntityRef) -> Option<bool> {
        self.find(entity).map(|e| e.jumping)
    }

    fn is_ducking(&self, entity: EntityRef) -> Option<bool> {
        self.find(entity).map(|e| e.ducking)
    }

    fn is_dead(&self, entity: EntityRef) -> Option<bool> {
        self.find(entity).map(|e| e.dead)
    }

    fn terrain_feature(&self, entity: EntityRef) -> Option<TerrainFeature> {
        self.find(entity).map(|e| e.feature)
    }

    fn is_passable(&self, entity: EntityRef) -> Option<bool> {
        self.find(entity).map(|e| e.passable)
    }

    fn tile_at(&self, x: f64, y: f64) -> Option<EntityRef> {
        self.entities
            .iter()
            .filter(|e| e.entity.tag == EntityTag::Tile)
            .find(|e| {
                x >= e.x && x < e.x + e.width && y >= e.y && y < e.y + e.height
            })
            .map(|e| e.entity)
    }

    fn search(&self, from: EntityRef, direction: Direction) -> Option<EntityRef> {
        let origin = self.find(from)?;
        let (fx, fy) = (origin.x, origin.y);
        self.entities
            .iter()
            .filter(|e| e.entity != from)
            .filter_map(|e| {
                let distance = match direction {
                    Direction::Right => e.x - fx,
                    Direction::Left => fx - e.x,
                    Direction::Up => e.y - fy,
                    Direction::Down => fy - e.y,
                };
                (distance > 0.0).then_some((distance, e.entity))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, entity)| entity)
    }

    fn start_move(&mut self, actor: EntityRef, direction: Direction) {
        self.commands.push(Command::StartMove(actor.id, direction));
    }

    fn stop_move(&mut self, actor: EntityRef, direction: Direction) {
        self.commands.push(Command::StopMove(actor.id, direction));
    }

    fn start_jump(&mut self, actor: EntityRef) {
        self.commands.push(Command::StartJump(actor.id));
    }

    fn stop_jump(&mut self, actor: EntityRef) {
        self.commands.push(Command::StopJump(actor.id));
    }

    fn start_duck(&mut self, actor: EntityRef) {
        self.commands.push(Command::StartDuck(actor.id));
    }

    fn stop_duck(&mut self, actor: EntityRef) {
        self.commands.push(Command::StopDuck(actor.id));
    }
}
