use ts_core::{Direction, EntityKind, EntityRef, TerrainFeature};

/// Simulation collaborator the runtime reads state from and issues
/// commands to. Queries return `None` when the world does not know the
/// referenced entity; the evaluator turns that into a fatal script error.
/// Commands are fire-and-forget and complete immediately.
pub trait World {
    /// Ordered population of the given kind; may be empty.
    fn enumerate(&self, kind: EntityKind) -> Vec<EntityRef>;

    fn position(&self, entity: EntityRef) -> Option<(f64, f64)>;
    fn size(&self, entity: EntityRef) -> Option<(f64, f64)>;
    fn hit_points(&self, entity: EntityRef) -> Option<f64>;
    fn is_moving(&self, entity: EntityRef, direction: Direction) -> Option<bool>;
    fn is_jumping(&self, entity: EntityRef) -> Option<bool>;
    fn is_ducking(&self, entity: EntityRef) -> Option<bool>;
    fn is_dead(&self, entity: EntityRef) -> Option<bool>;
    fn terrain_feature(&self, entity: EntityRef) -> Option<TerrainFeature>;
    fn is_passable(&self, entity: EntityRef) -> Option<bool>;

    /// Tile covering the given pixel, or `None` outside the world.
    fn tile_at(&self, x: f64, y: f64) -> Option<EntityRef>;
    /// Nearest entity seen from `from` in `direction`; `None` is a miss,
    /// not an error.
    fn search(&self, from: EntityRef, direction: Direction) -> Option<EntityRef>;

    fn start_move(&mut self, actor: EntityRef, direction: Direction);
    fn stop_move(&mut self, actor: EntityRef, direction: Direction);
    fn start_jump(&mut self, actor: EntityRef);
    fn stop_jump(&mut self, actor: EntityRef);
    fn start_duck(&mut self, actor: EntityRef);
    fn stop_duck(&mut self, actor: EntityRef);
}
