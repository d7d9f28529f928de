//! Various types shared by the graph, the simulator and the traversals.

/// The vertex id type.
pub type VId = i32;

/// The per-vertex property type (BFS depth).
pub type Prop = i32;

/// The property of a vertex that has not been reached.
pub const UNVISITED: Prop = -1;

#[inline]
pub fn is_unvisited(prop: Prop) -> bool {
    prop == UNVISITED
}
