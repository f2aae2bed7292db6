// ============================================================================
// COMPONENTS: editing state that sits above the raster core
// ============================================================================
//
//   history.rs: snapshot undo/redo stack
//   tools.rs  : tool identifiers, style properties and the dispatch engine
// ============================================================================

pub mod history;
pub mod tools;
