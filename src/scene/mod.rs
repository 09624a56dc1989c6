/// Parsed SVG visuals.
pub mod element;
/// Off-screen mounting of element clones.
pub mod stage;
