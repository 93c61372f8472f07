//! Marker types parametrizing [`DateTimeOf`](crate::DateTimeOf).

/// Marker of the moment an entity was created.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker of the moment an entity was last modified.
#[derive(Clone, Copy, Debug)]
pub struct Modification;
