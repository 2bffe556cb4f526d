pub mod album;
pub mod artist;
pub mod entity;
pub mod field;
pub mod track;

pub use album::Album;
pub use artist::{Artist, Decades, LatLng};
pub use entity::{Entity, EntityKind, Scored, Seed};
pub use field::{FieldCache, FieldValue, Metadata};
pub use track::Track;
