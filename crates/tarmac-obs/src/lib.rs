//! Observation and action space building, encoding, and decoding.
//!
//! The space shapes for a scenario class are a function of *static*
//! data only — the network's normalizing constants, the feature list,
//! the action bounds, and the controlled-vehicle cap. They are computed
//! once per environment ([`build_spaces`]) and never re-derived from
//! live state, so the shape is identical on every reset no matter how
//! many vehicles happen to be alive.
//!
//! Entity churn is absorbed by padding and masking, not by resizing:
//! [`SlotMap`] pins each controlled vehicle to a fixed observation slot
//! for as long as it lives, [`ObsEncoder`] fills absent slots with the
//! 0.0 sentinel and zeroes their mask bits, and [`ActionDecoder`] drops
//! action slots whose vehicle has left since the action was computed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod slots;
pub mod space;
pub mod spec;

pub use decoder::{ActionDecoder, DecodedActions};
pub use encoder::ObsEncoder;
pub use error::ObsError;
pub use slots::SlotMap;
pub use space::{build_spaces, BoxSpace, SpacePair};
pub use spec::{ActionBounds, Feature, ObsSpec};

/// Value written into observation slots that hold no vehicle.
///
/// Zero is out of band for every feature: a live ego vehicle always has
/// a nonzero mask bit, so consumers distinguish "stationary vehicle"
/// from "empty slot" by the mask, never by the sentinel.
pub const PAD_SENTINEL: f32 = 0.0;
