//! Neighbor selection and position estimation for a mesh of mobile nodes.
//!
//! Every node keeps a [`PeerDirectory`] of the players and fixed anchors it
//! has heard from. A "get current location" pass works in two steps:
//!
//! 1. **Select.** Score every entry with a weighted sum of inverse
//!    distance, battery level and signal strength, then keep the best K
//!    with a partial selection followed by a bounded sort.
//! 2. **Estimate.** Start from a reference point and walk the range
//!    circles of the selected anchors nearest first, intersecting each
//!    with the current possible zone. Anchors whose signal did not rise
//!    enough since the previous reading (the RSSD test) are left out.
//!
//! Both passes are pure and deterministic. Degenerate geometry never
//! fails; it falls back to the best estimate so far.
//!
//! ```
//! use footmesh_locate::{Locator, NeighborRecord, PeerDirectory, PeerToken, Point};
//!
//! let mut directory = PeerDirectory::new();
//! directory.insert(NeighborRecord::anchor(PeerToken(1), Point::new(0.0, 45.0)));
//! directory.insert(NeighborRecord::anchor(PeerToken(2), Point::new(122.0, 45.0)));
//!
//! let estimate = Locator::default().locate_directory(&directory, Point::ORIGIN);
//! assert!(estimate.position.is_finite());
//! ```

mod directory;
mod error;
mod estimate;
mod locator;
mod score;
mod select;

pub use directory::{NeighborRecord, PeerDirectory, PeerKind, PeerToken, FULL_BATTERY, UNKNOWN_DISTANCE};
pub use error::{Error, Result};
pub use estimate::{estimate_from, estimate_location, Estimate, EstimatorConfig, RangeSample};
pub use locator::{Locator, LocatorConfig, DEFAULT_BEST_K};
pub use score::{clamp_distance, score, ScoreWeights, MIN_DISTANCE};
pub use select::{bounded_sort, by_rank, partial_select, rank_top_k, select_best, Ranked, ScoredCandidate};

pub use footmesh_geometry::{Point, DEFAULT_RSSD_THRESHOLD};
