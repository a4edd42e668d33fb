//! Team formation: automatic balancing and captain drafts

pub mod balancer;
pub mod draft;

pub use balancer::{with_random_captains, Partition, RatedPlayer, Selection, TeamBalancer};
pub use draft::{BalancedPickOrder, DraftEngine, PickOrder, PickOutcome};
