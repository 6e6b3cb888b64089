//! Ports - the collaborators the engine talks to.
//!
//! Each trait hides one outside source (wall clock, version control,
//! assistant profile config) so the reconciler stays a pure function and
//! tests can plug in fixed values.

pub mod change_signal;
pub mod clock;
pub mod profile;

pub use self::change_signal::{ChangeSignal, GitStatus, StaticChanges};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::profile::{FixedProfile, ProfileConfig, ProfileSource};
