//! Learning paths with a quiz mini-game at the end of every unit.
//!
//! [`path`] holds the static curriculum and works out which units a learner
//! may open, [`quiz`] runs the intercept game that scores a unit, [`xp`]
//! turns scores into XP and [`learner`] ties a learner's progress to a
//! [`store::RecordStore`].

pub mod config;
pub mod learner;
pub mod path;
pub mod quiz;
pub mod store;
pub mod unit;
pub mod xp;
