//! Window planning
//!
//! The upstream API only answers bounded date-range queries, so a run walks
//! backwards from the newest date in fixed-width windows until it reaches
//! the floor. [`WindowPlan`] produces those windows lazily, newest first.
//!
//! # Example
//!
//! ```
//! use nightscout_export::core::plan::WindowPlan;
//! use nightscout_export::domain::{parse_date_bound, DataType};
//!
//! # fn example() -> nightscout_export::domain::Result<()> {
//! let before = parse_date_bound("2020-01-10")?;
//! let after = parse_date_bound("2020-01-01")?;
//! let plan = WindowPlan::new(DataType::Treatments, before, Some(after))?;
//!
//! let windows: Vec<_> = plan.collect();
//! assert_eq!(windows.len(), 1);
//! assert!(windows[0].is_final);
//! # Ok(())
//! # }
//! ```

pub mod window;

pub use window::{Window, WindowPlan};
