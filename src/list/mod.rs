//! The list pipeline: remote → controller → filter → paginate → table.

pub mod controller;
pub mod filter;
pub mod intent;
pub mod paginate;

pub use controller::{
    DEFAULT_PAGE_SIZE, ListController, ListView, LoadOutcome, LoadTicket, RefreshPolicy,
};
pub use filter::{contains_case_insensitive, filter_records};
pub use intent::{Effect, ListIntent, Outcome, dispatch, reduce, run_effect};
pub use paginate::{clamp_page, paginate, total_pages};
