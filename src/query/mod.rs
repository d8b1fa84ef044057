//! Query translation core: parameters in, predicate out.

mod duration;
mod filter;
mod query_item;
mod window;

pub use duration::{DurationParseError, HumanDuration};
pub use filter::{CompiledFilter, Condition, Filter, FilterBuilder, QueryParams};
pub use query_item::QueryItem;
pub use window::{resolve_window, TimeWindow, LAST_MODIFIED_FIELD};
