//! Utility functions and helpers

mod time;

pub use time::{
    date_of_timestamp, format_timestamp, next_day, parse_date, start_of_day, Clock, FixedClock, SystemClock,
};
