//! Listwatch core: pure logic of the incremental archive check.
//!
//! Nothing in this crate performs IO; the engine crate feeds it pages and
//! delivers what it renders.
mod checkpoint;
mod date;
mod locale;
mod paginate;
mod period;
mod row;

pub use checkpoint::Checkpoint;
pub use date::{
    Asctime, DateParser, DateStrategy, FooterFormat, LocaleHint, NumericDate, ParseFailure, Rfc2822,
    Rfc3339, TextualDate, Timestamp,
};
pub use locale::{english_month_name, Locale};
pub use paginate::{paginate, Chunk, Pages, SEPARATOR};
pub use period::{enumerate, InputError, Period, Periods};
pub use row::{Formatting, RowFormatter};
