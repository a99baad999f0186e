use std::path::PathBuf;

use ktax::report::Schedule;
use ktax::types::Decimal;

pub enum Action {
    Calculate {
        year: Option<i32>,
        input: PathBuf,
        json: bool,
    },
    Brackets {
        year: Option<i32>,
        schedule: Schedule,
        base: Option<Decimal>,
    },
    Years,
}
