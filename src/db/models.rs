/// One stored row: plain string cells in column order. Formula cells are
/// kept as their formula text.
pub type Row = Vec<String>;
