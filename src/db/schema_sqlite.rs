// SQLite schema definitions for the tabular store.
// `sheet_rows.id` is autoincrement, so ordering by id is append order.

diesel::table! {
    sheets (name) {
        name -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    sheet_rows (id) {
        id -> Integer,
        sheet -> Text,
        cells -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(sheets, sheet_rows);
