//! Esquema Diesel (declarado manualmente). Reemplazable con `diesel print-schema`.

diesel::table! {
    process_definitions (id) {
        id -> Uuid,
        title -> Text,
        published -> Bool,
        doc -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    session_states (user_id) {
        user_id -> BigInt,
        is_processing_step -> Bool,
        doc -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    answer_records (user_id, process_id) {
        user_id -> BigInt,
        process_id -> Uuid,
        doc -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    process_definitions,
    session_states,
    answer_records,
);
