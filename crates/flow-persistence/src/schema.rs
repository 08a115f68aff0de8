//! Esquema Diesel de las tablas de flows. Refleja la migración
//! `create_flow_tables`.

diesel::table! {
    flows (id) {
        id -> BigInt,
        name -> Varchar,
        identifier -> Nullable<Varchar>,
        status -> Varchar,
        service -> Nullable<Varchar>,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    points (id) {
        id -> BigInt,
        flow_id -> BigInt,
        description -> Text,
        expected -> Jsonb,
        service_name -> Nullable<Varchar>,
        #[sql_name = "schema"]
        validation_schema -> Nullable<Jsonb>,
        timeout_ms -> Nullable<BigInt>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    assertions (id) {
        id -> BigInt,
        flow_id -> BigInt,
        actual -> Jsonb,
        service_name -> Nullable<Varchar>,
        processed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(points -> flows (flow_id));
diesel::joinable!(assertions -> flows (flow_id));

diesel::allow_tables_to_appear_in_same_query!(flows, points, assertions,);
