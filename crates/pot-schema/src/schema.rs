//! Esquema Diesel (escrito a mano, equivalente a `diesel print-schema`).
//!
//! Las tablas sin clave declarada usan el `rowid` implícito de SQLite como
//! clave Diesel; no existe como columna en `pragma_table_info`.

diesel::table! {
    workspaces (id) {
        id -> Integer,
        name -> Nullable<Text>,
    }
}

diesel::table! {
    pot_dept_user_info (rowid) {
        rowid -> Integer,
        #[sql_name = "deptUserId"]
        dept_user_id -> Nullable<Text>,
        #[sql_name = "dataType"]
        data_type -> Nullable<Text>,
        #[sql_name = "userNick"]
        user_nick -> Nullable<Text>,
        #[sql_name = "userId"]
        user_id -> Nullable<Text>,
    }
}

diesel::table! {
    weather_info (rowid) {
        rowid -> Integer,
        #[sql_name = "dictCode"]
        dict_code -> Nullable<Text>,
        #[sql_name = "dataType"]
        data_type -> Nullable<Text>,
        #[sql_name = "dictValue"]
        dict_value -> Nullable<Text>,
        #[sql_name = "dictLabel"]
        dict_label -> Nullable<Text>,
        #[sql_name = "dictSort"]
        dict_sort -> Nullable<Text>,
    }
}

diesel::table! {
    pot_work_detail_ing (rowid) {
        rowid -> Integer,
        #[sql_name = "dataType"]
        data_type -> Nullable<Text>,
        #[sql_name = "potWorkItemId"]
        pot_work_item_id -> Nullable<Text>,
        #[sql_name = "potPositionId"]
        pot_position_id -> Nullable<Text>,
        #[sql_name = "potWorkDetailId"]
        pot_work_detail_id -> Nullable<Text>,
    }
}

diesel::table! {
    pot_attribute_ing (rowid) {
        rowid -> Integer,
        #[sql_name = "dataType"]
        data_type -> Nullable<Text>,
        #[sql_name = "potWorkItemId"]
        pot_work_item_id -> Nullable<Text>,
        #[sql_name = "potPositionId"]
        pot_position_id -> Nullable<Text>,
        #[sql_name = "attributeId"]
        attribute_id -> Nullable<Text>,
        #[sql_name = "dataValue"]
        data_value -> Nullable<Text>,
    }
}

diesel::table! {
    __pot_schema_migrations (version) {
        version -> Text,
        name -> Text,
        applied_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    workspaces,
    pot_dept_user_info,
    weather_info,
    pot_work_detail_ing,
    pot_attribute_ing,
    __pot_schema_migrations,
);
