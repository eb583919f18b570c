//! Filas Diesel de las cinco tablas de negocio.
//!
//! Sólo describen la forma persistida; no hay capa de consultas encima.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{pot_attribute_ing, pot_dept_user_info, pot_work_detail_ing, weather_info, workspaces};

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = workspaces)]
pub struct Workspace {
    pub id: i32,
    pub name: Option<String>,
}

/// `id` se omite para que lo asigne el AUTOINCREMENT.
#[derive(Insertable, Debug)]
#[diesel(table_name = workspaces)]
pub struct NewWorkspace<'a> {
    pub name: Option<&'a str>,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = pot_dept_user_info)]
pub struct DeptUserInfo {
    pub dept_user_id: Option<String>,
    pub data_type: Option<String>,
    pub user_nick: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Insertable, Debug, Clone, Default)]
#[diesel(table_name = pot_dept_user_info)]
pub struct NewDeptUserInfo<'a> {
    pub dept_user_id: Option<&'a str>,
    pub data_type: Option<&'a str>,
    pub user_nick: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = weather_info)]
pub struct WeatherInfo {
    pub dict_code: Option<String>,
    pub data_type: Option<String>,
    pub dict_value: Option<String>,
    pub dict_label: Option<String>,
    pub dict_sort: Option<String>,
}

#[derive(Insertable, Debug, Clone, Default)]
#[diesel(table_name = weather_info)]
pub struct NewWeatherInfo<'a> {
    pub dict_code: Option<&'a str>,
    pub data_type: Option<&'a str>,
    pub dict_value: Option<&'a str>,
    pub dict_label: Option<&'a str>,
    pub dict_sort: Option<&'a str>,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = pot_work_detail_ing)]
pub struct WorkDetail {
    pub data_type: Option<String>,
    pub pot_work_item_id: Option<String>,
    pub pot_position_id: Option<String>,
    pub pot_work_detail_id: Option<String>,
}

#[derive(Insertable, Debug, Clone, Default)]
#[diesel(table_name = pot_work_detail_ing)]
pub struct NewWorkDetail<'a> {
    pub data_type: Option<&'a str>,
    pub pot_work_item_id: Option<&'a str>,
    pub pot_position_id: Option<&'a str>,
    pub pot_work_detail_id: Option<&'a str>,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = pot_attribute_ing)]
pub struct Attribute {
    pub data_type: Option<String>,
    pub pot_work_item_id: Option<String>,
    pub pot_position_id: Option<String>,
    pub attribute_id: Option<String>,
    pub data_value: Option<String>,
}

#[derive(Insertable, Debug, Clone, Default)]
#[diesel(table_name = pot_attribute_ing)]
pub struct NewAttribute<'a> {
    pub data_type: Option<&'a str>,
    pub pot_work_item_id: Option<&'a str>,
    pub pot_position_id: Option<&'a str>,
    pub attribute_id: Option<&'a str>,
    pub data_value: Option<&'a str>,
}
