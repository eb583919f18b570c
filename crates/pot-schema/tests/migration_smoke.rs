
use diesel::prelude::*;
use pot_schema::migrations::{apply_all, apply_step, MigrationRunner, Rollback, MIGRATIONS};
use pot_schema::rows::{Attribute, DeptUserInfo, NewAttribute, NewDeptUserInfo, NewWeatherInfo, NewWorkDetail, NewWorkspace,
                       WeatherInfo, WorkDetail, Workspace};
use pot_schema::schema::{pot_attribute_ing, pot_dept_user_info, pot_work_detail_ing, weather_info, workspaces};
use pot_schema::sqlite::{list_tables, table_columns};
use pot_schema::PersistenceError;
use test_support::fresh_memory;

#[test]
fn each_step_creates_exactly_its_columns() {
    for step in MIGRATIONS.iter() {
        let mut conn = fresh_memory();
        apply_step(&mut conn, step).expect("apply step on fresh store");

        let cols = table_columns(&mut conn, step.table.name).unwrap();
        let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, step.table.column_names(), "columns of {}", step.table.name);

        for (col, def) in cols.iter().zip(step.table.columns) {
            assert_eq!(col.declared_type.to_uppercase(), def.kind.declared_type(), "{}.{}", step.table.name, col.name);
        }
        // La única tabla creada es la del paso.
        assert_eq!(list_tables(&mut conn).unwrap(), vec![step.table.name.to_string()]);
    }
}

#[test]
fn workspaces_id_is_the_only_primary_key() {
    let mut conn = fresh_memory();
    apply_all(&mut conn).unwrap();
    for step in MIGRATIONS.iter() {
        let pks: Vec<String> = table_columns(&mut conn, step.table.name).unwrap()
                                                                        .into_iter()
                                                                        .filter(|c| c.pk > 0)
                                                                        .map(|c| c.name)
                                                                        .collect();
        if step.table.name == "workspaces" {
            assert_eq!(pks, vec!["id".to_string()]);
        } else {
            assert!(pks.is_empty(), "{} should have no key, got {pks:?}", step.table.name);
        }
    }
}

#[test]
fn applying_all_steps_yields_the_five_tables() {
    let mut conn = fresh_memory();
    apply_all(&mut conn).expect("five steps in order");
    let mut expected: Vec<String> = MIGRATIONS.iter().map(|m| m.table.name.to_string()).collect();
    expected.sort();
    assert_eq!(list_tables(&mut conn).unwrap(), expected);
}

#[test]
fn applying_all_twice_fails_on_first_step() {
    let mut conn = fresh_memory();
    apply_all(&mut conn).unwrap();
    match apply_all(&mut conn) {
        Err(PersistenceError::MigrationFailed { version, .. }) => assert_eq!(version, MIGRATIONS[0].version),
        other => panic!("expected MigrationFailed, got {other:?}"),
    }
}

#[test]
fn keyless_tables_accept_duplicates() {
    let mut conn = fresh_memory();
    apply_all(&mut conn).unwrap();

    let user = NewDeptUserInfo { dept_user_id: Some("d1"),
                                 data_type: Some("A"),
                                 user_nick: Some("nick"),
                                 user_id: Some("u1") };
    let weather = NewWeatherInfo { dict_code: Some("sunny"), dict_sort: Some("1"), ..Default::default() };
    let detail = NewWorkDetail { data_type: Some("A"), pot_work_item_id: Some("w1"), ..Default::default() };
    let attr = NewAttribute { attribute_id: Some("temp"), data_value: Some("21.5"), ..Default::default() };

    for _ in 0..2 {
        diesel::insert_into(pot_dept_user_info::table).values(&user).execute(&mut conn).unwrap();
        diesel::insert_into(weather_info::table).values(&weather).execute(&mut conn).unwrap();
        diesel::insert_into(pot_work_detail_ing::table).values(&detail).execute(&mut conn).unwrap();
        diesel::insert_into(pot_attribute_ing::table).values(&attr).execute(&mut conn).unwrap();
    }

    let users: i64 = pot_dept_user_info::table.count().get_result(&mut conn).unwrap();
    let weathers: i64 = weather_info::table.count().get_result(&mut conn).unwrap();
    let details: i64 = pot_work_detail_ing::table.count().get_result(&mut conn).unwrap();
    let attrs: i64 = pot_attribute_ing::table.count().get_result(&mut conn).unwrap();
    assert_eq!((users, weathers, details, attrs), (2, 2, 2, 2));
}

#[test]
fn rows_read_back_through_their_camel_case_columns() {
    let mut conn = fresh_memory();
    apply_all(&mut conn).unwrap();

    diesel::insert_into(workspaces::table).values(NewWorkspace { name: Some("invernadero") }).execute(&mut conn).unwrap();
    diesel::insert_into(pot_dept_user_info::table).values(NewDeptUserInfo { dept_user_id: Some("d1"),
                                                                           user_nick: Some("ana"),
                                                                           ..Default::default() })
                                                  .execute(&mut conn)
                                                  .unwrap();
    diesel::insert_into(weather_info::table).values(NewWeatherInfo { dict_code: Some("rain"),
                                                                     dict_label: Some("Lluvia"),
                                                                     ..Default::default() })
                                            .execute(&mut conn)
                                            .unwrap();
    diesel::insert_into(pot_work_detail_ing::table).values(NewWorkDetail { pot_position_id: Some("p7"),
                                                                           pot_work_detail_id: Some("wd9"),
                                                                           ..Default::default() })
                                                   .execute(&mut conn)
                                                   .unwrap();
    diesel::insert_into(pot_attribute_ing::table).values(NewAttribute { attribute_id: Some("ph"),
                                                                        data_value: Some("6.8"),
                                                                        ..Default::default() })
                                                 .execute(&mut conn)
                                                 .unwrap();

    let ws: Vec<Workspace> = workspaces::table.select(Workspace::as_select()).load(&mut conn).unwrap();
    assert_eq!(ws, vec![Workspace { id: 1, name: Some("invernadero".into()) }]);

    let users: Vec<DeptUserInfo> = pot_dept_user_info::table.select(DeptUserInfo::as_select()).load(&mut conn).unwrap();
    assert_eq!(users,
               vec![DeptUserInfo { dept_user_id: Some("d1".into()), data_type: None, user_nick: Some("ana".into()), user_id: None }]);

    let weather: Vec<WeatherInfo> = weather_info::table.select(WeatherInfo::as_select()).load(&mut conn).unwrap();
    assert_eq!(weather[0].dict_code.as_deref(), Some("rain"));
    assert_eq!(weather[0].dict_label.as_deref(), Some("Lluvia"));
    assert_eq!(weather[0].dict_value, None);

    let details: Vec<WorkDetail> = pot_work_detail_ing::table.select(WorkDetail::as_select()).load(&mut conn).unwrap();
    assert_eq!(details[0].pot_position_id.as_deref(), Some("p7"));
    assert_eq!(details[0].pot_work_detail_id.as_deref(), Some("wd9"));

    let attrs: Vec<Attribute> = pot_attribute_ing::table.select(Attribute::as_select()).load(&mut conn).unwrap();
    assert_eq!((attrs[0].attribute_id.as_deref(), attrs[0].data_value.as_deref()), (Some("ph"), Some("6.8")));
}

#[test]
fn workspace_ids_autoincrement_and_reject_duplicates() {
    let mut conn = fresh_memory();
    apply_all(&mut conn).unwrap();

    diesel::insert_into(workspaces::table).values(NewWorkspace { name: Some("alpha") }).execute(&mut conn).unwrap();
    diesel::insert_into(workspaces::table).values(NewWorkspace { name: Some("beta") }).execute(&mut conn).unwrap();
    let ids: Vec<i32> = workspaces::table.select(workspaces::id).order(workspaces::id.asc()).load(&mut conn).unwrap();
    assert_eq!(ids, vec![1, 2]);

    let dup = diesel::insert_into(workspaces::table).values((workspaces::id.eq(1), workspaces::name.eq(Some("gamma"))))
                                                    .execute(&mut conn)
                                                    .map_err(PersistenceError::from);
    assert!(matches!(dup, Err(PersistenceError::UniqueViolation(_))), "{dup:?}");
}

#[test]
fn down_leaves_schema_unchanged() {
    let mut conn = fresh_memory();
    apply_all(&mut conn).unwrap();
    let before: Vec<_> = MIGRATIONS.iter().map(|m| table_columns(&mut conn, m.table.name).unwrap()).collect();

    for step in MIGRATIONS.iter().rev() {
        assert_eq!(step.down(&mut conn), Rollback::Irreversible);
    }

    let after: Vec<_> = MIGRATIONS.iter().map(|m| table_columns(&mut conn, m.table.name).unwrap()).collect();
    assert_eq!(before, after);
    assert_eq!(list_tables(&mut conn).unwrap().len(), MIGRATIONS.len());
}

#[test]
fn runner_is_idempotent() {
    let mut conn = fresh_memory();
    let runner = MigrationRunner::new();

    let first = runner.run_pending_migrations(&mut conn).unwrap();
    assert_eq!(first, MIGRATIONS.iter().map(|m| m.version).collect::<Vec<_>>());

    let second = runner.run_pending_migrations(&mut conn).unwrap();
    assert!(second.is_empty());

    let applied = runner.applied(&mut conn).unwrap();
    assert_eq!(applied.len(), MIGRATIONS.len());
    assert!(applied.iter().zip(MIGRATIONS.iter()).all(|(a, m)| a.version == m.version && a.name == m.name));
    assert!(runner.pending(&mut conn).unwrap().is_empty());
}

#[test]
fn runner_resumes_after_a_partially_applied_store() {
    let mut conn = fresh_memory();
    let runner = MigrationRunner::new();
    runner.run_pending_migrations(&mut conn).unwrap();

    // Se borra el registro del último paso: el runner intentará re-aplicarlo y
    // el CREATE TABLE fallará porque la tabla sigue ahí.
    diesel::sql_query("DELETE FROM __pot_schema_migrations WHERE version = '20240116101000'").execute(&mut conn)
                                                                                          .unwrap();
    match runner.run_pending_migrations(&mut conn) {
        Err(PersistenceError::MigrationFailed { version, .. }) => assert_eq!(version, "20240116101000"),
        other => panic!("expected MigrationFailed, got {other:?}"),
    }
    // Los pasos anteriores siguen registrados.
    assert_eq!(runner.applied(&mut conn).unwrap().len(), MIGRATIONS.len() - 1);
}

#[test]
fn revert_last_is_irreversible_and_keeps_bookkeeping() {
    let mut conn = fresh_memory();
    let runner = MigrationRunner::new();
    assert!(runner.revert_last(&mut conn).unwrap().is_none());

    runner.run_pending_migrations(&mut conn).unwrap();
    match runner.revert_last(&mut conn) {
        Err(PersistenceError::Irreversible { version }) => assert_eq!(version, "20240116101000"),
        other => panic!("expected Irreversible, got {other:?}"),
    }
    assert_eq!(runner.applied(&mut conn).unwrap().len(), MIGRATIONS.len());
    assert!(list_tables(&mut conn).unwrap().contains(&"pot_attribute_ing".to_string()));
}

#[test]
fn verify_detects_drift() {
    let mut conn = fresh_memory();
    let runner = MigrationRunner::new();
    runner.run_pending_migrations(&mut conn).unwrap();
    runner.verify(&mut conn).expect("fresh schema matches definitions");

    diesel::sql_query("ALTER TABLE weather_info ADD COLUMN extra TEXT").execute(&mut conn).unwrap();
    match runner.verify(&mut conn) {
        Err(PersistenceError::SchemaDrift { table, found, .. }) => {
            assert_eq!(table, "weather_info");
            assert!(found.contains("extra"));
        }
        other => panic!("expected SchemaDrift, got {other:?}"),
    }
}

#[test]
fn verify_detects_missing_table() {
    let mut conn = fresh_memory();
    let runner = MigrationRunner::new();
    runner.run_pending_migrations(&mut conn).unwrap();
    diesel::sql_query("DROP TABLE pot_work_detail_ing").execute(&mut conn).unwrap();
    assert!(matches!(runner.verify(&mut conn),
                     Err(PersistenceError::SchemaDrift { ref table, .. }) if table == "pot_work_detail_ing"));
}
